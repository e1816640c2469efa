//! Domain entities exchanged with the CMS integration layer.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::{
    error::DomainError,
    paths::RevalidationPath,
    types::{ContentStatus, EntityKind, EventKind, TermKind},
};

/// Numeric identifier assigned by the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Identity of a content item or taxonomy term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

impl EntityRef {
    pub fn content(id: impl Into<EntityId>) -> Self {
        Self {
            kind: EntityKind::Content,
            id: id.into(),
        }
    }

    pub fn term(term: TermRef) -> Self {
        Self {
            kind: term.kind.into(),
            id: term.id,
        }
    }

    pub fn as_term(&self) -> Option<TermRef> {
        self.kind.term_kind().map(|kind| TermRef { kind, id: self.id })
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// A category or tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRef {
    pub kind: TermKind,
    pub id: EntityId,
}

impl TermRef {
    pub fn category(id: impl Into<EntityId>) -> Self {
        Self {
            kind: TermKind::Category,
            id: id.into(),
        }
    }

    pub fn tag(id: impl Into<EntityId>) -> Self {
        Self {
            kind: TermKind::Tag,
            id: id.into(),
        }
    }
}

/// Current type and status of a content item, as reported by the CMS index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentMeta {
    /// CMS content type, e.g. `post` or `page`.
    pub content_kind: String,
    pub status: ContentStatus,
}

/// Paths captured for an entity while it still existed.
///
/// Deletions are reported after the CMS has forgotten the entity's permalink
/// and taxonomy links, so hosts capture this beforehand and attach it to the
/// event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub content_kind: Option<String>,
    pub paths: Vec<RevalidationPath>,
}

/// A content-lifecycle notification from the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Correlation identifier for logs.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub entity_kind: EntityKind,
    pub entity_id: EntityId,
    pub event_kind: EventKind,
    #[serde(default)]
    pub old_status: Option<ContentStatus>,
    #[serde(default)]
    pub new_status: Option<ContentStatus>,
    #[serde(default)]
    pub snapshot: Option<EntitySnapshot>,
    #[serde(default = "OffsetDateTime::now_utc", with = "time::serde::rfc3339")]
    pub occurred_at: OffsetDateTime,
}

impl ChangeEvent {
    pub fn new(entity: EntityRef, event_kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            entity_kind: entity.kind,
            entity_id: entity.id,
            event_kind,
            old_status: None,
            new_status: None,
            snapshot: None,
            occurred_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn content_created(id: impl Into<EntityId>) -> Self {
        Self::new(EntityRef::content(id), EventKind::Created)
    }

    pub fn content_updated(id: impl Into<EntityId>) -> Self {
        Self::new(EntityRef::content(id), EventKind::Updated)
    }

    pub fn content_deleted(id: impl Into<EntityId>) -> Self {
        Self::new(EntityRef::content(id), EventKind::Deleted)
    }

    pub fn status_changed(
        id: impl Into<EntityId>,
        old_status: impl Into<ContentStatus>,
        new_status: impl Into<ContentStatus>,
    ) -> Self {
        Self {
            old_status: Some(old_status.into()),
            new_status: Some(new_status.into()),
            ..Self::new(EntityRef::content(id), EventKind::StatusChanged)
        }
    }

    pub fn term(term: TermRef, event_kind: EventKind) -> Self {
        Self::new(EntityRef::term(term), event_kind)
    }

    pub fn with_snapshot(mut self, snapshot: EntitySnapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    pub fn entity(&self) -> EntityRef {
        EntityRef {
            kind: self.entity_kind,
            id: self.entity_id,
        }
    }

    /// Reject events whose shape cannot be routed.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.event_kind != EventKind::StatusChanged {
            return Ok(());
        }
        if self.entity_kind != EntityKind::Content {
            return Err(DomainError::invariant(format!(
                "status transitions only apply to content, got {}",
                self.entity_kind
            )));
        }
        if self.old_status.is_none() || self.new_status.is_none() {
            return Err(DomainError::validation(
                "status transition requires both old and new status",
            ));
        }
        Ok(())
    }
}
