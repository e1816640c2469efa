//! Shared domain enumerations mirrored from CMS lifecycle vocabulary.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// The kind of entity a change event refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Content,
    Category,
    Tag,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Content => "content",
            EntityKind::Category => "category",
            EntityKind::Tag => "tag",
        }
    }

    /// Taxonomy kind for term entities, `None` for content.
    pub fn term_kind(self) -> Option<TermKind> {
        match self {
            EntityKind::Content => None,
            EntityKind::Category => Some(TermKind::Category),
            EntityKind::Tag => Some(TermKind::Tag),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "content" | "post" => Ok(EntityKind::Content),
            "category" => Ok(EntityKind::Category),
            "tag" | "post_tag" => Ok(EntityKind::Tag),
            other => Err(DomainError::validation(format!(
                "unknown entity kind `{other}`"
            ))),
        }
    }
}

/// Taxonomy flavour of a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    Category,
    Tag,
}

impl TermKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TermKind::Category => "category",
            TermKind::Tag => "tag",
        }
    }
}

impl From<TermKind> for EntityKind {
    fn from(kind: TermKind) -> Self {
        match kind {
            TermKind::Category => EntityKind::Category,
            TermKind::Tag => EntityKind::Tag,
        }
    }
}

/// Lifecycle transition reported by the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
    StatusChanged,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Updated => "updated",
            EventKind::Deleted => "deleted",
            EventKind::StatusChanged => "status_changed",
        }
    }
}

/// Publication status of a content item.
///
/// Only [`ContentStatus::Published`] is publicly visible; every other state
/// sits on the private side of the published boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentStatus {
    Published,
    Draft,
    Pending,
    Private,
    Trash,
    Scheduled,
    AutoDraft,
    Other(String),
}

impl ContentStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, ContentStatus::Published)
    }

    /// True when moving from `self` to `next` enters or leaves the published state.
    pub fn crosses_published_boundary(&self, next: &ContentStatus) -> bool {
        self.is_published() != next.is_published()
    }

    pub fn as_str(&self) -> &str {
        match self {
            ContentStatus::Published => "publish",
            ContentStatus::Draft => "draft",
            ContentStatus::Pending => "pending",
            ContentStatus::Private => "private",
            ContentStatus::Trash => "trash",
            ContentStatus::Scheduled => "future",
            ContentStatus::AutoDraft => "auto-draft",
            ContentStatus::Other(value) => value.as_str(),
        }
    }
}

impl From<&str> for ContentStatus {
    fn from(value: &str) -> Self {
        match value.trim() {
            "publish" | "published" => ContentStatus::Published,
            "draft" => ContentStatus::Draft,
            "pending" => ContentStatus::Pending,
            "private" => ContentStatus::Private,
            "trash" | "trashed" => ContentStatus::Trash,
            "future" | "scheduled" => ContentStatus::Scheduled,
            "auto-draft" => ContentStatus::AutoDraft,
            other => ContentStatus::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentStatus {
    fn from(value: String) -> Self {
        ContentStatus::from(value.as_str())
    }
}

impl From<ContentStatus> for String {
    fn from(status: ContentStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ContentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
