//! Port traits describing the CMS index and audit persistence adapters.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::entities::{ContentMeta, EntityId, TermRef};

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("content index lookup failed: {0}")]
    Lookup(String),
}

impl IndexError {
    pub fn lookup(err: impl std::fmt::Display) -> Self {
        Self::Lookup(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("audit store io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit store holds a corrupted value: {0}")]
    Corrupted(String),
    #[error("audit store encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Read-only lookups against the CMS content and taxonomy index.
///
/// Implementations answer from the CMS's current state; absent entities are
/// reported as `None` or an empty list rather than an error.
#[async_trait]
pub trait ContentIndex: Send + Sync {
    async fn content_meta(&self, id: EntityId) -> Result<Option<ContentMeta>, IndexError>;

    /// Absolute permalink URL of a content item.
    async fn permalink(&self, id: EntityId) -> Result<Option<String>, IndexError>;

    async fn terms_for_content(&self, id: EntityId) -> Result<Vec<TermRef>, IndexError>;

    async fn published_content_for_term(&self, term: TermRef)
    -> Result<Vec<EntityId>, IndexError>;

    /// Absolute archive URL of a category or tag.
    async fn term_archive(&self, term: TermRef) -> Result<Option<String>, IndexError>;
}

/// Option-style storage for the audit log: one JSON value under one key.
///
/// The store makes no claim about the value's shape; callers validate it.
#[async_trait]
pub trait AuditStore: Send + Sync {
    async fn load(&self) -> Result<Option<Value>, StoreError>;

    async fn save(&self, value: Value) -> Result<(), StoreError>;

    async fn remove(&self) -> Result<(), StoreError>;
}
