//! In-memory [`ContentIndex`] fed by the host as content changes.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::application::repos::{ContentIndex, IndexError};
use crate::domain::entities::{ContentMeta, EntityId, TermRef};
use crate::domain::types::ContentStatus;
use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "infra::content_index";

/// What the index knows about one content item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub content_kind: String,
    pub status: ContentStatus,
    /// Absolute permalink URL.
    pub permalink: String,
    pub terms: Vec<TermRef>,
}

impl ContentRecord {
    pub fn new(
        content_kind: impl Into<String>,
        status: impl Into<ContentStatus>,
        permalink: impl Into<String>,
    ) -> Self {
        Self {
            content_kind: content_kind.into(),
            status: status.into(),
            permalink: permalink.into(),
            terms: Vec::new(),
        }
    }

    pub fn with_terms(mut self, terms: impl IntoIterator<Item = TermRef>) -> Self {
        self.terms = terms.into_iter().collect();
        self
    }
}

#[derive(Debug, Default)]
struct IndexState {
    contents: HashMap<EntityId, ContentRecord>,
    term_archives: HashMap<TermRef, String>,
}

#[derive(Debug, Default)]
pub struct InMemoryContentIndex {
    state: RwLock<IndexState>,
}

impl InMemoryContentIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_content(&self, id: EntityId, record: ContentRecord) {
        rw_write(&self.state, SOURCE, "upsert_content")
            .contents
            .insert(id, record);
    }

    /// Returns `false` when the item is unknown.
    pub fn set_status(&self, id: EntityId, status: impl Into<ContentStatus>) -> bool {
        match rw_write(&self.state, SOURCE, "set_status").contents.get_mut(&id) {
            Some(record) => {
                record.status = status.into();
                true
            }
            None => false,
        }
    }

    pub fn remove_content(&self, id: EntityId) -> Option<ContentRecord> {
        rw_write(&self.state, SOURCE, "remove_content")
            .contents
            .remove(&id)
    }

    pub fn upsert_term(&self, term: TermRef, archive_url: impl Into<String>) {
        rw_write(&self.state, SOURCE, "upsert_term")
            .term_archives
            .insert(term, archive_url.into());
    }

    /// Forget a term and detach it from every item.
    pub fn remove_term(&self, term: TermRef) -> Option<String> {
        let mut state = rw_write(&self.state, SOURCE, "remove_term");
        for record in state.contents.values_mut() {
            record.terms.retain(|attached| *attached != term);
        }
        state.term_archives.remove(&term)
    }
}

#[async_trait]
impl ContentIndex for InMemoryContentIndex {
    async fn content_meta(&self, id: EntityId) -> Result<Option<ContentMeta>, IndexError> {
        Ok(rw_read(&self.state, SOURCE, "content_meta")
            .contents
            .get(&id)
            .map(|record| ContentMeta {
                content_kind: record.content_kind.clone(),
                status: record.status.clone(),
            }))
    }

    async fn permalink(&self, id: EntityId) -> Result<Option<String>, IndexError> {
        Ok(rw_read(&self.state, SOURCE, "permalink")
            .contents
            .get(&id)
            .map(|record| record.permalink.clone()))
    }

    async fn terms_for_content(&self, id: EntityId) -> Result<Vec<TermRef>, IndexError> {
        Ok(rw_read(&self.state, SOURCE, "terms_for_content")
            .contents
            .get(&id)
            .map(|record| record.terms.clone())
            .unwrap_or_default())
    }

    async fn published_content_for_term(
        &self,
        term: TermRef,
    ) -> Result<Vec<EntityId>, IndexError> {
        let state = rw_read(&self.state, SOURCE, "published_content_for_term");
        let mut ids: Vec<EntityId> = state
            .contents
            .iter()
            .filter(|(_, record)| record.status.is_published() && record.terms.contains(&term))
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn term_archive(&self, term: TermRef) -> Result<Option<String>, IndexError> {
        Ok(rw_read(&self.state, SOURCE, "term_archive")
            .term_archives
            .get(&term)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_updates_are_visible() {
        let index = InMemoryContentIndex::new();
        index.upsert_content(
            EntityId(1),
            ContentRecord::new("post", "draft", "https://example.com/?p=1"),
        );

        assert!(index.set_status(EntityId(1), "publish"));
        assert!(!index.set_status(EntityId(2), "publish"));

        let meta = index
            .content_meta(EntityId(1))
            .await
            .expect("lookup")
            .expect("known");
        assert!(meta.status.is_published());
    }

    #[tokio::test]
    async fn removing_a_term_detaches_it() {
        let index = InMemoryContentIndex::new();
        let tag = TermRef::tag(5);
        index.upsert_term(tag, "https://example.com/tag/x/");
        index.upsert_content(
            EntityId(1),
            ContentRecord::new("post", "publish", "https://example.com/x/").with_terms([tag]),
        );

        assert!(index.remove_term(tag).is_some());
        assert!(index.terms_for_content(EntityId(1)).await.expect("lookup").is_empty());
        assert!(index.term_archive(tag).await.expect("lookup").is_none());
    }

    #[tokio::test]
    async fn published_items_for_term_are_sorted() {
        let index = InMemoryContentIndex::new();
        let cat = TermRef::category(9);
        for id in [7_u64, 3, 5] {
            index.upsert_content(
                EntityId(id),
                ContentRecord::new("post", "publish", format!("https://example.com/{id}/"))
                    .with_terms([cat]),
            );
        }
        index.upsert_content(
            EntityId(4),
            ContentRecord::new("post", "private", "https://example.com/4/").with_terms([cat]),
        );

        let ids = index.published_content_for_term(cat).await.expect("lookup");
        assert_eq!(ids, vec![EntityId(3), EntityId(5), EntityId(7)]);
    }
}
