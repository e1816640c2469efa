//! Affected-path resolution.
//!
//! Maps a changed entity to every public page whose rendering depends on it.

use std::collections::HashSet;
use std::sync::Arc;

use crate::application::repos::{ContentIndex, IndexError};
use crate::domain::entities::{EntityId, EntityRef, EntitySnapshot, TermRef};
use crate::domain::paths::RevalidationPath;

#[derive(Clone)]
pub struct PathResolver {
    index: Arc<dyn ContentIndex>,
    base_url: String,
}

impl PathResolver {
    pub fn new(index: Arc<dyn ContentIndex>, base_url: impl Into<String>) -> Self {
        Self {
            index,
            base_url: base_url.into(),
        }
    }

    pub fn index(&self) -> &Arc<dyn ContentIndex> {
        &self.index
    }

    pub fn normalize(&self, raw: &str) -> RevalidationPath {
        RevalidationPath::normalize(raw, &self.base_url)
    }

    /// The item's own page followed by the archive of every attached term.
    ///
    /// Empty when the index no longer knows the item.
    pub async fn content_paths(&self, id: EntityId) -> Result<Vec<RevalidationPath>, IndexError> {
        let mut paths = Vec::new();
        if let Some(url) = self.index.permalink(id).await? {
            paths.push(self.normalize(&url));
        }
        for term in self.index.terms_for_content(id).await? {
            if let Some(url) = self.index.term_archive(term).await? {
                paths.push(self.normalize(&url));
            }
        }
        Ok(unique_paths(paths))
    }

    /// The term's archive followed by each published item carrying it.
    pub async fn term_paths(&self, term: TermRef) -> Result<Vec<RevalidationPath>, IndexError> {
        let mut paths = Vec::new();
        if let Some(url) = self.index.term_archive(term).await? {
            paths.push(self.normalize(&url));
        }
        for id in self.index.published_content_for_term(term).await? {
            if let Some(url) = self.index.permalink(id).await? {
                paths.push(self.normalize(&url));
            }
        }
        Ok(unique_paths(paths))
    }

    pub async fn entity_paths(&self, entity: EntityRef) -> Result<Vec<RevalidationPath>, IndexError> {
        match entity.as_term() {
            Some(term) => self.term_paths(term).await,
            None => self.content_paths(entity.id).await,
        }
    }

    /// Capture what an entity currently maps to.
    ///
    /// Hosts call this before a deletion is committed and pass the result
    /// along with the delete event.
    pub async fn snapshot(&self, entity: EntityRef) -> Result<EntitySnapshot, IndexError> {
        let content_kind = match entity.as_term() {
            Some(_) => None,
            None => self
                .index
                .content_meta(entity.id)
                .await?
                .map(|meta| meta.content_kind),
        };
        Ok(EntitySnapshot {
            content_kind,
            paths: self.entity_paths(entity).await?,
        })
    }
}

/// Drop repeated paths, keeping first-seen order.
pub fn unique_paths(paths: impl IntoIterator<Item = RevalidationPath>) -> Vec<RevalidationPath> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| seen.insert(path.clone()))
        .collect()
}
