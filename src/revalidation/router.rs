//! Content-event routing.
//!
//! Decides whether a CMS event warrants revalidation, resolves the affected
//! paths and hands them to the engine. Automatic handlers never return
//! errors; everything they drop is visible in the returned report and logs.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::error::RevalidateError;
use crate::application::repos::{ContentIndex, IndexError};
use crate::domain::entities::{
    ChangeEvent, ContentMeta, EntityId, EntityRef, EntitySnapshot, TermRef,
};
use crate::domain::paths::RevalidationPath;
use crate::domain::types::{ContentStatus, EventKind};

use super::engine::{DispatchMode, RevalidationEngine};
use super::report::{DispatchReport, SkipReason};
use super::resolver::{PathResolver, unique_paths};

pub struct EventRouter {
    engine: Arc<RevalidationEngine>,
    resolver: PathResolver,
}

impl EventRouter {
    pub fn new(engine: Arc<RevalidationEngine>, index: Arc<dyn ContentIndex>) -> Self {
        let resolver = PathResolver::new(index, engine.config().site_base_url.clone());
        Self { engine, resolver }
    }

    pub fn engine(&self) -> &Arc<RevalidationEngine> {
        &self.engine
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Content was created or updated.
    pub async fn content_saved(&self, id: impl Into<EntityId>) -> DispatchReport {
        self.handle(&ChangeEvent::content_updated(id)).await
    }

    pub async fn content_status_changed(
        &self,
        id: impl Into<EntityId>,
        old_status: impl Into<ContentStatus>,
        new_status: impl Into<ContentStatus>,
    ) -> DispatchReport {
        self.handle(&ChangeEvent::status_changed(id, old_status, new_status))
            .await
    }

    /// Content is being deleted. Pass the snapshot captured before the
    /// deletion when the index will no longer know the item.
    pub async fn content_deleted(
        &self,
        id: impl Into<EntityId>,
        snapshot: Option<EntitySnapshot>,
    ) -> DispatchReport {
        let event = ChangeEvent::content_deleted(id);
        let event = match snapshot {
            Some(snapshot) => event.with_snapshot(snapshot),
            None => event,
        };
        self.handle(&event).await
    }

    pub async fn term_changed(
        &self,
        term: TermRef,
        event_kind: EventKind,
        snapshot: Option<EntitySnapshot>,
    ) -> DispatchReport {
        let event = ChangeEvent::term(term, event_kind);
        let event = match snapshot {
            Some(snapshot) => event.with_snapshot(snapshot),
            None => event,
        };
        self.handle(&event).await
    }

    #[instrument(
        skip(self, event),
        fields(event_id = %event.id, entity = %event.entity(), event_kind = event.event_kind.as_str())
    )]
    pub async fn handle(&self, event: &ChangeEvent) -> DispatchReport {
        let report = DispatchReport::for_event(event);

        if let Err(err) = event.validate() {
            warn!(error = %err, "Dropping malformed content event");
            return report.ignore(SkipReason::InvalidEvent);
        }
        if !self.engine.is_configured() {
            debug!("Revalidation endpoint not configured, ignoring event");
            return report.ignore(SkipReason::ConfigurationMissing);
        }

        let report = match (event.entity().as_term(), event.event_kind) {
            (Some(term), _) => self.route_term(event, term, report).await,
            (None, EventKind::Created | EventKind::Updated) => {
                self.route_saved(event, report).await
            }
            (None, EventKind::StatusChanged) => self.route_status_change(event, report).await,
            (None, EventKind::Deleted) => self.route_deleted(event, report).await,
        };

        match report.ignored {
            Some(reason) => debug!(reason = reason.as_str(), "Content event ignored"),
            None => info!(report = %report, "Content event handled"),
        }
        report
    }

    /// Operator-requested revalidation of one entity, bypassing cooldown.
    pub async fn revalidate_entity(
        &self,
        entity: EntityRef,
    ) -> Result<DispatchReport, RevalidateError> {
        if !self.engine.is_configured() {
            return Err(RevalidateError::ConfigurationMissing);
        }

        let paths = self.resolver.entity_paths(entity).await?;
        if paths.is_empty() {
            return Err(RevalidateError::EntityNotFound(entity));
        }

        let mut report = DispatchReport::for_entity(entity);
        self.dispatch(paths, DispatchMode::Forced, &mut report).await;
        info!(entity = %entity, report = %report, "Forced entity revalidation finished");
        Ok(report)
    }

    async fn route_saved(&self, event: &ChangeEvent, mut report: DispatchReport) -> DispatchReport {
        let entity = event.entity();
        let meta = match self.content_meta(entity.id).await {
            Ok(Some(meta)) => meta,
            Ok(None) => return report.ignore(SkipReason::UnknownEntity),
            Err(reason) => return report.ignore(reason),
        };

        if !self.engine.config().is_dispatchable(&meta.content_kind) {
            return report.ignore(SkipReason::NotDispatchable);
        }
        if !meta.status.is_published() {
            return report.ignore(SkipReason::NotPublished);
        }
        if !self.engine.dedup().first_in_request(entity) {
            return report.ignore(SkipReason::DuplicateInRequest);
        }

        let paths = match self.paths_for(event).await {
            Ok(paths) => paths,
            Err(reason) => return report.ignore(reason),
        };
        self.dispatch(paths, DispatchMode::Automatic, &mut report)
            .await;
        report
    }

    async fn route_status_change(
        &self,
        event: &ChangeEvent,
        mut report: DispatchReport,
    ) -> DispatchReport {
        let crosses = match (&event.old_status, &event.new_status) {
            (Some(old), Some(new)) => old.crosses_published_boundary(new),
            _ => false,
        };
        if !crosses {
            return report.ignore(SkipReason::NoPublishBoundary);
        }

        let entity = event.entity();
        let kind = match self.known_kind(event).await {
            Ok(kind) => kind,
            Err(reason) => return report.ignore(reason),
        };
        if let Some(kind) = kind
            && !self.engine.config().is_dispatchable(&kind)
        {
            return report.ignore(SkipReason::NotDispatchable);
        }
        if !self.engine.dedup().first_in_request(entity) {
            return report.ignore(SkipReason::DuplicateInRequest);
        }

        let paths = match self.paths_for(event).await {
            Ok(paths) => paths,
            Err(reason) => return report.ignore(reason),
        };
        self.dispatch(paths, DispatchMode::Automatic, &mut report)
            .await;
        report
    }

    async fn route_deleted(&self, event: &ChangeEvent, mut report: DispatchReport) -> DispatchReport {
        let kind = match self.known_kind(event).await {
            Ok(kind) => kind,
            Err(reason) => return report.ignore(reason),
        };
        if let Some(kind) = kind
            && !self.engine.config().is_dispatchable(&kind)
        {
            return report.ignore(SkipReason::NotDispatchable);
        }

        let paths = match self.paths_for(event).await {
            Ok(paths) => paths,
            Err(reason) => return report.ignore(reason),
        };
        self.dispatch(paths, DispatchMode::Automatic, &mut report)
            .await;
        report
    }

    async fn route_term(
        &self,
        event: &ChangeEvent,
        term: TermRef,
        mut report: DispatchReport,
    ) -> DispatchReport {
        let paths = match &event.snapshot {
            Some(snapshot) => snapshot.paths.clone(),
            None => match self.resolver.term_paths(term).await {
                Ok(paths) => paths,
                Err(err) => return report.ignore(lookup_failed(&err)),
            },
        };
        self.dispatch(paths, DispatchMode::Automatic, &mut report)
            .await;
        report
    }

    async fn dispatch(
        &self,
        paths: Vec<RevalidationPath>,
        mode: DispatchMode,
        report: &mut DispatchReport,
    ) {
        report.paths = unique_paths(paths);
        let paths = report.paths.clone();
        self.engine.revalidate_paths(&paths, mode, report).await;
    }

    /// Snapshot paths when the event carries them, else the index's view.
    async fn paths_for(&self, event: &ChangeEvent) -> Result<Vec<RevalidationPath>, SkipReason> {
        match &event.snapshot {
            Some(snapshot) => Ok(snapshot.paths.clone()),
            None => self
                .resolver
                .content_paths(event.entity_id)
                .await
                .map_err(|err| lookup_failed(&err)),
        }
    }

    /// Content kind from the snapshot, falling back to the index.
    async fn known_kind(&self, event: &ChangeEvent) -> Result<Option<String>, SkipReason> {
        if let Some(kind) = event
            .snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.content_kind.clone())
        {
            return Ok(Some(kind));
        }
        Ok(self
            .content_meta(event.entity_id)
            .await?
            .map(|meta| meta.content_kind))
    }

    async fn content_meta(&self, id: EntityId) -> Result<Option<ContentMeta>, SkipReason> {
        self.resolver
            .index()
            .content_meta(id)
            .await
            .map_err(|err| lookup_failed(&err))
    }
}

fn lookup_failed(err: &IndexError) -> SkipReason {
    warn!(error = %err, "Content index lookup failed");
    SkipReason::ResolutionFailed
}
