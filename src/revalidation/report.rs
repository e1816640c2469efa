//! Per-event summary of what was dispatched and what was skipped.

use std::fmt;

use metrics::counter;
use revalidate_api_types::DispatchAttempt;
use uuid::Uuid;

use crate::domain::entities::{ChangeEvent, EntityRef};
use crate::domain::paths::RevalidationPath;

use super::METRIC_SKIPPED_TOTAL;

/// Why an event or a single path did not produce a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Endpoint URL or token is empty.
    ConfigurationMissing,
    /// The path was dispatched within the cooldown window.
    CooldownActive,
    /// The entity was already handled in this request.
    DuplicateInRequest,
    /// The content kind is not in the dispatchable list.
    NotDispatchable,
    /// A save of content that is not published.
    NotPublished,
    /// A status change that stays on one side of `publish`.
    NoPublishBoundary,
    /// The content index no longer knows the entity.
    UnknownEntity,
    /// The content index could not be queried.
    ResolutionFailed,
    /// The event is malformed.
    InvalidEvent,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConfigurationMissing => "configuration_missing",
            Self::CooldownActive => "cooldown_active",
            Self::DuplicateInRequest => "duplicate_in_request",
            Self::NotDispatchable => "not_dispatchable",
            Self::NotPublished => "not_published",
            Self::NoPublishBoundary => "no_publish_boundary",
            Self::UnknownEntity => "unknown_entity",
            Self::ResolutionFailed => "resolution_failed",
            Self::InvalidEvent => "invalid_event",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Dispatched(DispatchAttempt),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    pub event_id: Option<Uuid>,
    pub entity: Option<EntityRef>,
    /// Set when the whole event was dropped before any path was considered.
    pub ignored: Option<SkipReason>,
    /// Resolved paths in dispatch order.
    pub paths: Vec<RevalidationPath>,
    pub attempts: Vec<DispatchAttempt>,
    pub skipped: Vec<(RevalidationPath, SkipReason)>,
}

impl DispatchReport {
    pub fn for_event(event: &ChangeEvent) -> Self {
        Self {
            event_id: Some(event.id),
            entity: Some(event.entity()),
            ..Self::default()
        }
    }

    pub fn for_entity(entity: EntityRef) -> Self {
        Self {
            entity: Some(entity),
            ..Self::default()
        }
    }

    /// Mark the whole event as dropped.
    pub fn ignore(mut self, reason: SkipReason) -> Self {
        counter!(METRIC_SKIPPED_TOTAL, "reason" => reason.as_str()).increment(1);
        self.ignored = Some(reason);
        self
    }

    pub fn push(&mut self, path: RevalidationPath, outcome: PathOutcome) {
        match outcome {
            PathOutcome::Dispatched(attempt) => self.attempts.push(attempt),
            PathOutcome::Skipped(reason) => {
                counter!(METRIC_SKIPPED_TOTAL, "reason" => reason.as_str()).increment(1);
                self.skipped.push((path, reason));
            }
        }
    }

    pub fn dispatched(&self) -> usize {
        self.attempts.len()
    }

    pub fn failures(&self) -> usize {
        self.attempts.iter().filter(|attempt| !attempt.is_success()).count()
    }

    /// No request failed. Skips do not count as failures.
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

impl fmt::Display for DispatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ignored {
            Some(reason) => write!(f, "DispatchReport {{ ignored: {reason} }}"),
            None => write!(
                f,
                "DispatchReport {{ paths: {}, dispatched: {}, failed: {}, skipped: {} }}",
                self.paths.len(),
                self.dispatched(),
                self.failures(),
                self.skipped.len(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_summarizes_counts() {
        let mut report = DispatchReport::for_entity(EntityRef::content(1));
        let path = RevalidationPath::normalize("/a/", "");
        report.paths.push(path.clone());
        report.push(path, PathOutcome::Skipped(SkipReason::CooldownActive));

        assert_eq!(
            report.to_string(),
            "DispatchReport { paths: 1, dispatched: 0, failed: 0, skipped: 1 }"
        );
        assert!(report.is_success());
    }

    #[test]
    fn ignored_report_names_reason() {
        let report =
            DispatchReport::for_entity(EntityRef::content(1)).ignore(SkipReason::NotPublished);
        assert_eq!(report.to_string(), "DispatchReport { ignored: not_published }");
    }
}
