//! Dispatch engine: cooldown gate, outbound request and audit record for
//! each path.

use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::application::error::{RevalidateError, error_chain};
use crate::application::repos::AuditStore;
use crate::domain::paths::RevalidationPath;
use crate::infra::error::InfraError;
use crate::util::lock::{rw_read, rw_write};

use super::audit::AuditLog;
use super::config::{EndpointConfig, RevalidationConfig};
use super::dedup::{CooldownDecision, Deduplicator};
use super::dispatcher::Dispatcher;
use super::report::{DispatchReport, PathOutcome, SkipReason};
use super::resolver::unique_paths;

const SOURCE: &str = "revalidation::engine";

/// Whether the cooldown window applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Triggered by a content event; subject to cooldown.
    Automatic,
    /// Requested by an operator; skips the cooldown check but still stamps it.
    Forced,
}

pub struct RevalidationEngine {
    config: RevalidationConfig,
    endpoint: RwLock<EndpointConfig>,
    dedup: Deduplicator,
    dispatcher: Dispatcher,
    audit: AuditLog,
}

impl RevalidationEngine {
    pub fn new(
        config: RevalidationConfig,
        endpoint: EndpointConfig,
        store: Arc<dyn AuditStore>,
    ) -> Result<Self, InfraError> {
        let dispatcher = Dispatcher::new(config.request_timeout)?;
        Ok(Self {
            dedup: Deduplicator::from_config(&config),
            dispatcher,
            audit: AuditLog::new(store),
            endpoint: RwLock::new(endpoint),
            config,
        })
    }

    pub fn config(&self) -> &RevalidationConfig {
        &self.config
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Snapshot of the current endpoint settings.
    pub fn endpoint(&self) -> EndpointConfig {
        rw_read(&self.endpoint, SOURCE, "endpoint").clone()
    }

    pub fn is_configured(&self) -> bool {
        rw_read(&self.endpoint, SOURCE, "is_configured").is_complete()
    }

    /// Apply changed endpoint settings, honoring the masked-token rule.
    pub fn update_endpoint(&self, incoming: EndpointConfig) {
        let mut endpoint = rw_write(&self.endpoint, SOURCE, "update_endpoint");
        endpoint.merge_update(incoming);
        info!(
            endpoint_url = endpoint.endpoint_url.as_str(),
            configured = endpoint.is_complete(),
            "Revalidation endpoint updated"
        );
    }

    pub fn normalize(&self, raw: &str) -> RevalidationPath {
        RevalidationPath::normalize(raw, &self.config.site_base_url)
    }

    /// Call at the end of each host request.
    pub fn reset_request_scope(&self) {
        self.dedup.reset_request_scope();
    }

    /// Forget all dedup state.
    pub fn reset(&self) {
        self.dedup.reset();
    }

    pub async fn revalidate_path(&self, path: &RevalidationPath, mode: DispatchMode) -> PathOutcome {
        let endpoint = self.endpoint();
        if !endpoint.is_complete() {
            return PathOutcome::Skipped(SkipReason::ConfigurationMissing);
        }

        if let CooldownDecision::Active { remaining } =
            self.dedup.acquire(path, mode == DispatchMode::Forced)
        {
            debug!(
                path = %path,
                remaining_ms = remaining.as_millis() as u64,
                "Cooldown active, skipping dispatch"
            );
            return PathOutcome::Skipped(SkipReason::CooldownActive);
        }

        let attempt = self.dispatcher.dispatch(path, &endpoint).await;
        if let Err(err) = self.audit.record(attempt.clone()).await {
            warn!(path = %path, error = %error_chain(&err), "Failed to record dispatch attempt");
        }
        PathOutcome::Dispatched(attempt)
    }

    /// Dispatch each path in order, one request at a time.
    pub async fn revalidate_paths(
        &self,
        paths: &[RevalidationPath],
        mode: DispatchMode,
        report: &mut DispatchReport,
    ) {
        for path in paths {
            let outcome = self.revalidate_path(path, mode).await;
            report.push(path.clone(), outcome);
        }
    }

    /// Operator-requested dispatch of explicit paths, bypassing cooldown.
    pub async fn force_paths(
        &self,
        paths: Vec<RevalidationPath>,
    ) -> Result<DispatchReport, RevalidateError> {
        if !self.is_configured() {
            return Err(RevalidateError::ConfigurationMissing);
        }

        let mut report = DispatchReport {
            paths: unique_paths(paths),
            ..DispatchReport::default()
        };
        let paths = report.paths.clone();
        self.revalidate_paths(&paths, DispatchMode::Forced, &mut report)
            .await;
        info!(report = %report, "Forced revalidation finished");
        Ok(report)
    }
}
