//! On-demand revalidation of a headless front end.
//!
//! Content events from the CMS flow through [`EventRouter`], which resolves
//! the affected public paths and hands them to [`RevalidationEngine`] for
//! cooldown-gated dispatch and auditing.

pub mod audit;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod engine;
pub mod keys;
pub mod report;
pub mod resolver;
pub mod router;

pub use audit::{AUDIT_LOG_CAPACITY, AuditLog};
pub use config::{EndpointConfig, RevalidationConfig};
pub use dedup::{CooldownDecision, Deduplicator};
pub use dispatcher::{DispatchOutcome, Dispatcher, USER_AGENT};
pub use engine::{DispatchMode, RevalidationEngine};
pub use report::{DispatchReport, PathOutcome, SkipReason};
pub use resolver::PathResolver;
pub use router::EventRouter;

pub const METRIC_DISPATCH_TOTAL: &str = "revalidate_dispatch_total";
pub const METRIC_SKIPPED_TOTAL: &str = "revalidate_skipped_total";
pub const METRIC_DISPATCH_MS: &str = "revalidate_dispatch_ms";
pub const METRIC_AUDIT_LOG_LEN: &str = "revalidate_audit_log_len";
