//! Infrastructure adapters and runtime bootstrap.

pub mod audit_store;
pub mod content_index;
pub mod error;
pub mod telemetry;
