//! Revalidation dispatch for headless CMS front ends.
//!
//! Content-lifecycle events are mapped to the public paths they affect,
//! deduplicated, and sent to the front end's on-demand revalidation
//! endpoint. Every attempt is kept in a bounded audit log.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod revalidation;
pub(crate) mod util;
