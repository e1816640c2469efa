//! Application layer: ports and operator-facing errors.

pub mod error;
pub mod repos;
