use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::repos::{IndexError, StoreError},
    domain::entities::EntityRef,
    infra::error::InfraError,
};

/// Errors surfaced to operators for explicitly requested actions.
///
/// Automatic event routing never returns these; it absorbs failures and
/// records them in the audit log instead.
#[derive(Debug, Error)]
pub enum RevalidateError {
    #[error("revalidation endpoint url or auth token is not configured")]
    ConfigurationMissing,
    #[error("entity `{0}` is not known to the content index")]
    EntityNotFound(EntityRef),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Revalidate(#[from] RevalidateError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}

/// Render an error and its full source chain as one line.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut messages = vec![error.to_string()];
    let mut current = error.source();
    while let Some(inner) = current {
        let message = inner.to_string();
        if !messages.iter().any(|seen| seen == &message) {
            messages.push(message);
        }
        current = inner.source();
    }
    messages.join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_chain_joins_sources() {
        let io = std::io::Error::other("disk gone");
        let store = StoreError::from(io);
        let err = RevalidateError::from(store);

        let rendered = error_chain(&err);
        assert!(rendered.starts_with("audit store io error: disk gone"));
    }

    #[test]
    fn error_chain_skips_repeated_messages() {
        let err = AppError::from(RevalidateError::ConfigurationMissing);
        assert_eq!(
            error_chain(&err),
            "revalidation endpoint url or auth token is not configured"
        );
    }
}
