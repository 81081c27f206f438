//! Run-aborting errors.
//!
//! Only these stop a run. Everything that goes wrong with a single asset is a
//! [`FetchOutcome::Failed`](crate::fetch::FetchOutcome::Failed) instead.

use thiserror::Error;

use crate::server::ServerError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    /// The explicit server address could not be parsed.
    #[error("invalid caching server URL '{url}': {reason}")]
    InvalidServerUrl { url: String, reason: String },

    /// No caching server answered. Raised before any catalog work.
    #[error("caching server unreachable (tried: {})", tried.join(", "))]
    ServerUnreachable { tried: Vec<String> },

    /// Nothing matched and the caller required a non-empty selection.
    #[error("no assets match the selection")]
    EmptySelection,
}

impl From<ServerError> for SyncError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidUrl { url, reason } => SyncError::InvalidServerUrl { url, reason },
            ServerError::Unreachable { tried } => SyncError::ServerUnreachable { tried },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_server_error() {
        let err: SyncError = ServerError::Unreachable {
            tried: vec!["http://a:1".to_string(), "http://b:2".to_string()],
        }
        .into();
        assert_eq!(
            err.to_string(),
            "caching server unreachable (tried: http://a:1, http://b:2)"
        );

        let err: SyncError = ServerError::InvalidUrl {
            url: "x".to_string(),
            reason: "relative URL without a base".to_string(),
        }
        .into();
        assert!(matches!(err, SyncError::InvalidServerUrl { .. }));
    }
}
