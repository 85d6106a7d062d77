//! Transport-level error types

use std::time::Duration;

use chrono::{DateTime, Utc};
use lubesync_domain::SyncError;
use thiserror::Error;

/// Failure of a call before a usable HTTP response was obtained.
///
/// Non-success statuses are not errors at this level; callers inspect the
/// returned response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Circuit breaker open; retry after {retry_at:?}")]
    CircuitOpen { retry_at: Option<DateTime<Utc>> },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransportError {
    pub(crate) fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    pub fn is_circuit_open(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}

impl From<TransportError> for SyncError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::CircuitOpen { retry_at } => Self::CircuitOpen(match retry_at {
                Some(at) => format!("retry after {}", at.to_rfc3339()),
                None => "remote calls suspended".to_string(),
            }),
            TransportError::Timeout(duration) => Self::Timeout(duration),
            TransportError::Network(message) => Self::Network(message),
            TransportError::InvalidRequest(message) => Self::Client(message),
            TransportError::Config(message) => Self::Config(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use lubesync_domain::SyncErrorCategory;

    use super::*;

    #[test]
    fn circuit_open_stays_distinct_from_network_errors() {
        let err: SyncError = TransportError::CircuitOpen { retry_at: None }.into();
        assert!(matches!(err, SyncError::CircuitOpen(_)));

        let err: SyncError = TransportError::Network("connection refused".into()).into();
        assert_eq!(err, SyncError::Network("connection refused".into()));
        assert_eq!(err.category(), SyncErrorCategory::Network);
    }

    #[test]
    fn invalid_request_is_not_retried() {
        let err: SyncError = TransportError::InvalidRequest("bad url".into()).into();
        assert!(!err.should_retry());
        assert!(SyncError::from(TransportError::Timeout(Duration::from_secs(30))).should_retry());
    }
}
