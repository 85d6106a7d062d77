//! Error types used throughout the application

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for LubeSync
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum LubeSyncError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for LubeSync operations
pub type Result<T> = std::result::Result<T, LubeSyncError>;

/// Categories of sync errors for retry logic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorCategory {
    /// Authentication errors (401, 403)
    Authentication,
    /// Rate limiting errors (429) that outlived the transport's retries
    RateLimit,
    /// Server errors (5xx)
    Server,
    /// Client errors (4xx except auth and 404) - non-retryable
    Client,
    /// Network/connection errors, timeouts and an open circuit
    Network,
    /// Local store errors
    Database,
    /// Configuration and cancellation - non-retryable
    Config,
}

/// Failure of a single entity inside a sync pass.
///
/// Never aborts a batch; it is recorded on the pass's `SyncResult`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Remote resource not found: {0}")]
    NotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Operation cancelled")]
    Cancelled,
}

impl SyncError {
    /// Get the error category for this error
    pub fn category(&self) -> SyncErrorCategory {
        match self {
            Self::Auth(_) => SyncErrorCategory::Authentication,
            Self::RateLimit(_) => SyncErrorCategory::RateLimit,
            Self::Server(_) => SyncErrorCategory::Server,
            Self::Client(_) | Self::NotFound(_) => SyncErrorCategory::Client,
            Self::Network(_) | Self::Timeout(_) | Self::CircuitOpen(_) => {
                SyncErrorCategory::Network
            }
            Self::Database(_) => SyncErrorCategory::Database,
            Self::Config(_) | Self::Cancelled => SyncErrorCategory::Config,
        }
    }

    /// Check if the next campaign is likely to succeed where this one failed
    pub fn should_retry(&self) -> bool {
        matches!(
            self.category(),
            SyncErrorCategory::Authentication
                | SyncErrorCategory::RateLimit
                | SyncErrorCategory::Server
                | SyncErrorCategory::Network
                | SyncErrorCategory::Database
        )
    }

    /// Build the error for a non-success HTTP status.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = if body.is_empty() { format!("HTTP {status}") } else { format!("HTTP {status}: {body}") };
        match status {
            401 | 403 => Self::Auth(message),
            404 => Self::NotFound(message),
            429 => Self::RateLimit(message),
            500..=599 => Self::Server(message),
            _ => Self::Client(message),
        }
    }
}

/// Convert from LubeSyncError to SyncError
impl From<LubeSyncError> for SyncError {
    fn from(err: LubeSyncError) -> Self {
        match err {
            LubeSyncError::Database(message) => Self::Database(message),
            LubeSyncError::Config(message) => Self::Config(message),
            LubeSyncError::Network(message) => Self::Network(message),
            LubeSyncError::Auth(message) => Self::Auth(message),
            LubeSyncError::NotFound(message)
            | LubeSyncError::InvalidInput(message)
            | LubeSyncError::InvalidState(message) => Self::Client(message),
            LubeSyncError::Internal(message) => Self::Server(message),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Client(format!("malformed payload: {err}"))
    }
}

impl From<serde_json::Error> for LubeSyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidInput(format!("serialization failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(
            SyncError::Auth("test".to_string()).category(),
            SyncErrorCategory::Authentication
        );
        assert_eq!(
            SyncError::RateLimit("test".to_string()).category(),
            SyncErrorCategory::RateLimit
        );
        assert_eq!(SyncError::Server("test".to_string()).category(), SyncErrorCategory::Server);
        assert_eq!(
            SyncError::CircuitOpen("test".to_string()).category(),
            SyncErrorCategory::Network
        );
        assert_eq!(SyncError::NotFound("test".to_string()).category(), SyncErrorCategory::Client);
    }

    #[test]
    fn test_should_retry() {
        assert!(SyncError::Server("test".to_string()).should_retry());
        assert!(SyncError::Timeout(Duration::from_secs(1)).should_retry());
        assert!(!SyncError::Client("test".to_string()).should_retry());
        assert!(!SyncError::Cancelled.should_retry());
    }

    #[test]
    fn test_from_status_maps_families() {
        assert!(matches!(SyncError::from_status(401, ""), SyncError::Auth(_)));
        assert!(matches!(SyncError::from_status(403, "nope"), SyncError::Auth(_)));
        assert!(matches!(SyncError::from_status(404, ""), SyncError::NotFound(_)));
        assert!(matches!(SyncError::from_status(429, ""), SyncError::RateLimit(_)));
        assert!(matches!(SyncError::from_status(503, ""), SyncError::Server(_)));
        assert!(matches!(SyncError::from_status(422, "bad"), SyncError::Client(_)));
        assert_eq!(SyncError::from_status(500, "boom").to_string(), "Server error: HTTP 500: boom");
    }

    #[test]
    fn test_domain_error_conversion() {
        let err: SyncError = LubeSyncError::Database("locked".into()).into();
        assert_eq!(err, SyncError::Database("locked".into()));

        let err: SyncError = LubeSyncError::InvalidState("synced".into()).into();
        assert_eq!(err.category(), SyncErrorCategory::Client);
    }

    #[test]
    fn test_error_serializes_tagged() {
        let json = serde_json::to_string(&LubeSyncError::NotFound("vehicle 3".into())).unwrap();
        assert_eq!(json, r#"{"type":"NotFound","message":"vehicle 3"}"#);
    }
}
