//! Progress events, the only UI-facing signal of sync activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Upload,
    Download,
    Refresh,
    ConflictResolution,
    ConnectivityCheck,
}

impl_domain_status_conversions!(SyncOperation {
    Upload => "upload",
    Download => "download",
    Refresh => "refresh",
    ConflictResolution => "conflict_resolution",
    ConnectivityCheck => "connectivity_check",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncEventStatus {
    Started,
    Completed,
    Failed,
    Skipped,
    InProgress,
    ConflictDetected,
}

impl_domain_status_conversions!(SyncEventStatus {
    Started => "started",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
    InProgress => "in_progress",
    ConflictDetected => "conflict_detected",
});

/// One (entity type, operation, status) transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEvent {
    pub entity_type: String,
    pub operation: SyncOperation,
    pub status: SyncEventStatus,
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SyncEvent {
    pub fn new(
        entity_type: impl Into<String>,
        operation: SyncOperation,
        status: SyncEventStatus,
        message: Option<String>,
    ) -> Self {
        Self { entity_type: entity_type.into(), operation, status, message, timestamp: Utc::now() }
    }
}
