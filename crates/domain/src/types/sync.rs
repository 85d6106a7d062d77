//! Outcome types of sync passes and campaigns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Derived from counts alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncResultStatus {
    Success,
    PartialSuccess,
    Failure,
}

/// One recorded per-item failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncErrorEntry {
    pub entity_type: String,
    pub entity_id: Option<i64>,
    pub cause: String,
}

/// Counters and errors gathered by a pass. Mergeable across passes and types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success_count: u32,
    pub failure_count: u32,
    pub skipped_count: u32,
    pub conflict_count: u32,
    pub errors: Vec<SyncErrorEntry>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Set when cancellation stopped the pass before it finished.
    pub cancelled: bool,
}

impl Default for SyncResult {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncResult {
    /// Empty result starting (and ending) now.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            success_count: 0,
            failure_count: 0,
            skipped_count: 0,
            conflict_count: 0,
            errors: Vec::new(),
            start_time: now,
            end_time: now,
            cancelled: false,
        }
    }

    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped_count += 1;
    }

    pub fn record_conflict(&mut self) {
        self.conflict_count += 1;
    }

    pub fn record_failure(
        &mut self,
        entity_type: impl Into<String>,
        entity_id: Option<i64>,
        cause: impl ToString,
    ) {
        self.failure_count += 1;
        self.errors.push(SyncErrorEntry {
            entity_type: entity_type.into(),
            entity_id,
            cause: cause.to_string(),
        });
    }

    /// Stamp the end time and return self.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.end_time = Utc::now().max(self.start_time);
        self
    }

    /// Fold `other` into `self`: counts sum, errors concatenate, the time
    /// window widens to cover both.
    pub fn merge(&mut self, other: Self) {
        self.success_count += other.success_count;
        self.failure_count += other.failure_count;
        self.skipped_count += other.skipped_count;
        self.conflict_count += other.conflict_count;
        self.errors.extend(other.errors);
        self.start_time = self.start_time.min(other.start_time);
        self.end_time = self.end_time.max(other.end_time);
        self.cancelled |= other.cancelled;
    }

    pub fn status(&self) -> SyncResultStatus {
        match (self.success_count, self.failure_count) {
            (s, 0) if s > 0 => SyncResultStatus::Success,
            (s, f) if s > 0 && f > 0 => SyncResultStatus::PartialSuccess,
            _ => SyncResultStatus::Failure,
        }
    }
}

/// Campaign run states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncRunState {
    Started,
    Completed,
    Failed,
    Skipped,
}

impl_domain_status_conversions!(SyncRunState {
    Started => "started",
    Completed => "completed",
    Failed => "failed",
    Skipped => "skipped",
});

/// Returned by every campaign entry point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub state: SyncRunState,
    pub result: SyncResult,
}

impl SyncReport {
    /// Empty result for a campaign that never ran.
    pub fn skipped() -> Self {
        Self { state: SyncRunState::Skipped, result: SyncResult::new() }
    }

    /// Completed when nothing failed, Failed otherwise.
    pub fn from_result(result: SyncResult) -> Self {
        let state =
            if result.failure_count == 0 { SyncRunState::Completed } else { SyncRunState::Failed };
        Self { state, result }
    }
}
