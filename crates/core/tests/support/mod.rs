//! Shared test helpers for `lubesync-core` integration tests.
//!
//! In-memory doubles for every core port so orchestration tests can focus on
//! behaviour instead of I/O.
#![allow(dead_code)]

pub mod remote;
pub mod repositories;

use chrono::{Duration, NaiveDate, Utc};
use lubesync_domain::{CacheMetadata, ServiceRecord, SyncStatus, Vehicle};

/// Metadata of a record synced `minutes_left` before expiry (negative = expired).
pub fn synced_metadata(minutes_left: i64) -> CacheMetadata {
    CacheMetadata {
        last_sync: Some(Utc::now() - Duration::hours(1)),
        expires_at: Some(Utc::now() + Duration::minutes(minutes_left)),
        sync_status: SyncStatus::Synced,
        is_dirty: false,
    }
}

pub fn pending_metadata(status: SyncStatus) -> CacheMetadata {
    CacheMetadata { sync_status: status, is_dirty: true, ..CacheMetadata::default() }
}

pub fn vehicle(id: i64, model: &str, cache: CacheMetadata) -> Vehicle {
    Vehicle {
        id,
        year: 2018,
        make: "Subaru".to_string(),
        model: model.to_string(),
        license_plate: format!("LUBE{id}"),
        cache,
        ..Vehicle::default()
    }
}

pub fn service_record(id: i64, description: &str, cache: CacheMetadata) -> ServiceRecord {
    ServiceRecord {
        id,
        vehicle_id: 1,
        date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap_or_default(),
        mileage: 51_200,
        description: description.to_string(),
        cost: 89.5,
        cache,
        ..ServiceRecord::default()
    }
}
