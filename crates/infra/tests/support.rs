//! Shared helpers for infra integration tests

#![allow(dead_code)]

use std::sync::Arc;

use lubesync_domain::{ApiConfig, CacheMetadata, SyncStatus, Vehicle};
use lubesync_infra::ResilientTransport;
use wiremock::MockServer;

/// Transport settings with short backoff so retry tests stay fast.
pub fn fast_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        max_retries: 3,
        base_retry_delay_ms: 10,
        ..ApiConfig::default()
    }
}

pub fn transport_for(server: &MockServer) -> Arc<ResilientTransport> {
    transport_with(fast_config(&server.uri()))
}

pub fn transport_with(config: ApiConfig) -> Arc<ResilientTransport> {
    Arc::new(ResilientTransport::new(config).expect("transport"))
}

pub fn vehicle(id: i64, model: &str, status: SyncStatus) -> Vehicle {
    Vehicle {
        id,
        year: 2019,
        make: "Subaru".into(),
        model: model.into(),
        license_plate: "LUBE-01".into(),
        cache: CacheMetadata {
            sync_status: status,
            is_dirty: status != SyncStatus::Synced,
            ..CacheMetadata::default()
        },
        ..Vehicle::default()
    }
}

/// Server-side JSON for a vehicle.
pub fn vehicle_json(id: i64, model: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "year": 2019,
        "make": "Subaru",
        "model": model,
        "licensePlate": "LUBE-01",
        "isElectric": false
    })
}
