//! Configuration structures
//!
//! Every section deserializes with defaults, so a partial TOML or JSON file
//! only needs the keys it overrides.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_BASE_RETRY_DELAY_MS, DEFAULT_CB_FAILURE_THRESHOLD, DEFAULT_CB_RESET_TIMEOUT_MINUTES,
    DEFAULT_EVENT_BUFFER, DEFAULT_MAX_RESPONSE_BYTES, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECONDS,
};
use crate::errors::{LubeSyncError, Result};
use crate::types::CacheConfiguration;

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub sync: SyncSettings,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    /// Overrides for the seeded cache configuration rows.
    pub cache: Vec<CacheConfiguration>,
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        self.api.validate()?;
        if self.sync.event_buffer == 0 {
            return Err(LubeSyncError::Config("sync.event_buffer must be positive".into()));
        }
        Ok(())
    }
}

/// Remote service and transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub base_retry_delay_ms: u64,
    pub enable_throttling: bool,
    pub enable_circuit_breaker: bool,
    pub circuit_breaker_failure_threshold: u64,
    pub circuit_breaker_reset_timeout_minutes: u64,
    /// Responses advertising a larger body are rejected by the adapters.
    pub max_response_bytes: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            api_version: String::new(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            base_retry_delay_ms: DEFAULT_BASE_RETRY_DELAY_MS,
            enable_throttling: true,
            enable_circuit_breaker: true,
            circuit_breaker_failure_threshold: DEFAULT_CB_FAILURE_THRESHOLD,
            circuit_breaker_reset_timeout_minutes: DEFAULT_CB_RESET_TIMEOUT_MINUTES,
            max_response_bytes: DEFAULT_MAX_RESPONSE_BYTES,
        }
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(LubeSyncError::Config("api.base_url must not be empty".into()));
        }
        if self.timeout_seconds == 0 {
            return Err(LubeSyncError::Config("api.timeout_seconds must be positive".into()));
        }
        if self.enable_circuit_breaker && self.circuit_breaker_failure_threshold == 0 {
            return Err(LubeSyncError::Config(
                "api.circuit_breaker_failure_threshold must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn base_retry_delay(&self) -> Duration {
        Duration::from_millis(self.base_retry_delay_ms)
    }

    pub fn circuit_breaker_reset_timeout(&self) -> Duration {
        Duration::from_secs(self.circuit_breaker_reset_timeout_minutes.saturating_mul(60))
    }
}

/// Orchestrator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Capacity of the progress channel; slow subscribers lose the oldest events.
    pub event_buffer: usize,
    /// Budget for the local connectivity probe.
    pub connectivity_timeout_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self { event_buffer: DEFAULT_EVENT_BUFFER, connectivity_timeout_ms: 3000 }
    }
}

/// Local store settings. No path means an in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: None, pool_size: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives; `RUST_LOG` wins when set.
    pub filter: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "info".to_string(), json: false }
    }
}
