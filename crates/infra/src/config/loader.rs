//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `LUBESYNC_BASE_URL` is not set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `LUBESYNC_BASE_URL`: Remote service base URL (required for env loading)
//! - `LUBESYNC_API_VERSION`: Value sent in the API version header
//! - `LUBESYNC_TIMEOUT_SECONDS`: Per-request timeout
//! - `LUBESYNC_MAX_RETRIES`: Retries after the first attempt
//! - `LUBESYNC_BASE_RETRY_DELAY_MS`: Backoff base delay
//! - `LUBESYNC_ENABLE_THROTTLING`: Honour server rate limits (true/false)
//! - `LUBESYNC_ENABLE_CIRCUIT_BREAKER`: Enable the circuit breaker (true/false)
//! - `LUBESYNC_CB_FAILURE_THRESHOLD`: Failures that open the circuit
//! - `LUBESYNC_CB_RESET_TIMEOUT_MINUTES`: Time the circuit stays open
//! - `LUBESYNC_STORE_PATH`: SQLite database path (in-memory when unset)
//! - `LUBESYNC_LOG_FILTER`: Tracing filter directives
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./lubesync.{toml,json}` then `./config.{toml,json}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable
//!
//! Cache configuration rows missing from the loaded config fall back to the
//! seeded defaults when the cache configurations are built.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use lubesync_domain::{ApiConfig, Config, LoggingConfig, LubeSyncError, Result, StoreConfig};

const CONFIG_FILE_NAMES: [&str; 4] = ["lubesync.toml", "lubesync.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `LubeSyncError::Config` if configuration cannot be loaded from
/// either source or fails validation.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `LUBESYNC_BASE_URL` is required; every other setting keeps its
/// default when unset.
///
/// # Errors
/// Returns `LubeSyncError::Config` if the base URL is missing or a value
/// cannot be parsed.
pub fn load_from_env() -> Result<Config> {
    let defaults = ApiConfig::default();
    let api = ApiConfig {
        base_url: env_var("LUBESYNC_BASE_URL")?,
        api_version: std::env::var("LUBESYNC_API_VERSION").unwrap_or(defaults.api_version),
        timeout_seconds: env_parse("LUBESYNC_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
        max_retries: env_parse("LUBESYNC_MAX_RETRIES", defaults.max_retries)?,
        base_retry_delay_ms: env_parse("LUBESYNC_BASE_RETRY_DELAY_MS", defaults.base_retry_delay_ms)?,
        enable_throttling: env_bool("LUBESYNC_ENABLE_THROTTLING", defaults.enable_throttling),
        enable_circuit_breaker: env_bool(
            "LUBESYNC_ENABLE_CIRCUIT_BREAKER",
            defaults.enable_circuit_breaker,
        ),
        circuit_breaker_failure_threshold: env_parse(
            "LUBESYNC_CB_FAILURE_THRESHOLD",
            defaults.circuit_breaker_failure_threshold,
        )?,
        circuit_breaker_reset_timeout_minutes: env_parse(
            "LUBESYNC_CB_RESET_TIMEOUT_MINUTES",
            defaults.circuit_breaker_reset_timeout_minutes,
        )?,
        max_response_bytes: defaults.max_response_bytes,
    };

    let store = StoreConfig {
        path: std::env::var("LUBESYNC_STORE_PATH").ok().map(PathBuf::from),
        ..StoreConfig::default()
    };
    let logging = LoggingConfig {
        filter: std::env::var("LUBESYNC_LOG_FILTER").unwrap_or_else(|_| LoggingConfig::default().filter),
        ..LoggingConfig::default()
    };

    let config = Config { api, store, logging, ..Config::default() };
    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `LubeSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the settings fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(LubeSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            LubeSyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| LubeSyncError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| LubeSyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| LubeSyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(LubeSyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend([cwd.clone(), cwd.join(".."), cwd.join("../..")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        LubeSyncError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable, keeping `default` when unset.
fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| LubeSyncError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
