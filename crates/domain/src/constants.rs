//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Cache policy defaults
pub const DEFAULT_EXPIRATION_MINUTES: i64 = 60;
/// Priority assigned to entity types with no configuration row (visited last).
pub const DEFAULT_SYNC_PRIORITY: u32 = u32::MAX;

// Transport defaults
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_CB_FAILURE_THRESHOLD: u64 = 5;
pub const DEFAULT_CB_RESET_TIMEOUT_MINUTES: u64 = 1;
pub const DEFAULT_MAX_RESPONSE_BYTES: u64 = 10 * 1024 * 1024;

// Remote endpoints
pub const IDENTITY_ENDPOINT: &str = "/api/whoami";
pub const API_VERSION_HEADER: &str = "X-API-Version";
/// How long a health probe answer is reused before probing again.
pub const HEALTH_CACHE_SECONDS: i64 = 30;

// Event emission configuration
pub const DEFAULT_EVENT_BUFFER: usize = 256;
/// Entity type name used for campaign-wide events.
pub const ALL_ENTITY_TYPES: &str = "All";
pub const SERVER_WINS: &str = "server wins";
