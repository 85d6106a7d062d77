//! Resilience patterns for calling an unreliable remote service
//!
//! These primitives hold explicit state owned by whoever constructs them;
//! there are no process-wide singletons.

pub mod backoff;
pub mod circuit_breaker;
pub mod rate_limit;

pub use backoff::{backoff_bounds, backoff_delay};
pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerConfigBuilder, CircuitBreakerState, CircuitPermit,
    CircuitState, Clock, ConfigError, ConfigResult, MockClock, SystemClock,
};
pub use rate_limit::{parse_retry_after, RateLimitInfo, RateLimitTracker};
