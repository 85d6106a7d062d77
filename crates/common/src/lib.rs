//! # LubeSync Common
//!
//! Generic resilience primitives shared by the transport layer:
//!
//! - [`resilience::circuit_breaker`]: three-state breaker with an injectable
//!   [`Clock`](resilience::Clock)
//! - [`resilience::backoff`]: exponential backoff with jitter
//! - [`resilience::rate_limit`]: rate-limit tracking from response headers
//!
//! Nothing here knows about HTTP clients or entity types.

pub mod resilience;
