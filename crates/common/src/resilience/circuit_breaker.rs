//! Three-state circuit breaker
//!
//! Closed counts consecutive failures and opens at the threshold. Open
//! rejects every call until the reset timeout elapses, then the next caller
//! moves the breaker to HalfOpen and becomes the single probe. The probe's
//! outcome closes the circuit (success) or reopens it immediately (failure).
//! A probe that never reports back is abandoned: dropping its
//! [`CircuitPermit`] reopens the circuit, and a probe older than the reset
//! timeout no longer blocks the next one.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

//==============================================================================
// Time Abstraction for Testability
//==============================================================================

/// Trait for time operations to enable deterministic testing
pub trait Clock: Send + Sync + 'static {
    /// Get current instant (monotonic time)
    fn now(&self) -> Instant;

    /// Get current system time (wall clock)
    fn system_time(&self) -> SystemTime;

    /// Get milliseconds since UNIX epoch
    fn millis_since_epoch(&self) -> u64 {
        let millis = self.system_time().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        u64::try_from(millis).unwrap_or(u64::MAX)
    }
}

/// Real system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn system_time(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn system_time(&self) -> SystemTime {
        (**self).system_time()
    }
}

/// Mock clock for deterministic testing
///
/// Clones share the same elapsed time, so a test can keep one handle and
/// hand another to the breaker.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Advance the mock clock by a duration
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    pub fn advance_millis(&self, millis: u64) {
        self.advance(Duration::from_millis(millis));
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn system_time(&self) -> SystemTime {
        UNIX_EPOCH + self.elapsed()
    }
}

//==============================================================================
// Configuration
//==============================================================================

/// Simple configuration error for validation
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// Configuration result type using simple config errors
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Calls flow; consecutive failures are counted
    Closed,
    /// Calls are rejected until the reset time
    Open,
    /// One probe call is in flight or allowed
    HalfOpen,
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Configuration for circuit breaker behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u64,
    /// Time the circuit stays open before a probe is allowed
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self { failure_threshold: 5, reset_timeout: Duration::from_secs(60) }
    }
}

impl CircuitBreakerConfig {
    pub fn builder() -> CircuitBreakerConfigBuilder {
        CircuitBreakerConfigBuilder::default()
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::Invalid {
                message: "failure_threshold must be greater than 0".to_string(),
            });
        }

        if self.reset_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                message: "reset_timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Builder for CircuitBreakerConfig
#[derive(Debug, Default)]
pub struct CircuitBreakerConfigBuilder {
    config: CircuitBreakerConfig,
}

impl CircuitBreakerConfigBuilder {
    pub fn failure_threshold(mut self, threshold: u64) -> Self {
        self.config.failure_threshold = threshold;
        self
    }

    pub fn reset_timeout(mut self, timeout: Duration) -> Self {
        self.config.reset_timeout = timeout;
        self
    }

    pub fn build(self) -> ConfigResult<CircuitBreakerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//==============================================================================
// Circuit Breaker
//==============================================================================

/// Point-in-time view of the breaker, safe to hand to callers and the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub failure_count: u64,
    pub threshold: u64,
    pub reset_timeout: Duration,
    pub state: CircuitState,
    /// When an open circuit will admit a probe.
    pub reset_time: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    failure_count: u64,
    opened_at: Option<Instant>,
    probe_in_flight: bool,
    probe_started: Option<Instant>,
}

pub struct CircuitBreaker<C: Clock = SystemClock> {
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
    clock: C,
}

impl<C: Clock> fmt::Debug for CircuitBreaker<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("state", &inner.state)
            .field("failure_count", &inner.failure_count)
            .finish()
    }
}

impl CircuitBreaker<SystemClock> {
    pub fn new(config: CircuitBreakerConfig) -> ConfigResult<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> CircuitBreaker<C> {
    /// Create a circuit breaker with a custom clock
    pub fn with_clock(config: CircuitBreakerConfig, clock: C) -> ConfigResult<Self> {
        config.validate()?;

        Ok(Self {
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                failure_count: 0,
                opened_at: None,
                probe_in_flight: false,
                probe_started: None,
            }),
            clock,
        })
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Check if the circuit breaker admits a call.
    ///
    /// An open circuit whose reset time has passed moves to HalfOpen and
    /// admits this caller as the probe. While the probe is in flight every
    /// other caller is rejected, until the probe is older than the reset
    /// timeout.
    pub fn can_execute(&self) -> bool {
        self.admit().is_some()
    }

    /// Admit a call and hand back a permit that reports its outcome.
    ///
    /// Returns `None` when the circuit rejects the call.
    pub fn try_acquire(&self) -> Option<CircuitPermit<'_, C>> {
        self.admit().map(|is_probe| CircuitPermit { breaker: self, is_probe, resolved: false })
    }

    /// `Some(true)` when the caller is the half-open probe.
    fn admit(&self) -> Option<bool> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        match inner.state {
            CircuitState::Closed => Some(false),
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|opened| now.duration_since(opened));
                if elapsed.is_some_and(|elapsed| elapsed >= self.config.reset_timeout) {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    inner.probe_started = Some(now);
                    info!("Circuit breaker transitioning to HALF_OPEN; admitting one probe");
                    Some(true)
                } else {
                    None
                }
            }
            CircuitState::HalfOpen => {
                let stale = inner
                    .probe_started
                    .is_some_and(|started| now.duration_since(started) >= self.config.reset_timeout);
                if inner.probe_in_flight && !stale {
                    return None;
                }
                if stale {
                    warn!("Half-open probe never reported; admitting a new probe");
                }
                inner.probe_in_flight = true;
                inner.probe_started = Some(now);
                Some(true)
            }
        }
    }

    /// Reopen the circuit when the half-open probe goes away without an outcome.
    fn abandon_probe(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::HalfOpen || !inner.probe_in_flight {
            return;
        }
        warn!("Half-open probe abandoned; reopening circuit");
        inner.state = CircuitState::Open;
        inner.opened_at = Some(self.clock.now());
        inner.probe_in_flight = false;
        inner.probe_started = None;
    }

    /// A success clears the failure count and closes the circuit.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock();
        if inner.state != CircuitState::Closed {
            info!(previous = %inner.state, "Circuit breaker closed after successful call");
        }
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
        inner.probe_started = None;
    }

    /// Count a failure; opens at the threshold, or at once from HalfOpen.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock();
        inner.failure_count = inner.failure_count.saturating_add(1);

        let should_open = match inner.state {
            CircuitState::HalfOpen => true,
            CircuitState::Closed => inner.failure_count >= self.config.failure_threshold,
            CircuitState::Open => false,
        };

        if should_open {
            warn!(
                failures = inner.failure_count,
                threshold = self.config.failure_threshold,
                reset_timeout_secs = self.config.reset_timeout.as_secs(),
                "Circuit breaker opened"
            );
            inner.state = CircuitState::Open;
            inner.opened_at = Some(self.clock.now());
            inner.probe_in_flight = false;
            inner.probe_started = None;
        } else {
            debug!(failures = inner.failure_count, state = %inner.state, "Circuit breaker failure recorded");
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    pub fn failure_count(&self) -> u64 {
        self.inner.lock().failure_count
    }

    /// Wall-clock time at which an open circuit admits its probe.
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock();
        self.reset_time_locked(&inner)
    }

    pub fn snapshot(&self) -> CircuitBreakerState {
        let inner = self.inner.lock();
        CircuitBreakerState {
            failure_count: inner.failure_count,
            threshold: self.config.failure_threshold,
            reset_timeout: self.config.reset_timeout,
            state: inner.state,
            reset_time: self.reset_time_locked(&inner),
        }
    }

    /// Force the breaker back to Closed.
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.state = CircuitState::Closed;
        inner.failure_count = 0;
        inner.opened_at = None;
        inner.probe_in_flight = false;
        inner.probe_started = None;
        info!("Circuit breaker manually reset");
    }

    fn reset_time_locked(&self, inner: &Inner) -> Option<DateTime<Utc>> {
        if inner.state != CircuitState::Open {
            return None;
        }
        let opened_at = inner.opened_at?;
        let remaining =
            self.config.reset_timeout.saturating_sub(self.clock.now().duration_since(opened_at));
        Some(DateTime::<Utc>::from(self.clock.system_time() + remaining))
    }
}

/// Admission granted by [`CircuitBreaker::try_acquire`].
///
/// Report the outcome with [`succeed`](Self::succeed) or [`fail`](Self::fail).
/// Dropping an unresolved probe permit reopens the circuit.
#[must_use = "an unreported permit counts as an abandoned call"]
pub struct CircuitPermit<'a, C: Clock = SystemClock> {
    breaker: &'a CircuitBreaker<C>,
    is_probe: bool,
    resolved: bool,
}

impl<C: Clock> CircuitPermit<'_, C> {
    pub fn is_probe(&self) -> bool {
        self.is_probe
    }

    pub fn succeed(mut self) {
        self.resolved = true;
        self.breaker.record_success();
    }

    pub fn fail(mut self) {
        self.resolved = true;
        self.breaker.record_failure();
    }
}

impl<C: Clock> Drop for CircuitPermit<'_, C> {
    fn drop(&mut self) {
        if !self.resolved && self.is_probe {
            self.breaker.abandon_probe();
        }
    }
}
