//! Integration tests for the resilience module
//!
//! Exercises the breaker, backoff and rate-limit tracker together the way the
//! HTTP transport drives them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use lubesync_common::resilience::{
    backoff_bounds, backoff_delay, CircuitBreaker, CircuitBreakerConfig, CircuitState, MockClock,
    RateLimitTracker,
};

fn breaker(threshold: u64, reset: Duration) -> (CircuitBreaker<Arc<MockClock>>, Arc<MockClock>) {
    let clock = Arc::new(MockClock::new());
    let config = CircuitBreakerConfig::builder()
        .failure_threshold(threshold)
        .reset_timeout(reset)
        .build()
        .expect("valid config");
    let breaker = CircuitBreaker::with_clock(config, Arc::clone(&clock)).expect("breaker");
    (breaker, clock)
}

/// Validates the full Closed -> Open -> HalfOpen -> Closed cycle.
///
/// # Test Steps
/// 1. Record failures up to the threshold
/// 2. Verify calls are rejected while the reset timeout runs
/// 3. Advance the clock past the timeout and admit one probe
/// 4. Record a success and verify the circuit closes
#[test]
fn test_breaker_full_cycle() {
    let (breaker, clock) = breaker(3, Duration::from_secs(60));

    for _ in 0..3 {
        assert!(breaker.can_execute());
        breaker.record_failure();
    }
    assert_eq!(breaker.state(), CircuitState::Open);
    assert!(!breaker.can_execute());

    clock.advance(Duration::from_secs(59));
    assert!(!breaker.can_execute());

    clock.advance(Duration::from_secs(1));
    assert!(breaker.can_execute());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    breaker.record_success();
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(breaker.failure_count(), 0);
}

/// Only one of many concurrent callers becomes the half-open probe.
#[test]
fn test_half_open_admits_single_probe_across_threads() {
    let (breaker, clock) = breaker(1, Duration::from_millis(100));
    breaker.record_failure();
    clock.advance_millis(100);

    let admitted = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8).map(|_| scope.spawn(|| breaker.can_execute())).collect();
        handles.into_iter().map(|handle| handle.join()).filter(|joined| matches!(joined, Ok(true))).count()
    });

    assert_eq!(admitted, 1);
    breaker.record_failure();
    assert_eq!(breaker.state(), CircuitState::Open);
}

/// Successes between failures keep the breaker closed.
#[test]
fn test_interleaved_success_resets_count() {
    let (breaker, _clock) = breaker(3, Duration::from_secs(60));
    for _ in 0..5 {
        breaker.record_failure();
        breaker.record_failure();
        breaker.record_success();
    }
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[test]
fn test_backoff_sequence_grows_then_caps() {
    let base = Duration::from_millis(10);
    let mut previous_ceiling = Duration::ZERO;
    for retry in 0..=6 {
        let (low, high) = backoff_bounds(base, retry);
        assert!(high > previous_ceiling);
        let delay = backoff_delay(base, retry);
        assert!(delay >= low && delay <= high);
        previous_ceiling = high;
    }
    assert_eq!(backoff_bounds(base, 7), backoff_bounds(base, 6));
}

/// A response reporting zero remaining calls blocks until the reset time,
/// and a later response without rate-limit headers keeps that state.
#[test]
fn test_rate_limit_tracker_follows_headers() {
    let tracker = RateLimitTracker::new();
    let now = Utc::now();

    let headers: HashMap<&str, &str> =
        [("x-ratelimit-limit", "60"), ("x-ratelimit-remaining", "0"), ("x-ratelimit-reset", "30")]
            .into_iter()
            .collect();
    tracker.update_from_headers(|name| headers.get(name).map(|value| value.to_string()), now);

    let wait = tracker.pending_wait(now).expect("throttled");
    assert_eq!(wait, Duration::from_secs(30));
    assert!(tracker.snapshot().is_throttled);

    tracker.update_from_headers(|_| None, now);
    assert_eq!(tracker.snapshot().limit, Some(60));

    let reset_passed = now + chrono::Duration::seconds(31);
    assert!(tracker.pending_wait(reset_passed).is_none());

    let refreshed: HashMap<&str, &str> =
        [("ratelimit-remaining", "12"), ("ratelimit-reset", "30")].into_iter().collect();
    tracker.update_from_headers(|name| refreshed.get(name).map(|value| value.to_string()), now);
    assert!(tracker.pending_wait(now).is_none());
    assert!(!tracker.snapshot().is_throttled);
}
