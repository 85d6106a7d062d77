//! Exponential backoff with equal-style jitter
//!
//! `delay(n) = base * 2^min(n, 6) * U[0.5, 1.0]`

use std::time::Duration;

use rand::Rng;

/// Backoff doubles at most this many times.
pub const MAX_EXPONENT: u32 = 6;

/// Un-jittered delay for retry number `retry` (0-based).
fn ceiling(base: Duration, retry: u32) -> Duration {
    base.saturating_mul(1u32 << retry.min(MAX_EXPONENT))
}

/// Inclusive bounds of [`backoff_delay`] for a given retry.
pub fn backoff_bounds(base: Duration, retry: u32) -> (Duration, Duration) {
    let max = ceiling(base, retry);
    (max / 2, max)
}

/// Delay before retry number `retry`, with jitter drawn from the thread RNG.
pub fn backoff_delay(base: Duration, retry: u32) -> Duration {
    let factor = rand::thread_rng().gen_range(0.5..=1.0);
    jittered(base, retry, factor)
}

/// Delay for an explicit jitter factor; clamped into `[0.5, 1.0]`.
pub fn jittered(base: Duration, retry: u32, factor: f64) -> Duration {
    ceiling(base, retry).mul_f64(factor.clamp(0.5, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_within_bounds() {
        let base = Duration::from_millis(1000);
        for retry in 0..10 {
            let (low, high) = backoff_bounds(base, retry);
            for _ in 0..50 {
                let delay = backoff_delay(base, retry);
                assert!(delay >= low && delay <= high, "retry {retry}: {delay:?} not in [{low:?}, {high:?}]");
            }
        }
    }

    #[test]
    fn exponent_is_capped() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_bounds(base, 0), (Duration::from_millis(50), Duration::from_millis(100)));
        assert_eq!(backoff_bounds(base, 3).1, Duration::from_millis(800));
        assert_eq!(backoff_bounds(base, 6).1, Duration::from_millis(6400));
        assert_eq!(backoff_bounds(base, 40).1, Duration::from_millis(6400));
    }

    #[test]
    fn explicit_factor_is_clamped() {
        let base = Duration::from_millis(200);
        assert_eq!(jittered(base, 1, 0.75), Duration::from_millis(300));
        assert_eq!(jittered(base, 1, 0.1), Duration::from_millis(200));
        assert_eq!(jittered(base, 1, 4.0), Duration::from_millis(400));
    }
}
