//! Rate-limit tracking driven by server response headers
//!
//! Reads `X-RateLimit-Limit`, `X-RateLimit-Remaining` and `X-RateLimit-Reset`
//! (or the unprefixed `RateLimit-*` forms). A reset value is interpreted as
//! an absolute unix timestamp when larger than 1e9, as seconds from now when
//! numeric otherwise, and as an HTTP date when not numeric.

use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::debug;

const UNIX_TIMESTAMP_FLOOR: i64 = 1_000_000_000;

const LIMIT_HEADERS: [&str; 2] = ["x-ratelimit-limit", "ratelimit-limit"];
const REMAINING_HEADERS: [&str; 2] = ["x-ratelimit-remaining", "ratelimit-remaining"];
const RESET_HEADERS: [&str; 2] = ["x-ratelimit-reset", "ratelimit-reset"];

/// Last rate-limit state advertised by the server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset_time: Option<DateTime<Utc>>,
    pub is_throttled: bool,
}

impl RateLimitInfo {
    /// How long a caller must wait before the next request, if at all.
    pub fn wait_until_reset(&self, now: DateTime<Utc>) -> Option<Duration> {
        if self.remaining != Some(0) {
            return None;
        }
        let reset_time = self.reset_time?;
        (reset_time > now).then(|| (reset_time - now).to_std().ok()).flatten()
    }
}

/// Shared, lock-protected [`RateLimitInfo`].
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    info: Mutex<RateLimitInfo>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> RateLimitInfo {
        self.info.lock().clone()
    }

    /// Recompute the state from one response's headers.
    ///
    /// `header` looks a header up by lowercase name. A response carrying none
    /// of the rate-limit headers leaves the previous state untouched.
    pub fn update_from_headers<F>(&self, header: F, now: DateTime<Utc>)
    where
        F: Fn(&str) -> Option<String>,
    {
        let limit = first_header(&header, &LIMIT_HEADERS);
        let remaining = first_header(&header, &REMAINING_HEADERS);
        let reset = first_header(&header, &RESET_HEADERS);
        if limit.is_none() && remaining.is_none() && reset.is_none() {
            return;
        }

        let remaining = remaining.and_then(|value| value.trim().parse::<u64>().ok());
        let reset_time = reset.and_then(|value| parse_reset(&value, now));
        let info = RateLimitInfo {
            limit: limit.and_then(|value| value.trim().parse::<u64>().ok()),
            remaining,
            reset_time,
            is_throttled: remaining == Some(0) && reset_time.is_some_and(|reset| reset > now),
        };

        debug!(
            limit = ?info.limit,
            remaining = ?info.remaining,
            reset_time = ?info.reset_time,
            "Rate limit headers updated"
        );
        *self.info.lock() = info;
    }

    /// Wait required before the next request, given the last known state.
    pub fn pending_wait(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.info.lock().wait_until_reset(now)
    }

    pub fn set_throttled(&self, throttled: bool) {
        self.info.lock().is_throttled = throttled;
    }
}

fn first_header<F>(header: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names.iter().find_map(|&name| header(name))
}

/// Parse a reset header value into an absolute time.
pub fn parse_reset(value: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<i64>() {
        return if seconds > UNIX_TIMESTAMP_FLOOR {
            DateTime::from_timestamp(seconds, 0)
        } else {
            chrono::Duration::try_seconds(seconds.max(0)).and_then(|delta| now.checked_add_signed(delta))
        };
    }
    if let Ok(seconds) = value.parse::<f64>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return None;
        }
        // Out-of-range values yield no reset time rather than overflowing.
        return chrono::Duration::try_milliseconds((seconds * 1000.0) as i64)
            .and_then(|delta| now.checked_add_signed(delta));
    }
    parse_http_date(value)
}

/// Parse a `Retry-After` value: delta seconds or an HTTP date.
///
/// A date in the past yields a zero delay.
pub fn parse_retry_after(value: &str, now: DateTime<Utc>) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }
    let at = parse_http_date(value)?;
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|parsed| parsed.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone;

    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_lowercase(), (*v).to_string())).collect();
        move |name: &str| map.get(name).cloned()
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn prefixed_headers_with_relative_reset() {
        let tracker = RateLimitTracker::new();
        let now = fixed_now();

        tracker.update_from_headers(
            headers(&[
                ("X-RateLimit-Limit", "100"),
                ("X-RateLimit-Remaining", "0"),
                ("X-RateLimit-Reset", "30"),
            ]),
            now,
        );

        let info = tracker.snapshot();
        assert_eq!(info.limit, Some(100));
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.reset_time, Some(now + chrono::Duration::seconds(30)));
        assert!(info.is_throttled);
        assert_eq!(tracker.pending_wait(now), Some(Duration::from_secs(30)));
    }

    #[test]
    fn unprefixed_headers_with_absolute_reset() {
        let tracker = RateLimitTracker::new();
        let now = fixed_now();
        let reset = now.timestamp() + 90;

        tracker.update_from_headers(
            headers(&[("RateLimit-Remaining", "5"), ("RateLimit-Reset", &reset.to_string())]),
            now,
        );

        let info = tracker.snapshot();
        assert_eq!(info.remaining, Some(5));
        assert_eq!(info.reset_time.unwrap().timestamp(), reset);
        assert!(!info.is_throttled);
        assert_eq!(tracker.pending_wait(now), None);
    }

    #[test]
    fn http_date_reset() {
        let now = fixed_now();
        let reset = parse_reset("Wed, 01 May 2024 12:00:45 GMT", now).unwrap();
        assert_eq!(reset - now, chrono::Duration::seconds(45));
    }

    #[test]
    fn missing_headers_keep_previous_state() {
        let tracker = RateLimitTracker::new();
        let now = fixed_now();
        tracker.update_from_headers(headers(&[("X-RateLimit-Remaining", "3")]), now);
        tracker.update_from_headers(headers(&[("Content-Type", "application/json")]), now);

        assert_eq!(tracker.snapshot().remaining, Some(3));
    }

    #[test]
    fn elapsed_reset_requires_no_wait() {
        let info = RateLimitInfo {
            limit: Some(10),
            remaining: Some(0),
            reset_time: Some(fixed_now() - chrono::Duration::seconds(1)),
            is_throttled: false,
        };
        assert_eq!(info.wait_until_reset(fixed_now()), None);
    }

    #[test]
    fn huge_reset_values_are_ignored() {
        let tracker = RateLimitTracker::new();
        let now = fixed_now();

        for reset in ["1e15", "9.9e300", "999999999999999999"] {
            tracker.update_from_headers(
                headers(&[("X-RateLimit-Remaining", "0"), ("X-RateLimit-Reset", reset)]),
                now,
            );
            let info = tracker.snapshot();
            assert_eq!(info.reset_time, None, "reset {reset}");
            assert!(!info.is_throttled);
            assert_eq!(tracker.pending_wait(now), None);
        }
        assert!(parse_reset("1e15", now).is_none());
    }

    #[test]
    fn retry_after_forms() {
        let now = fixed_now();
        assert_eq!(parse_retry_after("2", now), Some(Duration::from_secs(2)));
        assert_eq!(
            parse_retry_after("Wed, 01 May 2024 12:00:10 GMT", now),
            Some(Duration::from_secs(10))
        );
        assert_eq!(parse_retry_after("Wed, 01 May 2024 11:00:00 GMT", now), Some(Duration::ZERO));
        assert_eq!(parse_retry_after("soon", now), None);
    }
}
