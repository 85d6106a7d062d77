//! Resilient HTTP transport
//!
//! Every outbound call to the remote service goes through one
//! [`ResilientTransport`]. A call proceeds as follows:
//!
//! 1. When the last response left the rate limit exhausted, wait for the
//!    advertised reset time. The wait does not consume a retry.
//! 2. Ask the circuit breaker for admission; an open circuit fails the call
//!    immediately with [`TransportError::CircuitOpen`].
//! 3. Send the request. Transport failures and timeouts count against the
//!    breaker and are retried with jittered exponential backoff.
//! 4. Record rate-limit headers and feed the status into the breaker
//!    (`>= 500` is a failure, anything else a success).
//! 5. A `429` is retried after `Retry-After` (or backoff) while retries
//!    remain; once exhausted the throttled response is returned as-is.
//!
//! Any other response, 5xx included, is returned to the caller to interpret.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use lubesync_common::resilience::{
    backoff_delay, parse_retry_after, CircuitBreaker, CircuitBreakerConfig, CircuitBreakerState,
    RateLimitInfo, RateLimitTracker,
};
use lubesync_core::RemoteHealthProbe;
use lubesync_domain::constants::{API_VERSION_HEADER, HEALTH_CACHE_SECONDS, IDENTITY_ENDPOINT};
use lubesync_domain::ApiConfig;
use parking_lot::RwLock;
use reqwest::header::{ACCEPT, AUTHORIZATION, RETRY_AFTER};
use reqwest::{Client, Method, Request, Response, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::errors::TransportError;

/// Outcome of the last identity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthStatus {
    pub healthy: bool,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct RequestSettings {
    base_url: String,
    api_version: String,
    authorization: Option<String>,
}

/// HTTP client with throttling, circuit breaking and retry.
///
/// Rate-limit and breaker state live on the instance; share it by `Arc`.
pub struct ResilientTransport {
    client: Client,
    config: ApiConfig,
    settings: RwLock<RequestSettings>,
    circuit_breaker: CircuitBreaker,
    rate_limit: RateLimitTracker,
    features: DashMap<String, bool>,
    health: RwLock<Option<HealthStatus>>,
}

impl ResilientTransport {
    /// Build a transport from validated API settings.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Config`] for invalid settings or when the
    /// underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self, TransportError> {
        config.validate().map_err(|e| TransportError::Config(e.to_string()))?;

        let client = Client::builder()
            .timeout(config.timeout())
            .no_proxy()
            .build()
            .map_err(|e| TransportError::Config(format!("failed to build HTTP client: {e}")))?;

        let breaker_config = if config.enable_circuit_breaker {
            CircuitBreakerConfig::builder()
                .failure_threshold(config.circuit_breaker_failure_threshold)
                .reset_timeout(config.circuit_breaker_reset_timeout())
                .build()
                .map_err(|e| TransportError::Config(e.to_string()))?
        } else {
            CircuitBreakerConfig::default()
        };
        let circuit_breaker = CircuitBreaker::new(breaker_config)
            .map_err(|e| TransportError::Config(e.to_string()))?;

        let settings = RequestSettings {
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            authorization: None,
        };

        Ok(Self {
            client,
            config,
            settings: RwLock::new(settings),
            circuit_breaker,
            rate_limit: RateLimitTracker::new(),
            features: DashMap::new(),
            health: RwLock::new(None),
        })
    }

    /// GET `path` with `query` appended to the URL.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Response, TransportError> {
        self.send(Method::GET, path, query).await
    }

    /// POST `form` as a urlencoded body.
    pub async fn post_form(&self, path: &str, form: &[(String, String)]) -> Result<Response, TransportError> {
        self.send(Method::POST, path, form).await
    }

    /// PUT `form` as a urlencoded body.
    pub async fn put_form(&self, path: &str, form: &[(String, String)]) -> Result<Response, TransportError> {
        self.send(Method::PUT, path, form).await
    }

    /// DELETE `path` with `query` appended to the URL.
    pub async fn delete(&self, path: &str, query: &[(String, String)]) -> Result<Response, TransportError> {
        self.send(Method::DELETE, path, query).await
    }

    /// Issue one logical call, applying throttling, the breaker and retries.
    ///
    /// `params` travel in the query string for GET and DELETE and as a
    /// form-encoded body for POST and PUT.
    #[instrument(skip(self, params))]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Response, TransportError> {
        let mut retry: u32 = 0;

        loop {
            self.wait_for_rate_limit().await;

            let request = self.build_request(&method, path, params)?;

            // Held across the request so a cancelled probe reopens the circuit.
            let permit = if self.config.enable_circuit_breaker {
                match self.circuit_breaker.try_acquire() {
                    Some(permit) => Some(permit),
                    None => {
                        let retry_at = self.circuit_breaker.reset_time();
                        warn!(?retry_at, "Circuit open; failing fast");
                        return Err(TransportError::CircuitOpen { retry_at });
                    }
                }
            } else {
                None
            };
            debug!(attempt = retry + 1, url = %request.url(), "sending HTTP request");

            let response = match self.client.execute(request).await {
                Ok(response) => response,
                Err(err) => {
                    let error = TransportError::from_reqwest(err, self.config.timeout());
                    if let Some(permit) = permit {
                        permit.fail();
                    }
                    if retry < self.config.max_retries {
                        let delay = backoff_delay(self.config.base_retry_delay(), retry);
                        warn!(attempt = retry + 1, error = %error, delay_ms = delay.as_millis() as u64, "HTTP request failed; retrying");
                        tokio::time::sleep(delay).await;
                        retry += 1;
                        continue;
                    }
                    warn!(attempts = retry + 1, error = %error, "HTTP request failed; retries exhausted");
                    return Err(error);
                }
            };

            let status = response.status();
            debug!(attempt = retry + 1, %status, "received HTTP response");
            self.record_rate_limit(&response);

            if let Some(permit) = permit {
                if status.is_server_error() {
                    permit.fail();
                } else {
                    permit.succeed();
                }
            }

            if status == StatusCode::TOO_MANY_REQUESTS && retry < self.config.max_retries {
                let delay = retry_after(&response)
                    .unwrap_or_else(|| backoff_delay(self.config.base_retry_delay(), retry));
                info!(attempt = retry + 1, delay_ms = delay.as_millis() as u64, "Throttled by server; retrying");
                tokio::time::sleep(delay).await;
                retry += 1;
                continue;
            }

            return Ok(response);
        }
    }

    async fn wait_for_rate_limit(&self) {
        if !self.config.enable_throttling {
            return;
        }
        let Some(wait) = self.rate_limit.pending_wait(Utc::now()) else {
            return;
        };
        info!(wait_ms = wait.as_millis() as u64, "Rate limit exhausted; waiting for reset");
        self.rate_limit.set_throttled(true);
        tokio::time::sleep(wait).await;
        self.rate_limit.set_throttled(false);
    }

    fn record_rate_limit(&self, response: &Response) {
        let headers = response.headers();
        self.rate_limit.update_from_headers(
            |name| headers.get(name).and_then(|value| value.to_str().ok()).map(str::to_owned),
            Utc::now(),
        );
    }

    fn build_request(
        &self,
        method: &Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<Request, TransportError> {
        let settings = self.settings.read().clone();
        let mut url = join_url(&settings.base_url, path)?;

        let sends_form = *method == Method::POST || *method == Method::PUT;
        if !sends_form && !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        let mut builder = self.client.request(method.clone(), url).header(ACCEPT, "application/json");
        if sends_form {
            builder = builder.form(params);
        }
        if let Some(authorization) = settings.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }
        if !settings.api_version.is_empty() {
            builder = builder.header(API_VERSION_HEADER, settings.api_version);
        }

        builder.build().map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }

    /// Single attempt that bypasses throttling, the breaker and retries.
    async fn probe(&self, path: &str) -> Result<StatusCode, TransportError> {
        let request = self.build_request(&Method::GET, path, &[])?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| TransportError::from_reqwest(e, self.config.timeout()))?;
        Ok(response.status())
    }

    // ------------------------------------------------------------------
    // Authentication and request settings
    // ------------------------------------------------------------------

    /// Send HTTP Basic credentials on every subsequent request.
    pub fn set_basic_auth(&self, username: &str, password: &str) {
        let encoded = STANDARD.encode(format!("{username}:{password}"));
        self.settings.write().authorization = Some(format!("Basic {encoded}"));
    }

    /// Send a bearer token on every subsequent request, replacing any Basic credentials.
    pub fn set_bearer_token(&self, token: &str) {
        self.settings.write().authorization = Some(format!("Bearer {token}"));
    }

    /// Stop sending an `Authorization` header.
    pub fn clear_auth(&self) {
        self.settings.write().authorization = None;
    }

    /// Point subsequent requests at another server. The URL is checked when a request is built.
    pub fn set_base_url(&self, base_url: impl Into<String>) {
        self.settings.write().base_url = base_url.into();
    }

    /// Version string sent in the API version header.
    pub fn set_api_version(&self, api_version: impl Into<String>) {
        self.settings.write().api_version = api_version.into();
    }

    pub fn base_url(&self) -> String {
        self.settings.read().base_url.clone()
    }

    /// Largest response body callers should accept.
    pub fn max_response_bytes(&self) -> u64 {
        self.config.max_response_bytes
    }

    // ------------------------------------------------------------------
    // Probes
    // ------------------------------------------------------------------

    /// Call the identity endpoint. A 2xx or 401 means the service is up.
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> bool {
        let healthy = match self.probe(IDENTITY_ENDPOINT).await {
            Ok(status) => status.is_success() || status == StatusCode::UNAUTHORIZED,
            Err(err) => {
                debug!(error = %err, "Health probe failed");
                false
            }
        };
        *self.health.write() = Some(HealthStatus { healthy, checked_at: Utc::now() });
        info!(healthy, "remote_health_checked");
        healthy
    }

    /// Result of the most recent health check, if any.
    pub fn last_health(&self) -> Option<HealthStatus> {
        *self.health.read()
    }

    /// Whether the server exposes `feature`, probed once via `path`.
    ///
    /// A 2xx or 404 counts as supported. Answers are memoized until
    /// [`clear_feature_cache`](Self::clear_feature_cache); transport failures
    /// are not.
    pub async fn is_feature_supported(&self, feature: &str, path: &str) -> bool {
        if let Some(supported) = self.features.get(feature) {
            return *supported;
        }

        match self.probe(path).await {
            Ok(status) => {
                let supported = status.is_success() || status == StatusCode::NOT_FOUND;
                debug!(feature, %status, supported, "Feature probe completed");
                self.features.insert(feature.to_string(), supported);
                supported
            }
            Err(err) => {
                debug!(feature, error = %err, "Feature probe failed");
                false
            }
        }
    }

    pub fn clear_feature_cache(&self) {
        self.features.clear();
    }

    /// True when the response does not advertise more than `max_bytes`.
    /// A response without a content length passes.
    pub fn is_payload_within_limit(response: &Response, max_bytes: u64) -> bool {
        response.content_length().map_or(true, |length| length <= max_bytes)
    }

    // ------------------------------------------------------------------
    // State snapshots
    // ------------------------------------------------------------------

    /// Quota figures parsed from the latest response headers.
    pub fn rate_limit_info(&self) -> RateLimitInfo {
        self.rate_limit.snapshot()
    }

    /// Snapshot of the breaker for diagnostics.
    pub fn circuit_breaker_state(&self) -> CircuitBreakerState {
        self.circuit_breaker.snapshot()
    }

    /// Force the breaker closed, discarding recorded failures.
    pub fn reset_circuit_breaker(&self) {
        self.circuit_breaker.reset();
    }
}

#[async_trait]
impl RemoteHealthProbe for ResilientTransport {
    /// Reuses a recent probe answer, probing again once it is stale.
    async fn is_healthy(&self) -> bool {
        let cached = self.last_health().filter(|status| {
            Utc::now() - status.checked_at < chrono::Duration::seconds(HEALTH_CACHE_SECONDS)
        });
        match cached {
            Some(status) => status.healthy,
            None => self.check_health().await,
        }
    }
}

fn join_url(base_url: &str, path: &str) -> Result<Url, TransportError> {
    let joined = format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'));
    Url::parse(&joined).map_err(|e| TransportError::InvalidRequest(format!("invalid URL {joined}: {e}")))
}

fn retry_after(response: &Response) -> Option<Duration> {
    let value = response.headers().get(RETRY_AFTER)?.to_str().ok()?;
    parse_retry_after(value, Utc::now())
}
