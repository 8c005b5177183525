// Per-tenant, per-endpoint-class fixed-window rate limiting
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, Method};
use chrono::Utc;
use thiserror::Error;

use crate::config;
use crate::error::ApiError;

/// Endpoint classes with distinct ceilings. Mutations are classified before
/// path so a POST under /billing counts as a write, not a billing read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    Read,
    Write,
    BillingRead,
}

impl EndpointClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointClass::Read => "read",
            EndpointClass::Write => "write",
            EndpointClass::BillingRead => "billing-read",
        }
    }

    pub fn classify(method: &Method, path: &str) -> Self {
        match *method {
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE => EndpointClass::Write,
            _ if path.starts_with("/billing") => EndpointClass::BillingRead,
            _ => EndpointClass::Read,
        }
    }
}

impl std::fmt::Display for EndpointClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static per-class ceiling, derived from config at startup and read-only after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EndpointRateConfig {
    pub max_requests: u32,
    pub window_ms: u64,
}

/// Ceiling for the class a request falls into
pub fn config_for_endpoint(method: &Method, path: &str) -> EndpointRateConfig {
    let rl = &config::config().rate_limit;
    let max_requests = match EndpointClass::classify(method, path) {
        EndpointClass::Read => rl.read_max_requests,
        EndpointClass::Write => rl.write_max_requests,
        EndpointClass::BillingRead => rl.billing_read_max_requests,
    };
    EndpointRateConfig { max_requests, window_ms: rl.window_secs * 1000 }
}

/// Counter state after an increment
#[derive(Debug, Clone, Copy)]
pub struct CounterSnapshot {
    pub count: u32,
    pub window_start_ms: i64,
}

#[derive(Debug, Error)]
pub enum CounterError {
    #[error("counter store unavailable: {0}")]
    Unavailable(String),
}

/// Shared counter store. The single operation is an atomic read-and-increment
/// so two concurrent requests for the same key cannot both observe the count
/// before either bumps it. Distributed implementations plug in behind this
/// trait; the pipeline depends on nothing else.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn read_and_increment(
        &self,
        key: &str,
        window_ms: u64,
    ) -> Result<CounterSnapshot, CounterError>;
}

#[derive(Debug)]
struct WindowSlot {
    window_start_ms: i64,
    count: u32,
}

/// Mutex-guarded in-process counter map for single-instance and test use
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    windows: Mutex<HashMap<String, WindowSlot>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Clock-injected core so window expiry is testable without sleeping.
    fn increment_at(&self, key: &str, window_ms: u64, now_ms: i64) -> CounterSnapshot {
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let slot = windows
            .entry(key.to_string())
            .or_insert(WindowSlot { window_start_ms: now_ms, count: 0 });

        if now_ms >= slot.window_start_ms + window_ms as i64 {
            slot.window_start_ms = now_ms;
            slot.count = 0;
        }
        slot.count += 1;

        CounterSnapshot { count: slot.count, window_start_ms: slot.window_start_ms }
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn read_and_increment(
        &self,
        key: &str,
        window_ms: u64,
    ) -> Result<CounterSnapshot, CounterError> {
        Ok(self.increment_at(key, window_ms, Utc::now().timestamp_millis()))
    }
}

/// Limit state returned to the caller after a counter increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    pub limit: u32,
    pub remaining: u32,
    /// Epoch seconds at which the current window resets
    pub reset: i64,
    /// Seconds until reset, present only when the limit is exhausted
    pub retry_after: Option<u64>,
}

pub fn is_rate_limited(info: &RateLimitInfo) -> bool {
    info.remaining == 0
}

/// Headers advertised to clients: limit and remaining always, Retry-After
/// only once the window is exhausted.
pub fn rate_limit_headers(info: &RateLimitInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        "x-ratelimit-limit",
        HeaderValue::from_str(&info.limit.to_string()).unwrap_or(HeaderValue::from_static("0")),
    );
    headers.insert(
        "x-ratelimit-remaining",
        HeaderValue::from_str(&info.remaining.to_string())
            .unwrap_or(HeaderValue::from_static("0")),
    );
    if let Some(retry_after) = info.retry_after {
        headers.insert(
            "retry-after",
            HeaderValue::from_str(&retry_after.to_string())
                .unwrap_or(HeaderValue::from_static("1")),
        );
    }
    headers
}

/// Fixed-window limiter over a [`CounterStore`]. Window boundaries admit a
/// burst of up to twice the ceiling; acceptable for a dev-facing gateway.
pub struct RateLimiter {
    counters: Arc<dyn CounterStore>,
}

impl RateLimiter {
    pub fn new(counters: Arc<dyn CounterStore>) -> Self {
        Self { counters }
    }

    /// Count this request against its tenant + endpoint-class window and
    /// report the resulting limit state.
    pub async fn check(
        &self,
        method: &Method,
        path: &str,
        tenant_id: &str,
    ) -> Result<RateLimitInfo, ApiError> {
        let class = EndpointClass::classify(method, path);
        let endpoint = config_for_endpoint(method, path);
        let key = format!("{}:{}", tenant_id, class);

        let snapshot = self
            .counters
            .read_and_increment(&key, endpoint.window_ms)
            .await
            .map_err(|e| {
                tracing::error!("counter store error: {}", e);
                ApiError::internal_error()
            })?;

        let limit = endpoint.max_requests;
        let remaining = limit.saturating_sub(snapshot.count);
        let reset_ms = snapshot.window_start_ms + endpoint.window_ms as i64;
        let reset = reset_ms / 1000;

        let retry_after = if remaining == 0 {
            let until_reset_ms = (reset_ms - Utc::now().timestamp_millis()).max(0) as u64;
            // round up so clients never retry a second early
            Some((until_reset_ms + 999) / 1000)
        } else {
            None
        };

        Ok(RateLimitInfo { limit, remaining, reset, retry_after })
    }
}
