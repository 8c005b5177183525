// Idempotency-key deduplication for mutating requests
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::Utc;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Client-supplied deduplication header
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Extract the Idempotency-Key header, `None` when absent or empty
pub fn extract_idempotency_key(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(IDEMPOTENCY_KEY_HEADER)?.to_str().ok()?;
    if value.is_empty() {
        return None;
    }
    Some(value.to_string())
}

// Canonical form of the request body: JSON is re-serialized with sorted
// object keys so semantically identical payloads hash identically;
// non-JSON bodies hash as raw bytes.
fn canonicalize_body(body: &[u8]) -> Vec<u8> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_vec(&value).unwrap_or_else(|_| body.to_vec()),
        Err(_) => body.to_vec(),
    }
}

fn hash_request(method: &str, path: &str, tenant_id: &str, user_id: &str, body: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(path.as_bytes());
    hasher.update(b"\n");
    hasher.update(tenant_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(user_id.as_bytes());
    hasher.update(b"\n");
    hasher.update(canonicalize_body(body));
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Server-derived idempotency key for clients that did not send one.
///
/// Pure and deterministic: identical inputs always produce the identical key,
/// across processes and time, with no randomness involved.
pub fn generate_idempotency_key(
    method: &str,
    path: &str,
    tenant_id: &str,
    user_id: &str,
    body: &[u8],
) -> String {
    format!("idem_{}", &hash_request(method, path, tenant_id, user_id, body)[..32])
}

/// Full digest over the same canonical inputs; detects a client-supplied key
/// reused with a different payload.
pub fn request_fingerprint(
    method: &str,
    path: &str,
    tenant_id: &str,
    user_id: &str,
    body: &[u8],
) -> String {
    hash_request(method, path, tenant_id, user_id, body)
}

/// Response captured for replay, byte-for-byte
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Result of an atomic check-and-claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    /// No live record existed; the caller now holds the claim and must run
    /// the handler, then `complete` or `release` the key.
    Claimed,
    /// Another caller holds the claim and has not finished yet
    InFlight,
    /// A completed record exists; replay this response verbatim
    Completed(StoredResponse),
    /// The key exists but was recorded for a different request payload
    Mismatch,
}

#[derive(Debug, Error)]
pub enum IdempotencyError {
    #[error("idempotency store unavailable: {0}")]
    Unavailable(String),
}

/// Shared idempotency record store. `try_claim` must be atomic so two
/// concurrent requests for one key cannot both believe they are first.
/// Records lapse after their TTL in either status, so an abandoned in-flight
/// claim never blocks retries forever.
#[async_trait]
pub trait IdempotencyStore: Send + Sync {
    async fn try_claim(
        &self,
        key: &str,
        fingerprint: &str,
        ttl: Duration,
    ) -> Result<ClaimOutcome, IdempotencyError>;

    async fn complete(&self, key: &str, response: StoredResponse)
        -> Result<(), IdempotencyError>;

    /// Drop an in-flight claim early (e.g. the handler failed and the
    /// operation should be retryable immediately).
    async fn release(&self, key: &str) -> Result<(), IdempotencyError>;
}

#[derive(Debug, Clone)]
enum RecordState {
    InFlight,
    Complete(StoredResponse),
}

#[derive(Debug)]
struct IdempotencyRecord {
    fingerprint: String,
    state: RecordState,
    created_at_ms: i64,
    ttl_ms: u64,
}

impl IdempotencyRecord {
    fn expired_at(&self, now_ms: i64) -> bool {
        now_ms >= self.created_at_ms + self.ttl_ms as i64
    }
}

/// Mutex-guarded in-process record map for single-instance and test use.
/// Expired records are evicted lazily on the next claim for their key.
#[derive(Debug, Default)]
pub struct InMemoryIdempotencyStore {
    records: Mutex<HashMap<String, IdempotencyRecord>>,
}

impl InMemoryIdempotencyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn claim_at(&self, key: &str, fingerprint: &str, ttl: Duration, now_ms: i64) -> ClaimOutcome {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(record) = records.get(key) {
            if record.expired_at(now_ms) {
                records.remove(key);
            } else if record.fingerprint != fingerprint {
                return ClaimOutcome::Mismatch;
            } else {
                return match &record.state {
                    RecordState::InFlight => ClaimOutcome::InFlight,
                    RecordState::Complete(response) => ClaimOutcome::Completed(response.clone()),
                };
            }
        }

        records.insert(
            key.to_string(),
            IdempotencyRecord {
                fingerprint: fingerprint.to_string(),
                state: RecordState::InFlight,
                created_at_ms: now_ms,
                ttl_ms: ttl.as_millis() as u64,
            },
        );
        ClaimOutcome::Claimed
    }

    fn complete_now(&self, key: &str, response: StoredResponse) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(record) = records.get_mut(key) {
            record.state = RecordState::Complete(response);
        }
    }

    fn release_now(&self, key: &str) {
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        records.remove(key);
    }
}

#[async_trait]
impl IdempotencyStore for InMemoryIdempotencyStore {
    async fn try_claim(
        &self,
        key: &str,
        fingerprint: &str,
        ttl: Duration,
    ) -> Result<ClaimOutcome, IdempotencyError> {
        Ok(self.claim_at(key, fingerprint, ttl, Utc::now().timestamp_millis()))
    }

    async fn complete(
        &self,
        key: &str,
        response: StoredResponse,
    ) -> Result<(), IdempotencyError> {
        self.complete_now(key, response);
        Ok(())
    }

    async fn release(&self, key: &str) -> Result<(), IdempotencyError> {
        self.release_now(key);
        Ok(())
    }
}
