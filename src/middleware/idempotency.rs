use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use serde_json::json;

use crate::auth::AuthContext;
use crate::config;
use crate::error::ApiError;
use crate::idempotency::{
    extract_idempotency_key, generate_idempotency_key, request_fingerprint, ClaimOutcome,
    StoredResponse,
};
use crate::state::AppState;

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH | Method::DELETE)
}

/// Idempotency middleware for mutating methods.
///
/// Uses the client's `Idempotency-Key` when present, otherwise derives a
/// deterministic key from the request itself. A completed record replays its
/// stored response verbatim without running the handler; a key still in
/// flight is rejected with 409 and the client retries; a key reused with a
/// different payload is rejected with 422. Responses below 500 are stored for
/// replay, 5xx releases the claim so a transient failure never blocks the
/// operation for the record TTL.
pub async fn idempotency_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !is_mutating(request.method()) {
        return Ok(next.run(request).await);
    }

    let context = request.extensions().get::<AuthContext>().cloned().ok_or_else(|| {
        tracing::error!("auth context missing before idempotency check");
        ApiError::internal_error()
    })?;

    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();
    let client_key = extract_idempotency_key(request.headers());

    // Key derivation and fingerprinting need the body, so buffer it up front
    // and hand the handler a rebuilt request.
    let (parts, body) = request.into_parts();
    let max_size = config::config().api.max_request_size_bytes;
    let body_bytes = to_bytes(body, max_size).await.map_err(|e| {
        tracing::warn!("failed to buffer request body: {}", e);
        ApiError::invalid_request(json!({
            "fields": { "body": ["request body is unreadable or exceeds the maximum size"] }
        }))
    })?;

    let fingerprint =
        request_fingerprint(&method, &path, &context.org_id, &context.user.id, &body_bytes);
    let key = client_key.unwrap_or_else(|| {
        generate_idempotency_key(&method, &path, &context.org_id, &context.user.id, &body_bytes)
    });
    let ttl = Duration::from_secs(config::config().idempotency.ttl_secs);

    let outcome = state.idempotency.try_claim(&key, &fingerprint, ttl).await.map_err(|e| {
        tracing::error!("idempotency store error: {}", e);
        ApiError::internal_error()
    })?;

    match outcome {
        ClaimOutcome::Completed(stored) => {
            tracing::debug!(key = %key, "replaying stored idempotent response");
            return Ok(replay_response(stored));
        }
        ClaimOutcome::InFlight => {
            tracing::warn!(key = %key, "idempotency key still in flight");
            return Err(ApiError::idempotency_conflict());
        }
        ClaimOutcome::Mismatch => {
            tracing::warn!(key = %key, "idempotency key reused with different payload");
            return Err(ApiError::idempotency_key_reused());
        }
        ClaimOutcome::Claimed => {}
    }

    let request = Request::from_parts(parts, Body::from(body_bytes));
    let response = next.run(request).await;

    // Buffer the response so it can be stored for replay.
    let (parts, body) = response.into_parts();
    let response_bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("failed to buffer response body: {}", e);
            let _ = state.idempotency.release(&key).await;
            return Err(ApiError::internal_error());
        }
    };

    if parts.status.as_u16() < 500 {
        let stored =
            StoredResponse { status: parts.status.as_u16(), body: response_bytes.to_vec() };
        if let Err(e) = state.idempotency.complete(&key, stored).await {
            tracing::error!("failed to complete idempotency record: {}", e);
        }
    } else if let Err(e) = state.idempotency.release(&key).await {
        tracing::error!("failed to release idempotency claim: {}", e);
    }

    Ok(Response::from_parts(parts, Body::from(response_bytes)))
}

fn replay_response(stored: StoredResponse) -> Response {
    let status = StatusCode::from_u16(stored.status).unwrap_or(StatusCode::OK);
    let mut response = Response::new(Body::from(stored.body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
