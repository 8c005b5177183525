use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::rate_limit::{is_rate_limited, rate_limit_headers};
use crate::state::AppState;

/// Rate-limit middleware: counts the request against its tenant +
/// endpoint-class window, rejects with 429 once the window is exhausted, and
/// advertises the limit state on every response.
///
/// Requires the auth middleware to have run first; a missing context is an
/// internal error, never a silent pass.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = request.extensions().get::<AuthContext>().cloned().ok_or_else(|| {
        tracing::error!("auth context missing before rate limiting");
        ApiError::internal_error()
    })?;

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let info = state.rate_limiter.check(&method, &path, &context.org_id).await?;
    let headers = rate_limit_headers(&info);

    if is_rate_limited(&info) {
        tracing::warn!(
            org_id = %context.org_id,
            method = %method,
            path = %path,
            retry_after = ?info.retry_after,
            "rate limit exceeded"
        );
        let mut response = ApiError::rate_limit_exceeded().into_response();
        response.headers_mut().extend(headers);
        return Ok(response);
    }

    let mut response = next.run(request).await;
    response.headers_mut().extend(headers);
    Ok(response)
}
