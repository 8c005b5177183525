use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

/// Authentication middleware: resolves the bearer token and tenant header
/// into an [`AuthContext`](crate::auth::AuthContext) and injects it as a
/// request extension.
///
/// Outermost stage of the pipeline: nothing downstream (rate limiting,
/// idempotency, handlers) runs for unauthenticated traffic, so rejected
/// requests consume no counter or idempotency state.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let context = state.auth.authenticate(request.headers()).await.map_err(|e| {
        tracing::warn!(
            method = %request.method(),
            path = %request.uri().path(),
            code = e.code.as_str(),
            "authentication failed"
        );
        e
    })?;

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
