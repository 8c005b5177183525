pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod idempotency;
pub mod middleware;
pub mod pagination;
pub mod rate_limit;
pub mod state;
pub mod validation;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

/// Build the application router: demo handlers behind the pipeline, a public
/// health check outside it, and a catalog-shaped fallback.
///
/// Stage order is fixed: auth resolves first, then the rate-limit gate, then
/// the idempotency check for mutating methods. Validation and pagination run
/// inside the handlers. Rejected traffic never reaches a later stage, so an
/// unauthenticated request consumes no counter or idempotency state.
pub fn app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/records",
            get(handlers::records::records_list).post(handlers::records::records_create),
        )
        .route("/records/:id", get(handlers::records::records_show))
        .route("/billing/subscription", get(handlers::billing::subscription_show))
        // layers run outermost-last: auth wraps rate limiting wraps idempotency
        .layer(from_fn_with_state(state.clone(), middleware::idempotency_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::rate_limit_middleware))
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state);

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .merge(protected)
        .fallback(handlers::not_found);

    let app = if config::config().api.enable_cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    };

    app.layer(TraceLayer::new_for_http())
}
