pub mod billing;
pub mod health;
pub mod records;

use crate::error::ApiError;

/// Router fallback: anything unrouted maps to the catalog, not a bare 404
pub async fn not_found() -> ApiError {
    ApiError::not_found("route")
}
