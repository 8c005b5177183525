pub mod auth;
pub mod idempotency;
pub mod rate_limit;
pub mod response;

pub use auth::auth_middleware;
pub use idempotency::idempotency_middleware;
pub use rate_limit::rate_limit_middleware;
pub use response::{ApiResponse, ApiResult};
