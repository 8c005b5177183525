// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// Catalog of client-facing error codes. Every failure surfaced by the API
/// maps to exactly one of these, with a fixed status and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    MissingToken,
    InvalidToken,
    MissingOrgId,
    OrgAccessDenied,
    InvalidRequest,
    ResourceNotFound,
    RateLimitExceeded,
    IdempotencyConflict,
    IdempotencyKeyReused,
    InternalError,
}

impl ErrorCode {
    /// Wire-format code string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "MISSING_TOKEN",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::MissingOrgId => "MISSING_ORG_ID",
            ErrorCode::OrgAccessDenied => "ORG_ACCESS_DENIED",
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            ErrorCode::IdempotencyConflict => "IDEMPOTENCY_CONFLICT",
            ErrorCode::IdempotencyKeyReused => "IDEMPOTENCY_KEY_REUSED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorCode::MissingToken => 401,
            ErrorCode::InvalidToken => 401,
            ErrorCode::MissingOrgId => 400,
            ErrorCode::OrgAccessDenied => 403,
            ErrorCode::InvalidRequest => 400,
            ErrorCode::ResourceNotFound => 404,
            ErrorCode::RateLimitExceeded => 429,
            ErrorCode::IdempotencyConflict => 409,
            ErrorCode::IdempotencyKeyReused => 422,
            ErrorCode::InternalError => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::MissingToken => "Missing bearer token",
            ErrorCode::InvalidToken => "Invalid or expired token",
            ErrorCode::MissingOrgId => "Missing X-Org-ID header",
            ErrorCode::OrgAccessDenied => "You do not have access to this organization",
            ErrorCode::InvalidRequest => "Request validation failed",
            ErrorCode::ResourceNotFound => "Resource not found",
            ErrorCode::RateLimitExceeded => "Rate limit exceeded",
            ErrorCode::IdempotencyConflict => {
                "A request with this idempotency key is still in flight"
            }
            ErrorCode::IdempotencyKeyReused => {
                "Idempotency key was reused with a different request payload"
            }
            ErrorCode::InternalError => "An internal error occurred",
        }
    }
}

/// HTTP API error with catalog-driven status codes and client-friendly messages
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub detail: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode) -> Self {
        Self { code, detail: None }
    }

    pub fn with_detail(code: ErrorCode, detail: Value) -> Self {
        Self { code, detail: Some(detail) }
    }

    pub fn missing_token() -> Self {
        Self::new(ErrorCode::MissingToken)
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorCode::InvalidToken)
    }

    pub fn missing_org_id() -> Self {
        Self::new(ErrorCode::MissingOrgId)
    }

    pub fn org_access_denied() -> Self {
        Self::new(ErrorCode::OrgAccessDenied)
    }

    pub fn invalid_request(detail: Value) -> Self {
        Self::with_detail(ErrorCode::InvalidRequest, detail)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::with_detail(ErrorCode::ResourceNotFound, json!({ "resource": resource.into() }))
    }

    pub fn rate_limit_exceeded() -> Self {
        Self::new(ErrorCode::RateLimitExceeded)
    }

    pub fn idempotency_conflict() -> Self {
        Self::new(ErrorCode::IdempotencyConflict)
    }

    pub fn idempotency_key_reused() -> Self {
        Self::new(ErrorCode::IdempotencyKeyReused)
    }

    /// Internal failures never leak their cause to the client; log at the
    /// call site instead.
    pub fn internal_error() -> Self {
        Self::new(ErrorCode::InternalError)
    }

    pub fn status_code(&self) -> u16 {
        self.code.status_code()
    }

    pub fn message(&self) -> &'static str {
        self.code.message()
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut error = json!({
            "code": self.code.as_str(),
            "message": self.code.message(),
        });

        if let Some(detail) = &self.detail {
            error["detail"] = detail.clone();
        }

        json!({ "error": error })
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.code.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
