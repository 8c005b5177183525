// Billing-sensitive demo surface; the real billing provider sits elsewhere
use axum::Extension;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::auth::AuthContext;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub org_id: String,
    pub plan: String,
    pub status: String,
    pub seats: u32,
    pub current_period_end: DateTime<Utc>,
}

/// GET /billing/subscription - current subscription for the caller's org
pub async fn subscription_show(
    Extension(context): Extension<AuthContext>,
) -> ApiResult<Subscription> {
    Ok(ApiResponse::success(Subscription {
        org_id: context.org_id,
        plan: "pro".to_string(),
        status: "active".to_string(),
        seats: 5,
        current_period_end: Utc::now() + Duration::days(30),
    }))
}
