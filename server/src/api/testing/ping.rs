use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use axum::{response::IntoResponse, Json};
use seasonal_core::SubscriptionTier;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PingResponse {
    pub message: String,
    pub tier: SubscriptionTier,
}

#[utoipa::path(
    get,
    path = "/api/test/ping",
    tag = "testing",
    responses(
        (status = 200, description = "Authenticated ping response", body = PingResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn ping(auth: AuthUser) -> impl IntoResponse {
    Json(PingResponse {
        message: format!("ping from {}", auth.0.username),
        tier: auth.caller().tier,
    })
}
