use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::quota::PgQuotaLedger;
use crate::store::PgStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use seasonal_core::{QuotaLedger, UsageStats};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/usage",
    tag = "usage",
    responses(
        (status = 200, description = "Generation allowance and account summary", body = UsageStats),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_usage(
    AuthUser(user): AuthUser,
    State(quota): State<Arc<PgQuotaLedger>>,
    State(store): State<Arc<PgStore>>,
) -> impl IntoResponse {
    let record = match quota.usage(user.id).await {
        Ok(r) => r,
        Err(e) => {
            tracing::error!("Failed to read quota for {}: {}", user.id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch usage")),
            )
                .into_response();
        }
    };

    let total_meal_plans = match store.count_meal_plans(user.id).await {
        Ok(n) => n,
        Err(e) => {
            tracing::error!("Failed to count meal plans for {}: {}", user.id, e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch usage")),
            )
                .into_response();
        }
    };

    let stats = UsageStats::new(&record, user.created_at, total_meal_plans);
    (StatusCode::OK, Json(stats)).into_response()
}
