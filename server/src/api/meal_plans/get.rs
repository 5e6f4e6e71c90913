use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::store::PgStore;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use seasonal_core::{MealPlanRecord, MealPlanStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/meal-plans/{id}",
    tag = "meal_plans",
    params(("id" = Uuid, Path, description = "Meal plan ID")),
    responses(
        (status = 200, description = "The saved meal plan with its content", body = MealPlanRecord),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "Meal plan not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_meal_plan(
    AuthUser(user): AuthUser,
    State(store): State<Arc<PgStore>>,
    Path(id): Path<Uuid>,
) -> impl IntoResponse {
    match store.get_meal_plan(user.id, id).await {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(StoreError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("Meal plan not found")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch meal plan {}: {}", id, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch meal plan")),
            )
                .into_response()
        }
    }
}
