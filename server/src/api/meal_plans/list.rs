use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::store::PgStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, NaiveDate, Utc};
use seasonal_core::{MealPlanRecord, MealPlanStore};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// A saved meal plan without its full content.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub seasonal_focus: String,
    pub servings_per_meal: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MealPlanRecord> for MealPlanSummary {
    fn from(record: MealPlanRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            seasonal_focus: record.seasonal_focus,
            servings_per_meal: record.servings_per_meal,
            start_date: record.start_date,
            end_date: record.end_date,
            pdf_url: record.pdf_url,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealPlanListResponse {
    pub meal_plans: Vec<MealPlanSummary>,
}

#[utoipa::path(
    get,
    path = "/api/meal-plans",
    tag = "meal_plans",
    responses(
        (status = 200, description = "The caller's saved meal plans, newest first", body = MealPlanListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_meal_plans(
    AuthUser(user): AuthUser,
    State(store): State<Arc<PgStore>>,
) -> impl IntoResponse {
    match store.list_meal_plans(user.id).await {
        Ok(records) => {
            let meal_plans = records.into_iter().map(MealPlanSummary::from).collect();
            (StatusCode::OK, Json(MealPlanListResponse { meal_plans })).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to fetch meal plans: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to fetch meal plans")),
            )
                .into_response()
        }
    }
}
