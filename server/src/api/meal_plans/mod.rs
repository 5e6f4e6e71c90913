pub mod get;
pub mod list;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/meal-plans endpoints (mounted at /api/meal-plans)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_meal_plans))
        .route("/{id}", get(get::get_meal_plan))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_meal_plans, get::get_meal_plan),
    components(schemas(
        list::MealPlanSummary,
        list::MealPlanListResponse,
        seasonal_core::MealPlanRecord,
    ))
)]
pub struct ApiDoc;
