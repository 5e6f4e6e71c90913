pub mod meal_plan;
pub mod recipe;

use crate::api::ErrorResponse;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use utoipa::OpenApi;

/// Returns the router for /api/ai endpoints (mounted at /api/ai)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/generate-recipe", post(recipe::generate_recipe))
        .route("/generate-meal-plan", post(meal_plan::generate_meal_plan))
}

/// Unparseable request bodies are a client error, reported in the usual error shape.
fn bad_body(rejection: JsonRejection) -> Response {
    tracing::info!(error = %rejection.body_text(), "Rejected generation request body");
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(format!(
            "Invalid request body: {}",
            rejection.body_text()
        ))),
    )
        .into_response()
}

#[derive(OpenApi)]
#[openapi(
    paths(recipe::generate_recipe, meal_plan::generate_meal_plan),
    components(schemas(
        recipe::GenerateRecipeResponse,
        meal_plan::GenerateMealPlanResponse,
        seasonal_core::RecipeRequest,
        seasonal_core::MealPlanRequest,
        seasonal_core::Recipe,
        seasonal_core::MealPlan,
        seasonal_core::Nutrition,
        seasonal_core::PdfStatus,
    ))
)]
pub struct ApiDoc;
