use super::bad_body;
use crate::api::{generation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use seasonal_core::{GenerationOrchestrator, PdfStatus, Recipe, RecipeRequest};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRecipeResponse {
    #[serde(flatten)]
    pub recipe: Recipe,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub pdf_status: PdfStatus,
}

#[utoipa::path(
    post,
    path = "/api/ai/generate-recipe",
    tag = "generation",
    request_body(content = RecipeRequest, example = json!({
        "dietaryRestrictions": ["vegetarian"],
        "preferences": ["quick"],
        "seasonalIngredients": ["butternut squash", "sage"],
        "mealType": "dinner",
        "servings": 4
    })),
    responses(
        (status = 200, description = "Generated recipe", body = GenerateRecipeResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Monthly free limit reached", body = ErrorResponse),
        (status = 429, description = "Model provider rate limit", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_recipe(
    auth: AuthUser,
    State(orchestrator): State<Arc<GenerationOrchestrator>>,
    payload: Result<Json<RecipeRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };

    match orchestrator.generate_recipe(auth.caller(), &request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(GenerateRecipeResponse {
                recipe: outcome.recipe,
                pdf_url: outcome.pdf_url,
                pdf_status: outcome.pdf_status,
            }),
        )
            .into_response(),
        Err(e) => generation_error_response(&e),
    }
}
