use super::bad_body;
use crate::api::{generation_error_response, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use seasonal_core::{GenerationOrchestrator, MealPlan, MealPlanRequest, PdfStatus};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateMealPlanResponse {
    #[serde(flatten)]
    pub meal_plan: MealPlan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
    pub pdf_status: PdfStatus,
    pub meal_plan_id: Uuid,
}

#[utoipa::path(
    post,
    path = "/api/ai/generate-meal-plan",
    tag = "generation",
    request_body(content = MealPlanRequest, example = json!({
        "dietaryRestrictions": [],
        "preferences": ["kid friendly"],
        "seasonalFocus": "Autumn",
        "servingsPerMeal": 4,
        "budget": "moderate"
    })),
    responses(
        (status = 200, description = "Generated and saved meal plan", body = GenerateMealPlanResponse),
        (status = 400, description = "Missing or invalid parameters", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Premium subscription required", body = ErrorResponse),
        (status = 429, description = "Model provider rate limit", body = ErrorResponse),
        (status = 500, description = "Generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn generate_meal_plan(
    auth: AuthUser,
    State(orchestrator): State<Arc<GenerationOrchestrator>>,
    payload: Result<Json<MealPlanRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(p) => p,
        Err(rejection) => return bad_body(rejection),
    };

    match orchestrator.generate_meal_plan(auth.caller(), &request).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(GenerateMealPlanResponse {
                meal_plan: outcome.meal_plan,
                pdf_url: outcome.pdf_url,
                pdf_status: outcome.pdf_status,
                meal_plan_id: outcome.meal_plan_id,
            }),
        )
            .into_response(),
        Err(e) => generation_error_response(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seasonal_core::generation::parse_meal_plan;
    use seasonal_core::llm::sample_meal_plan_json;

    #[test]
    fn test_meal_plan_fields_sit_beside_id_and_status() {
        let id = Uuid::new_v4();
        let json = serde_json::to_value(GenerateMealPlanResponse {
            meal_plan: parse_meal_plan(&sample_meal_plan_json()).unwrap(),
            pdf_url: None,
            pdf_status: PdfStatus::Failed,
            meal_plan_id: id,
        })
        .unwrap();

        assert_eq!(json["meals"].as_array().unwrap().len(), 5);
        assert!(json["shoppingList"].is_array());
        assert!(json.get("mealPlan").is_none());
        assert!(json.get("pdfUrl").is_none());
        assert_eq!(json["pdfStatus"], "failed");
        assert_eq!(json["mealPlanId"], id.to_string());
    }
}
