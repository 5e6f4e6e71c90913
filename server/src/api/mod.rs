pub mod generate;
pub mod meal_plans;
pub mod pdfs;
pub mod public;
pub mod testing;
pub mod usage;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use seasonal_core::GenerationError;
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    /// Set when the feature needs a premium subscription.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_required: Option<bool>,
    /// Set when the monthly free allowance is used up.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit_reached: Option<bool>,
    /// Set when the model provider is rate limiting us.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_limited: Option<bool>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::default()
        }
    }
}

impl From<&GenerationError> for ErrorResponse {
    fn from(e: &GenerationError) -> Self {
        Self {
            error: e.to_string(),
            premium_required: e.premium_required().then_some(true),
            limit_reached: e.limit_reached().then_some(true),
            rate_limited: e.rate_limited().then_some(true),
        }
    }
}

/// Map a pipeline failure to its status code and JSON body.
pub fn generation_error_response(e: &GenerationError) -> Response {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %e, "Generation failed");
    } else {
        tracing::info!(status = status.as_u16(), error = %e, "Generation rejected");
    }
    (status, Json(ErrorResponse::from(e))).into_response()
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Seasonally Simple API"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    // Add security scheme
    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        testing::ApiDoc::openapi(),
        generate::ApiDoc::openapi(),
        pdfs::ApiDoc::openapi(),
        meal_plans::ApiDoc::openapi(),
        usage::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
