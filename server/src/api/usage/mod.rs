pub mod get;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/usage (mounted at /api/usage)
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get::get_usage))
}

#[derive(OpenApi)]
#[openapi(paths(get::get_usage), components(schemas(seasonal_core::UsageStats)))]
pub struct ApiDoc;
