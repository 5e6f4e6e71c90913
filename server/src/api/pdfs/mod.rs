pub mod cleanup;
pub mod list;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/pdfs endpoints (mounted at /api/pdfs)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_pdfs))
        .route("/cleanup", post(cleanup::cleanup_pdfs))
}

#[derive(OpenApi)]
#[openapi(
    paths(list::list_pdfs, cleanup::cleanup_pdfs),
    components(schemas(
        list::PdfListResponse,
        cleanup::CleanupRequest,
        cleanup::CleanupResponse,
        seasonal_core::ArtifactDocument,
        seasonal_core::ArtifactKind,
    ))
)]
pub struct ApiDoc;
