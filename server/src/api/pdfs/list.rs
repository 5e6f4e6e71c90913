use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::store::PgStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use seasonal_core::{ArtifactDocument, DocumentStore};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PdfListResponse {
    pub pdfs: Vec<ArtifactDocument>,
}

#[utoipa::path(
    get,
    path = "/api/pdfs",
    tag = "pdfs",
    responses(
        (status = 200, description = "The caller's rendered documents, newest first", body = PdfListResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_pdfs(
    AuthUser(user): AuthUser,
    State(store): State<Arc<PgStore>>,
) -> impl IntoResponse {
    match store.list_documents(user.id).await {
        Ok(pdfs) => (StatusCode::OK, Json(PdfListResponse { pdfs })).into_response(),
        Err(e) => {
            tracing::error!("Failed to list documents: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("An error occurred while listing PDFs.")),
            )
                .into_response()
        }
    }
}
