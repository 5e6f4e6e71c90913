use crate::api::ErrorResponse;
use crate::auth::AuthUser;
use crate::store::PgStore;
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use seasonal_core::{cleanup_expired, BlobStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    /// Must be the caller's own id when given.
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CleanupResponse {
    pub success: bool,
    pub deleted: usize,
    pub failed: usize,
}

/// Whose documents to clean up. An empty body means the caller's own; anything
/// else must parse, and a `userId` must be the caller.
fn cleanup_target(caller: Uuid, body: &[u8]) -> Result<Uuid, Response> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(caller);
    }

    let request: CleanupRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::info!(error = %e, "Rejected cleanup request body");
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!("Invalid request body: {}", e))),
        )
            .into_response()
    })?;

    match request.user_id {
        Some(id) if id != caller => Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new(
                "You can only clean up your own documents.",
            )),
        )
            .into_response()),
        _ => Ok(caller),
    }
}

#[utoipa::path(
    post,
    path = "/api/pdfs/cleanup",
    tag = "pdfs",
    request_body(content = CleanupRequest, example = json!({})),
    responses(
        (status = 200, description = "Expired documents removed", body = CleanupResponse),
        (status = 400, description = "Body is not a valid cleanup request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Cleanup requested for another user", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn cleanup_pdfs(
    AuthUser(user): AuthUser,
    State(store): State<Arc<PgStore>>,
    State(blobs): State<Arc<dyn BlobStore>>,
    body: Bytes,
) -> impl IntoResponse {
    let user_id = match cleanup_target(user.id, &body) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match cleanup_expired(store.as_ref(), blobs.as_ref(), user_id, Utc::now()).await {
        Ok(report) => (
            StatusCode::OK,
            Json(CleanupResponse {
                success: true,
                deleted: report.deleted,
                failed: report.failed,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Failed to clean up documents: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "An error occurred while cleaning up PDFs.",
                )),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn rejection(response: Response) -> (StatusCode, serde_json::Value) {
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_empty_body_targets_caller() {
        let caller = Uuid::new_v4();
        assert_eq!(cleanup_target(caller, b"").unwrap(), caller);
        assert_eq!(cleanup_target(caller, b" \n").unwrap(), caller);
        assert_eq!(cleanup_target(caller, b"{}").unwrap(), caller);

        let own = format!(r#"{{"userId":"{}"}}"#, caller);
        assert_eq!(cleanup_target(caller, own.as_bytes()).unwrap(), caller);
    }

    #[tokio::test]
    async fn test_other_users_id_is_forbidden() {
        let body = format!(r#"{{"userId":"{}"}}"#, Uuid::new_v4());
        let response = cleanup_target(Uuid::new_v4(), body.as_bytes()).unwrap_err();

        let (status, body) = rejection(response).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "You can only clean up your own documents.");
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected() {
        for body in [
            r#"{"userId":"not-a-uuid"}"#,
            r#"{"userId":"#,
            "[1, 2]",
        ] {
            let response = cleanup_target(Uuid::new_v4(), body.as_bytes()).unwrap_err();
            let (status, json) = rejection(response).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", body);
            assert!(json["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid request body"));
        }
    }
}
