use crate::api::ErrorResponse;
use crate::db::{with_conn, DbError, DbPool};
use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::db::get_user_from_token;
use super::extractor::AuthUser;

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ErrorResponse::new(message))).into_response()
}

/// Middleware that requires a valid auth token for all requests.
/// Apply this to routes that should be protected by default.
///
/// On success the user is stored in request extensions for [`AuthUser`].
pub async fn require_auth(
    State(pool): State<Arc<DbPool>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = match request.headers().get(header::AUTHORIZATION) {
        Some(h) => h,
        None => return unauthorized("Missing Authorization header"),
    };

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(_) => return unauthorized("Invalid Authorization header"),
    };

    let token = match auth_str.strip_prefix("Bearer ") {
        Some(t) => t.trim().to_string(),
        None => return unauthorized("Invalid Authorization header format"),
    };

    let user = match with_conn(&pool, move |conn| get_user_from_token(conn, &token)).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized("Invalid or expired token"),
        Err(DbError::Pool(e)) => {
            tracing::error!("Failed to get database connection: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Database connection error")),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to look up session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to validate session")),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(AuthUser(user));
    next.run(request).await
}
