use crate::api::ErrorResponse;
use crate::auth::{create_session, hash_password};
use crate::db::{with_conn, DbError, DbPool};
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use diesel::prelude::*;
use seasonal_core::quota::next_reset;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: Uuid,
    pub token: String,
}

fn validate(req: &SignupRequest) -> Result<(), &'static str> {
    if req.username.trim().is_empty() {
        return Err("Username is required");
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({"username": "user", "password": "password"})),
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username already exists", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(pool): State<Arc<DbPool>>,
    Json(req): Json<SignupRequest>,
) -> impl IntoResponse {
    if let Err(message) = validate(&req) {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message))).into_response();
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(_) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to hash password")),
            )
                .into_response()
        }
    };

    let username = req.username.trim().to_string();
    let created = with_conn(&pool, move |conn| {
        // Account and first session are created together.
        conn.transaction(|conn| {
            // New accounts start on the free tier with a fresh period.
            let new_user = NewUser {
                username: &username,
                password_hash: &password_hash,
                free_generations_reset: next_reset(Utc::now()),
            };
            let user: User = diesel::insert_into(users::table)
                .values(&new_user)
                .returning(User::as_returning())
                .get_result(conn)?;
            let token = create_session(conn, user.id)?;
            Ok((user, token))
        })
    })
    .await;

    let (user, token) = match created {
        Ok(created) => created,
        Err(DbError::Query(diesel::result::Error::DatabaseError(
            diesel::result::DatabaseErrorKind::UniqueViolation,
            _,
        ))) => {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse::new("Username already exists")),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to create user")),
            )
                .into_response();
        }
    };

    tracing::info!(user_id = %user.id, "Created account");

    (
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    )
        .into_response()
}
