pub mod auth;
pub mod testing;

use crate::AppState;
use axum::routing::{get, post};
use axum::Router;
use utoipa::OpenApi;

/// Routes reachable without a bearer token: account creation, login and a liveness ping.
pub fn router() -> Router<AppState> {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup::signup))
        .route("/login", post(auth::login::login));

    Router::new()
        .nest("/api/auth", auth_routes)
        .route(
            "/api/test/unauthed-ping",
            get(testing::unauthed_ping::unauthed_ping),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::signup::signup,
        auth::login::login,
        testing::unauthed_ping::unauthed_ping,
    ),
    components(schemas(
        auth::signup::SignupRequest,
        auth::signup::SignupResponse,
        auth::login::LoginRequest,
        auth::login::LoginResponse,
        testing::unauthed_ping::UnauthedPingResponse,
    ))
)]
pub struct ApiDoc;
