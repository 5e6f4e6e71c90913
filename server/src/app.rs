use crate::api;
use crate::auth;
use crate::db::DbPool;
use crate::quota::PgQuotaLedger;
use crate::store::PgStore;
use axum::extract::{FromRef, MatchedPath};
use axum::http::Request;
use axum::middleware;
use axum::Router;
use seasonal_core::{BlobStore, GenerationOrchestrator};
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<DbPool>,
    pub orchestrator: Arc<GenerationOrchestrator>,
    pub quota: Arc<PgQuotaLedger>,
    pub store: Arc<PgStore>,
    pub blobs: Arc<dyn BlobStore>,
}

impl FromRef<AppState> for Arc<DbPool> {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<GenerationOrchestrator> {
    fn from_ref(state: &AppState) -> Self {
        state.orchestrator.clone()
    }
}

impl FromRef<AppState> for Arc<PgQuotaLedger> {
    fn from_ref(state: &AppState) -> Self {
        state.quota.clone()
    }
}

impl FromRef<AppState> for Arc<PgStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for Arc<dyn BlobStore> {
    fn from_ref(state: &AppState) -> Self {
        state.blobs.clone()
    }
}

/// Assemble every route. `files_dir` serves locally stored PDFs under `/files`.
pub fn router(state: AppState, files_dir: Option<&Path>) -> Router {
    // Public routes (no auth required)
    let public_router = api::public::router();

    // Protected routes (auth required)
    let protected_router = Router::new()
        .nest("/api/test", api::testing::router())
        .nest("/api/ai", api::generate::router())
        .nest("/api/pdfs", api::pdfs::router())
        .nest("/api/meal-plans", api::meal_plans::router())
        .nest("/api/usage", api::usage::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ));

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let mut app = Router::new()
        .merge(public_router)
        .merge(protected_router)
        .merge(swagger_ui);

    if let Some(dir) = files_dir {
        app = app.nest_service("/files", ServeDir::new(dir));
    }

    app.with_state(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let matched_path = request
                    .extensions()
                    .get::<MatchedPath>()
                    .map(MatchedPath::as_str)
                    .unwrap_or(request.uri().path());

                // Don't create a span at all for noisy endpoints
                if matched_path == "/api/test/unauthed-ping" {
                    tracing::trace_span!("http_request")
                } else {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %matched_path,
                    )
                }
            })
            .on_request(|_request: &Request<_>, _span: &Span| {})
            .on_response(
                |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                    // Skip logging for noisy endpoints (trace-level spans)
                    if span.metadata().map(|m| m.level()) == Some(&tracing::Level::TRACE) {
                        return;
                    }
                    let status = response.status().as_u16();
                    if status >= 500 {
                        tracing::error!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request failed with server error"
                        );
                    } else {
                        tracing::info!(
                            status = %status,
                            latency_ms = %latency.as_millis(),
                            "request completed"
                        );
                    }
                },
            )
            .on_failure(
                |error: tower_http::classify::ServerErrorsFailureClass,
                 latency: std::time::Duration,
                 _span: &Span| {
                    tracing::error!(
                        error = %error,
                        latency_ms = %latency.as_millis(),
                        "request failed"
                    );
                },
            ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, StatusCode};
    use diesel::r2d2::{ConnectionManager, Pool};
    use seasonal_core::llm::FakeProvider;
    use seasonal_core::{
        GenerationClient, MemoryBlobStore, MemoryStore, ModelSelection, PdfArtifactRenderer,
        RetryPolicy,
    };
    use tower::ServiceExt;

    // The pool never connects, and gives up quickly when asked to.
    fn test_state() -> AppState {
        let manager = ConnectionManager::<diesel::PgConnection>::new("postgres://localhost:1/unused");
        let pool = Arc::new(
            Pool::builder()
                .connection_timeout(std::time::Duration::from_millis(200))
                .build_unchecked(manager),
        );

        let blobs = Arc::new(MemoryBlobStore::default());
        let memory = Arc::new(MemoryStore::new());
        let client = GenerationClient::new(
            Arc::new(FakeProvider::with_sample_responses()),
            ModelSelection::default(),
            RetryPolicy::immediate(),
        );
        let orchestrator = GenerationOrchestrator::new(
            client,
            Arc::new(PgQuotaLedger::new(pool.clone())),
            Arc::new(PdfArtifactRenderer::new(blobs.clone(), memory.clone())),
            memory,
        );

        AppState {
            pool: pool.clone(),
            orchestrator: Arc::new(orchestrator),
            quota: Arc::new(PgQuotaLedger::new(pool.clone())),
            store: Arc::new(PgStore::new(pool)),
            blobs,
        }
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router(test_state(), None).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    #[tokio::test]
    async fn test_unauthed_ping() {
        let (status, body) = send(
            Request::get("/api/test/unauthed-ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "unauthed-ping");
    }

    #[tokio::test]
    async fn test_protected_routes_require_token() {
        for (method, path) in [
            ("POST", "/api/ai/generate-recipe"),
            ("POST", "/api/ai/generate-meal-plan"),
            ("GET", "/api/pdfs"),
            ("POST", "/api/pdfs/cleanup"),
            ("GET", "/api/meal-plans"),
            ("GET", "/api/usage"),
            ("GET", "/api/test/ping"),
        ] {
            let request = Request::builder()
                .method(method)
                .uri(path)
                .body(Body::empty())
                .unwrap();
            let (status, body) = send(request).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, path);
            assert_eq!(body["error"], "Missing Authorization header");
        }
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_is_rejected() {
        let (status, body) = send(
            Request::get("/api/usage")
                .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid Authorization header format");
    }

    #[tokio::test]
    async fn test_token_lookup_without_database_is_server_error() {
        let (status, body) = send(
            Request::get("/api/usage")
                .header(header::AUTHORIZATION, "Bearer 0123456789abcdef")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database connection error");
    }

    #[tokio::test]
    async fn test_openapi_document_is_served() {
        let (status, body) = send(
            Request::get("/api-docs/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/api/ai/generate-recipe"].is_object());
    }
}
