mod api;
mod app;
mod auth;
mod config;
mod db;
mod models;
mod quota;
mod schema;
mod storage;
mod store;
mod telemetry;

use anyhow::Context;
use app::AppState;
use config::{BlobBackend, ServerConfig};
use seasonal_core::{
    create_provider, BlobStore, DiskBlobStore, GenerationClient, GenerationOrchestrator,
    LlmConfig, PdfArtifactRenderer,
};
use std::env;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi().to_pretty_json()?;
        println!("{}", spec);
        return Ok(());
    }

    telemetry::init_telemetry()?;

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    let llm_config = LlmConfig::from_env().context("Invalid LLM configuration")?;

    let pool = Arc::new(db::create_pool(&config.database_url)?);

    let mut files_dir = None;
    let blobs: Arc<dyn BlobStore> = match &config.blobs {
        BlobBackend::Disk { root, public_url } => {
            tokio::fs::create_dir_all(root)
                .await
                .with_context(|| format!("Failed to create {}", root.display()))?;
            files_dir = Some(root.clone());
            Arc::new(DiskBlobStore::new(root.clone(), public_url.clone()))
        }
        BlobBackend::S3 {
            bucket,
            region,
            endpoint,
            public_url,
        } => Arc::new(
            storage::S3BlobStore::connect(
                bucket.clone(),
                region.clone(),
                endpoint.clone(),
                public_url.clone(),
            )
            .await,
        ),
    };

    let store = Arc::new(store::PgStore::new(pool.clone()));
    let quota = Arc::new(quota::PgQuotaLedger::new(pool.clone()));

    let provider = create_provider(&llm_config)?;
    tracing::info!(
        provider = provider.provider_name(),
        blobs = blobs.backend_name(),
        "Generation pipeline configured"
    );

    let orchestrator = GenerationOrchestrator::new(
        GenerationClient::from_config(provider, &llm_config),
        quota.clone(),
        Arc::new(PdfArtifactRenderer::new(blobs.clone(), store.clone())),
        store.clone(),
    )
    .with_timeouts(config.timeouts);

    let state = AppState {
        pool,
        orchestrator: Arc::new(orchestrator),
        quota,
        store,
        blobs,
    };

    let app = app::router(state, files_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);
    tracing::info!("OpenAPI spec available at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
