use seasonal_core::llm::{parse_env, ConfigError};
use seasonal_core::orchestrator::{DEFAULT_GENERATION_TIMEOUT, DEFAULT_RENDER_TIMEOUT};
use seasonal_core::Timeouts;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_BLOB_DIR: &str = "data/pdfs";
pub const DEFAULT_FILES_URL: &str = "http://localhost:3000/files";

/// Where rendered PDFs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlobBackend {
    /// Local directory, served by this process under `/files`.
    Disk {
        root: PathBuf,
        public_url: String,
    },
    S3 {
        bucket: String,
        region: String,
        endpoint: Option<String>,
        public_url: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub timeouts: Timeouts,
    pub blobs: BlobBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// - `DATABASE_URL`: required
    /// - `SEASONAL_BIND_ADDR`: listen address (default: 0.0.0.0:3000)
    /// - `SEASONAL_GENERATION_TIMEOUT_SECS`: covers all retries (default: 90)
    /// - `SEASONAL_RENDER_TIMEOUT_SECS`: render and upload (default: 30)
    /// - `SEASONAL_BLOB_BACKEND`: "disk" or "s3" (default: "disk")
    /// - `SEASONAL_BLOB_DIR`, `SEASONAL_BLOB_PUBLIC_URL`: disk backend settings
    /// - `SEASONAL_S3_BUCKET` (required for s3), `SEASONAL_S3_REGION`, `SEASONAL_S3_ENDPOINT`
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let timeouts = Timeouts {
            generation: Duration::from_secs(parse_env(
                "SEASONAL_GENERATION_TIMEOUT_SECS",
                DEFAULT_GENERATION_TIMEOUT.as_secs(),
            )?),
            render: Duration::from_secs(parse_env(
                "SEASONAL_RENDER_TIMEOUT_SECS",
                DEFAULT_RENDER_TIMEOUT.as_secs(),
            )?),
        };

        let public_url = env::var("SEASONAL_BLOB_PUBLIC_URL").ok();
        let blobs = match env::var("SEASONAL_BLOB_BACKEND")
            .unwrap_or_else(|_| "disk".to_string())
            .as_str()
        {
            "disk" => BlobBackend::Disk {
                root: env::var("SEASONAL_BLOB_DIR")
                    .unwrap_or_else(|_| DEFAULT_BLOB_DIR.to_string())
                    .into(),
                public_url: public_url.unwrap_or_else(|| DEFAULT_FILES_URL.to_string()),
            },
            "s3" => BlobBackend::S3 {
                bucket: env::var("SEASONAL_S3_BUCKET")
                    .map_err(|_| ConfigError::MissingEnvVar("SEASONAL_S3_BUCKET".to_string()))?,
                region: env::var("SEASONAL_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: env::var("SEASONAL_S3_ENDPOINT").ok(),
                public_url,
            },
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "SEASONAL_BLOB_BACKEND".to_string(),
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            database_url,
            bind_addr: env::var("SEASONAL_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            timeouts,
            blobs,
        })
    }
}
