//! Text-generation provider abstraction.
//!
//! Providers only move text: they send a [`CompletionRequest`] and return the
//! model's raw reply. Retries, parsing and validation live in
//! [`crate::generation`].

mod claude;
mod config;
mod fake;
mod types;

pub use claude::ClaudeProvider;
pub use config::{parse_env, ConfigError, LlmConfig, ProviderKind};
pub use config::{DEFAULT_MODEL, DEFAULT_PREMIUM_MODEL};
pub use fake::{sample_meal_plan_json, sample_recipe_json, FakeProvider};
pub use types::{ChatMessage, CompletionRequest, Role};

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error type for LLM operations.
#[derive(Debug, Clone, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

impl LlmError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }
}

/// Trait for LLM providers.
///
/// Implementations should be stateless and thread-safe.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Send one request and return the model's text response.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;

    /// Get the provider name (e.g., "claude", "fake").
    fn provider_name(&self) -> &'static str;
}

/// Build the provider selected by `config`.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        ProviderKind::Fake => Ok(Arc::new(FakeProvider::with_sample_responses())),
        ProviderKind::Claude => {
            if config.api_key.is_empty() {
                return Err(LlmError::NotConfigured(
                    "ANTHROPIC_API_KEY not set".to_string(),
                ));
            }
            let provider = ClaudeProvider::new(
                config.api_key.clone(),
                config.base_url.clone(),
                config.request_timeout,
            )?;
            Ok(Arc::new(provider))
        }
    }
}
