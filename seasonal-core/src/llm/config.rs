//! Generation configuration from environment variables.

use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default Anthropic API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Model used for free-tier generations.
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";

/// Higher-capability model used for premium generations.
pub const DEFAULT_PREMIUM_MODEL: &str = "claude-3-opus-20240229";

/// Per-attempt HTTP timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Additional attempts after the first failure.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Base delay between attempts in milliseconds.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: String, value: String },
}

/// Which provider implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Claude,
    Fake,
}

/// Generation client configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: ProviderKind,
    /// Anthropic API key. Empty for the fake provider.
    pub api_key: String,
    pub base_url: String,
    /// Model for free-tier callers.
    pub model: String,
    /// Model for premium callers.
    pub premium_model: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Fake,
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            premium_model: DEFAULT_PREMIUM_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: Duration::from_millis(DEFAULT_RETRY_DELAY_MS),
        }
    }
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// - `SEASONAL_LLM_PROVIDER`: "claude" or "fake" (default: "fake")
    /// - `ANTHROPIC_API_KEY`: required when the provider is "claude"
    /// - `SEASONAL_LLM_MODEL`, `SEASONAL_LLM_PREMIUM_MODEL`: model names
    /// - `SEASONAL_LLM_BASE_URL`: API base URL
    /// - `SEASONAL_LLM_REQUEST_TIMEOUT_SECS`: per-attempt timeout (default: 60)
    /// - `SEASONAL_LLM_MAX_RETRIES`: retries after the first attempt (default: 2)
    /// - `SEASONAL_LLM_RETRY_DELAY_MS`: base retry delay (default: 1000)
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let provider = match env::var("SEASONAL_LLM_PROVIDER")
            .unwrap_or_else(|_| "fake".to_string())
            .as_str()
        {
            "claude" => ProviderKind::Claude,
            "fake" => ProviderKind::Fake,
            other => {
                return Err(ConfigError::InvalidValue {
                    name: "SEASONAL_LLM_PROVIDER".to_string(),
                    value: other.to_string(),
                })
            }
        };

        let api_key = match provider {
            ProviderKind::Claude => env::var("ANTHROPIC_API_KEY")
                .map_err(|_| ConfigError::MissingEnvVar("ANTHROPIC_API_KEY".to_string()))?,
            ProviderKind::Fake => String::new(),
        };

        Ok(Self {
            provider,
            api_key,
            base_url: env::var("SEASONAL_LLM_BASE_URL").unwrap_or(defaults.base_url),
            model: env::var("SEASONAL_LLM_MODEL").unwrap_or(defaults.model),
            premium_model: env::var("SEASONAL_LLM_PREMIUM_MODEL")
                .unwrap_or(defaults.premium_model),
            request_timeout: Duration::from_secs(parse_env(
                "SEASONAL_LLM_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            max_retries: parse_env("SEASONAL_LLM_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_delay: Duration::from_millis(parse_env(
                "SEASONAL_LLM_RETRY_DELAY_MS",
                DEFAULT_RETRY_DELAY_MS,
            )?),
        })
    }
}

/// Parse an optional numeric environment variable, falling back to `default` when unset.
pub fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}
