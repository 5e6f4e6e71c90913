//! Request-level errors for the generation pipeline.

use crate::generation::GenerateError;
use crate::quota::QuotaError;
use crate::store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("{0}")]
    Validation(String),

    #[error("Meal plan generation is a premium feature. Please upgrade your subscription to access this feature.")]
    PremiumRequired,

    #[error("You have reached your generation limit for this month. Upgrade to premium for unlimited generations.")]
    QuotaExceeded,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("The generated content could not be understood: {0}")]
    InvalidArtifact(String),

    #[error("Generation timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl GenerationError {
    /// HTTP status this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            GenerationError::Validation(_) => 400,
            GenerationError::PremiumRequired | GenerationError::QuotaExceeded => 403,
            GenerationError::RateLimited => 429,
            GenerationError::InvalidArtifact(_)
            | GenerationError::Timeout(_)
            | GenerationError::Internal(_) => 500,
        }
    }

    pub fn premium_required(&self) -> bool {
        matches!(self, GenerationError::PremiumRequired)
    }

    pub fn limit_reached(&self) -> bool {
        matches!(self, GenerationError::QuotaExceeded)
    }

    pub fn rate_limited(&self) -> bool {
        matches!(self, GenerationError::RateLimited)
    }
}

impl From<GenerateError> for GenerationError {
    fn from(e: GenerateError) -> Self {
        if e.is_rate_limited() {
            return GenerationError::RateLimited;
        }
        match e {
            GenerateError::InvalidArtifact(reason) => GenerationError::InvalidArtifact(reason),
            GenerateError::Llm(e) => GenerationError::Internal(e.to_string()),
        }
    }
}

impl From<QuotaError> for GenerationError {
    fn from(e: QuotaError) -> Self {
        GenerationError::Internal(e.to_string())
    }
}

impl From<StoreError> for GenerationError {
    fn from(e: StoreError) -> Self {
        GenerationError::Internal(e.to_string())
    }
}
