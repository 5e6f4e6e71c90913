//! Turns a prompt into a validated recipe or meal plan.
//!
//! The client picks a model by tier, sends the kind's system prompt, extracts
//! the JSON artifact from the reply and retries the whole round trip under a
//! [`RetryPolicy`].

mod extract;
mod prompts;
mod retry;

pub use extract::{find_json_object, parse_meal_plan, parse_recipe};
pub use prompts::{
    meal_plan_prompt, meal_plan_system_prompt, recipe_prompt, recipe_system_prompt,
    DEFAULT_BUDGET,
};
pub use retry::RetryPolicy;

use crate::llm::{
    ChatMessage, CompletionRequest, LlmConfig, LlmError, LlmProvider, DEFAULT_MODEL,
    DEFAULT_PREMIUM_MODEL,
};
use crate::types::{Artifact, ArtifactKind, MealPlan, Recipe, SubscriptionTier};
use std::sync::Arc;
use thiserror::Error;

/// Sampling temperature for every generation.
pub const TEMPERATURE: f32 = 0.7;
pub const RECIPE_MAX_TOKENS: u32 = 2000;
pub const MEAL_PLAN_MAX_TOKENS: u32 = 4000;

#[derive(Error, Debug, Clone)]
pub enum GenerateError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),
}

impl GenerateError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GenerateError::Llm(e) => e.is_rate_limited(),
            GenerateError::InvalidArtifact(_) => false,
        }
    }
}

/// Model identifiers per subscription tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub standard: String,
    pub premium: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            standard: DEFAULT_MODEL.to_string(),
            premium: DEFAULT_PREMIUM_MODEL.to_string(),
        }
    }
}

impl ModelSelection {
    pub fn for_tier(&self, tier: SubscriptionTier) -> &str {
        match tier {
            SubscriptionTier::Free => &self.standard,
            SubscriptionTier::Premium => &self.premium,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    provider: Arc<dyn LlmProvider>,
    models: ModelSelection,
    retry: RetryPolicy,
}

impl GenerationClient {
    pub fn new(provider: Arc<dyn LlmProvider>, models: ModelSelection, retry: RetryPolicy) -> Self {
        Self {
            provider,
            models,
            retry,
        }
    }

    pub fn from_config(provider: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        let models = ModelSelection {
            standard: config.model.clone(),
            premium: config.premium_model.clone(),
        };
        Self::new(provider, models, RetryPolicy::from_config(config))
    }

    pub fn model_for(&self, tier: SubscriptionTier) -> &str {
        self.models.for_tier(tier)
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn build_request(&self, kind: ArtifactKind, prompt: &str, tier: SubscriptionTier) -> CompletionRequest {
        let (system, max_tokens) = match kind {
            ArtifactKind::Recipe => (recipe_system_prompt(), RECIPE_MAX_TOKENS),
            ArtifactKind::MealPlan => (meal_plan_system_prompt(), MEAL_PLAN_MAX_TOKENS),
        };
        CompletionRequest {
            model: self.model_for(tier).to_string(),
            system: Some(system),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens,
            temperature: TEMPERATURE,
        }
    }

    /// Generate one artifact of `kind`. Each attempt is a full completion
    /// plus extraction; a reply that fails validation counts as a failed attempt.
    pub async fn generate(
        &self,
        kind: ArtifactKind,
        prompt: &str,
        tier: SubscriptionTier,
    ) -> Result<Artifact, GenerateError> {
        let request = self.build_request(kind, prompt, tier);
        let provider = &self.provider;
        let request = &request;

        tracing::debug!(
            kind = kind.as_str(),
            model = %request.model,
            provider = provider.provider_name(),
            "Requesting generation"
        );

        self.retry
            .run(kind.as_str(), move |attempt| async move {
                tracing::debug!(kind = kind.as_str(), attempt, "Generation attempt");
                let text = provider.complete(request).await?;
                match kind {
                    ArtifactKind::Recipe => parse_recipe(&text).map(Artifact::Recipe),
                    ArtifactKind::MealPlan => parse_meal_plan(&text).map(Artifact::MealPlan),
                }
            })
            .await
    }

    pub async fn generate_recipe(
        &self,
        prompt: &str,
        tier: SubscriptionTier,
    ) -> Result<Recipe, GenerateError> {
        match self.generate(ArtifactKind::Recipe, prompt, tier).await? {
            Artifact::Recipe(recipe) => Ok(recipe),
            Artifact::MealPlan(_) => Err(GenerateError::InvalidArtifact(
                "expected a recipe, got a meal plan".to_string(),
            )),
        }
    }

    pub async fn generate_meal_plan(
        &self,
        prompt: &str,
        tier: SubscriptionTier,
    ) -> Result<MealPlan, GenerateError> {
        match self.generate(ArtifactKind::MealPlan, prompt, tier).await? {
            Artifact::MealPlan(plan) => Ok(plan),
            Artifact::Recipe(_) => Err(GenerateError::InvalidArtifact(
                "expected a meal plan, got a recipe".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{sample_meal_plan_json, sample_recipe_json, FakeProvider};

    fn client(provider: Arc<FakeProvider>) -> GenerationClient {
        GenerationClient::new(provider, ModelSelection::default(), RetryPolicy::immediate())
    }

    #[tokio::test]
    async fn test_premium_uses_premium_model() {
        let provider = Arc::new(FakeProvider::new().with_default_response(&sample_recipe_json()));
        let client = client(provider.clone());

        client
            .generate_recipe("a recipe", SubscriptionTier::Premium)
            .await
            .unwrap();
        client
            .generate_recipe("a recipe", SubscriptionTier::Free)
            .await
            .unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].model, DEFAULT_PREMIUM_MODEL);
        assert_eq!(requests[1].model, DEFAULT_MODEL);
    }

    #[tokio::test]
    async fn test_request_parameters_per_kind() {
        let provider = Arc::new(FakeProvider::scripted([
            Ok(sample_recipe_json()),
            Ok(sample_meal_plan_json()),
        ]));
        let client = client(provider.clone());

        client.generate_recipe("r", SubscriptionTier::Free).await.unwrap();
        client.generate_meal_plan("m", SubscriptionTier::Premium).await.unwrap();

        let requests = provider.requests();
        assert_eq!(requests[0].max_tokens, RECIPE_MAX_TOKENS);
        assert_eq!(requests[1].max_tokens, MEAL_PLAN_MAX_TOKENS);
        assert_eq!(requests[0].temperature, TEMPERATURE);
        assert!(requests[1].system.as_deref().unwrap().contains("meal planner"));
    }

    #[tokio::test]
    async fn test_invalid_output_is_retried() {
        let provider = Arc::new(FakeProvider::scripted([
            Ok("Sorry, I can't help with that.".to_string()),
            Ok(sample_recipe_json()),
        ]));
        let client = client(provider.clone());

        let recipe = client.generate_recipe("r", SubscriptionTier::Free).await.unwrap();
        assert_eq!(recipe.name, "Roasted Butternut Squash");
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn test_last_error_propagates() {
        let provider = Arc::new(FakeProvider::scripted([
            Err(LlmError::RequestFailed("boom".to_string())),
            Err(LlmError::RequestFailed("boom".to_string())),
            Err(LlmError::RateLimited {
                retry_after_secs: None,
            }),
        ]));
        let client = client(provider.clone());

        let err = client
            .generate_recipe("r", SubscriptionTier::Free)
            .await
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(provider.calls(), 3);
    }
}
