//! One pass from a user's request to a generated artifact.
//!
//! Steps run strictly in order: validate, authorize, quota gate (recipes
//! only), generate, render (best effort), persist (meal plans only), record
//! usage, respond. Rejections happen before any external call, and usage is
//! only recorded after a successful generation.

use crate::error::GenerationError;
use crate::generation::{meal_plan_prompt, recipe_prompt, GenerationClient};
use crate::quota::QuotaLedger;
use crate::render::{ArtifactRenderer, RenderContext};
use crate::store::{MealPlanRecord, MealPlanStore};
use crate::types::{Artifact, Caller, MealPlan, MealPlanRequest, Recipe, RecipeRequest};
use chrono::Utc;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use utoipa::ToSchema;
use uuid::Uuid;

pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(90);
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadlines for the two slow steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Covers every attempt the generation client makes.
    pub generation: Duration,
    /// Covers rendering and upload together.
    pub render: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            generation: DEFAULT_GENERATION_TIMEOUT,
            render: DEFAULT_RENDER_TIMEOUT,
        }
    }
}

/// What happened to the PDF for a successful generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PdfStatus {
    Generated,
    /// Rendering or upload failed; the artifact is still returned.
    Failed,
    /// The caller opted out.
    Skipped,
}

#[derive(Debug, Clone)]
pub struct RecipeOutcome {
    pub recipe: Recipe,
    pub pdf_url: Option<String>,
    pub pdf_status: PdfStatus,
}

#[derive(Debug, Clone)]
pub struct MealPlanOutcome {
    pub meal_plan: MealPlan,
    pub pdf_url: Option<String>,
    pub pdf_status: PdfStatus,
    pub meal_plan_id: Uuid,
}

/// Longest accepted free-text field, in characters. Titles built from the
/// seasonal focus must stay inside the 255-character database columns.
pub const MAX_FIELD_CHARS: usize = 100;

fn check_length<'a>(
    name: &str,
    values: impl IntoIterator<Item = &'a String>,
) -> Result<(), GenerationError> {
    if values
        .into_iter()
        .any(|v| v.trim().chars().count() > MAX_FIELD_CHARS)
    {
        return Err(GenerationError::Validation(format!(
            "{} must be at most {} characters.",
            name, MAX_FIELD_CHARS
        )));
    }
    Ok(())
}

pub fn validate_recipe_request(request: &RecipeRequest) -> Result<(), GenerationError> {
    let has_ingredient = request
        .seasonal_ingredients
        .iter()
        .any(|i| !i.trim().is_empty());
    if request.meal_type.trim().is_empty() || request.servings == 0 || !has_ingredient {
        return Err(GenerationError::Validation(
            "Missing required parameters. Please provide mealType, servings, and at least one seasonal ingredient."
                .to_string(),
        ));
    }
    check_length("mealType", [&request.meal_type])?;
    check_length("Each seasonal ingredient", &request.seasonal_ingredients)?;
    check_length("Each dietary restriction", &request.dietary_restrictions)?;
    check_length("Each preference", &request.preferences)?;
    Ok(())
}

pub fn validate_meal_plan_request(request: &MealPlanRequest) -> Result<(), GenerationError> {
    if request.seasonal_focus.trim().is_empty() || request.servings_per_meal == 0 {
        return Err(GenerationError::Validation(
            "Missing required parameters. Please provide seasonalFocus and servingsPerMeal."
                .to_string(),
        ));
    }
    check_length("seasonalFocus", [&request.seasonal_focus])?;
    check_length("budget", request.budget.iter())?;
    check_length("Each dietary restriction", &request.dietary_restrictions)?;
    check_length("Each preference", &request.preferences)?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct GenerationOrchestrator {
    client: GenerationClient,
    quota: Arc<dyn QuotaLedger>,
    renderer: Arc<dyn ArtifactRenderer>,
    meal_plans: Arc<dyn MealPlanStore>,
    timeouts: Timeouts,
}

impl GenerationOrchestrator {
    pub fn new(
        client: GenerationClient,
        quota: Arc<dyn QuotaLedger>,
        renderer: Arc<dyn ArtifactRenderer>,
        meal_plans: Arc<dyn MealPlanStore>,
    ) -> Self {
        Self {
            client,
            quota,
            renderer,
            meal_plans,
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    async fn with_generation_deadline<T, F>(&self, fut: F) -> Result<T, GenerationError>
    where
        F: Future<Output = Result<T, crate::generation::GenerateError>>,
    {
        match tokio::time::timeout(self.timeouts.generation, fut).await {
            Ok(result) => result.map_err(GenerationError::from),
            Err(_) => Err(GenerationError::Timeout(self.timeouts.generation.as_secs())),
        }
    }

    /// Render without ever failing the request.
    async fn render_best_effort(
        &self,
        artifact: &Artifact,
        user_id: Uuid,
        context: &RenderContext,
        wanted: bool,
    ) -> (Option<String>, PdfStatus) {
        if !wanted {
            return (None, PdfStatus::Skipped);
        }

        let kind = artifact.kind().as_str();
        let render = self.renderer.render(artifact, user_id, context);
        match tokio::time::timeout(self.timeouts.render, render).await {
            Ok(Ok(url)) => (Some(url), PdfStatus::Generated),
            Ok(Err(e)) => {
                tracing::error!(%user_id, kind, error = %e, "PDF generation failed, continuing without it");
                (None, PdfStatus::Failed)
            }
            Err(_) => {
                tracing::error!(
                    %user_id,
                    kind,
                    timeout_secs = self.timeouts.render.as_secs(),
                    "PDF generation timed out, continuing without it"
                );
                (None, PdfStatus::Failed)
            }
        }
    }

    pub async fn generate_recipe(
        &self,
        caller: Caller,
        request: &RecipeRequest,
    ) -> Result<RecipeOutcome, GenerationError> {
        validate_recipe_request(request)?;

        if !self.quota.check_allowance(caller.user_id, Utc::now()).await? {
            tracing::info!(user_id = %caller.user_id, "Recipe generation refused, monthly limit reached");
            return Err(GenerationError::QuotaExceeded);
        }

        let prompt = recipe_prompt(request);
        let recipe = self
            .with_generation_deadline(self.client.generate_recipe(&prompt, caller.tier))
            .await?;

        let context = RenderContext::new(Utc::now());
        let artifact = Artifact::Recipe(recipe.clone());
        let wanted = request.generate_pdf != Some(false);
        let (pdf_url, pdf_status) = self
            .render_best_effort(&artifact, caller.user_id, &context, wanted)
            .await;

        self.quota.record_usage(caller.user_id).await?;

        tracing::info!(
            user_id = %caller.user_id,
            tier = caller.tier.as_str(),
            recipe = %recipe.name,
            pdf_status = ?pdf_status,
            "Generated recipe"
        );

        Ok(RecipeOutcome {
            recipe,
            pdf_url,
            pdf_status,
        })
    }

    pub async fn generate_meal_plan(
        &self,
        caller: Caller,
        request: &MealPlanRequest,
    ) -> Result<MealPlanOutcome, GenerationError> {
        validate_meal_plan_request(request)?;

        if !caller.tier.is_premium() {
            return Err(GenerationError::PremiumRequired);
        }

        let prompt = meal_plan_prompt(request);
        let meal_plan = self
            .with_generation_deadline(self.client.generate_meal_plan(&prompt, caller.tier))
            .await?;

        let now = Utc::now();
        let context = RenderContext::new(now).with_seasonal_focus(request.seasonal_focus.trim());
        let artifact = Artifact::MealPlan(meal_plan.clone());
        let wanted = request.generate_pdf != Some(false);
        let (pdf_url, pdf_status) = self
            .render_best_effort(&artifact, caller.user_id, &context, wanted)
            .await;

        let record = MealPlanRecord::new(
            caller.user_id,
            &request.seasonal_focus,
            request.servings_per_meal,
            meal_plan.clone(),
            pdf_url.clone(),
            now,
        );
        self.meal_plans.save_meal_plan(&record).await?;

        tracing::info!(
            user_id = %caller.user_id,
            meal_plan_id = %record.id,
            pdf_status = ?pdf_status,
            "Generated meal plan"
        );

        Ok(MealPlanOutcome {
            meal_plan,
            pdf_url,
            pdf_status,
            meal_plan_id: record.id,
        })
    }
}
