//! End-to-end tests for the generation pipeline using in-memory collaborators.
//!
//! Every test wires a [`FakeProvider`], the in-memory quota ledger, the
//! in-memory stores and a memory blob store behind the real PDF renderer.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use seasonal_core::generation::{GenerateError, GenerationClient, ModelSelection, RetryPolicy};
use seasonal_core::llm::{
    sample_meal_plan_json, sample_recipe_json, CompletionRequest, FakeProvider, LlmError,
    LlmProvider,
};
use seasonal_core::quota::{InMemoryQuotaLedger, QuotaLedger, QuotaRecord};
use seasonal_core::render::{ArtifactRenderer, PdfArtifactRenderer, RenderContext, RenderError};
use seasonal_core::shopping_list::group;
use seasonal_core::{
    Artifact, Caller, DocumentStore, GenerationError, GenerationOrchestrator, MealPlanRequest,
    MealPlanStore, MemoryBlobStore, MemoryStore, PdfStatus, RecipeRequest, SubscriptionTier,
    Timeouts,
};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

struct Harness {
    provider: Arc<FakeProvider>,
    ledger: Arc<InMemoryQuotaLedger>,
    blobs: Arc<MemoryBlobStore>,
    store: Arc<MemoryStore>,
    orchestrator: GenerationOrchestrator,
}

fn harness(provider: FakeProvider) -> Harness {
    let provider = Arc::new(provider);
    let ledger = Arc::new(InMemoryQuotaLedger::new());
    let blobs = Arc::new(MemoryBlobStore::new("https://files.test"));
    let store = Arc::new(MemoryStore::new());

    let client = GenerationClient::new(
        provider.clone(),
        ModelSelection::default(),
        RetryPolicy::immediate(),
    );
    let renderer = Arc::new(PdfArtifactRenderer::new(blobs.clone(), store.clone()));
    let orchestrator = GenerationOrchestrator::new(client, ledger.clone(), renderer, store.clone());

    Harness {
        provider,
        ledger,
        blobs,
        store,
        orchestrator,
    }
}

fn free_user(h: &Harness, used: u32) -> Caller {
    let user_id = Uuid::new_v4();
    h.ledger.insert(
        user_id,
        QuotaRecord {
            generations_used: used,
            ..QuotaRecord::new_free(Utc::now())
        },
    );
    Caller {
        user_id,
        tier: SubscriptionTier::Free,
    }
}

fn premium_user(h: &Harness) -> Caller {
    let user_id = Uuid::new_v4();
    h.ledger.insert(user_id, QuotaRecord::premium(Utc::now()));
    Caller {
        user_id,
        tier: SubscriptionTier::Premium,
    }
}

fn recipe_request() -> RecipeRequest {
    RecipeRequest {
        dietary_restrictions: vec!["vegetarian".to_string()],
        preferences: vec!["cozy".to_string()],
        seasonal_ingredients: vec!["butternut squash".to_string(), "sage".to_string()],
        meal_type: "dinner".to_string(),
        servings: 4,
        generate_pdf: None,
    }
}

fn meal_plan_request() -> MealPlanRequest {
    MealPlanRequest {
        seasonal_focus: "Autumn".to_string(),
        servings_per_meal: 4,
        ..Default::default()
    }
}

// Quota ledger

#[tokio::test]
async fn test_free_user_at_cap_is_refused_before_reset() {
    let ledger = InMemoryQuotaLedger::new();
    let user = Uuid::new_v4();
    let now = Utc::now();
    ledger.insert(
        user,
        QuotaRecord {
            tier: SubscriptionTier::Free,
            generations_used: 3,
            reset_at: now + ChronoDuration::days(5),
        },
    );
    assert!(!ledger.check_allowance(user, now).await.unwrap());
    assert_eq!(ledger.get(user).unwrap().generations_used, 3);
}

#[tokio::test]
async fn test_check_at_reset_time_starts_new_period() {
    let ledger = InMemoryQuotaLedger::new();
    let user = Uuid::new_v4();
    let now = Utc::now();
    ledger.insert(
        user,
        QuotaRecord {
            tier: SubscriptionTier::Free,
            generations_used: 3,
            reset_at: now,
        },
    );

    assert!(ledger.check_allowance(user, now).await.unwrap());
    let record = ledger.get(user).unwrap();
    assert_eq!(record.generations_used, 0);
    assert_eq!(record.reset_at, now + ChronoDuration::days(30));
}

#[tokio::test]
async fn test_record_usage_counts_free_only() {
    let ledger = InMemoryQuotaLedger::new();
    let now = Utc::now();
    let free = Uuid::new_v4();
    let premium = Uuid::new_v4();
    ledger.insert(free, QuotaRecord::new_free(now));
    ledger.insert(premium, QuotaRecord::premium(now));

    ledger.record_usage(free).await.unwrap();
    ledger.record_usage(premium).await.unwrap();

    assert_eq!(ledger.usage(free).await.unwrap().generations_used, 1);
    assert_eq!(ledger.usage(premium).await.unwrap().generations_used, 0);
}

// Shopping list

#[test]
fn test_categorizer_places_every_item_once() {
    let plan = seasonal_core::generation::parse_meal_plan(&sample_meal_plan_json()).unwrap();
    let sections = group(&plan.shopping_list);
    let placed: usize = sections.iter().map(|s| s.items.len()).sum();
    assert_eq!(placed, plan.shopping_list.len());
    assert!(sections.len() <= 5);
    assert!(sections.iter().all(|s| !s.items.is_empty()));
}

// Generation client retry budget

#[tokio::test(start_paused = true)]
async fn test_rate_limited_twice_then_success() {
    let provider = Arc::new(FakeProvider::scripted([
        Err(LlmError::RateLimited {
            retry_after_secs: None,
        }),
        Err(LlmError::RateLimited {
            retry_after_secs: None,
        }),
        Ok(sample_recipe_json()),
    ]));
    let client = GenerationClient::new(
        provider.clone(),
        ModelSelection::default(),
        RetryPolicy::default(),
    );

    let start = tokio::time::Instant::now();
    let recipe = client
        .generate_recipe("a recipe", SubscriptionTier::Free)
        .await
        .unwrap();

    assert_eq!(recipe.name, "Roasted Butternut Squash");
    assert_eq!(provider.calls(), 3);
    // Flat rate-limit delay both times
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(2000), "{:?}", elapsed);
    assert!(elapsed < Duration::from_millis(2100), "{:?}", elapsed);
}

#[tokio::test(start_paused = true)]
async fn test_no_json_fails_after_three_attempts() {
    let provider = Arc::new(
        FakeProvider::new().with_default_response("I'm sorry, I can only talk about cooking."),
    );
    let client = GenerationClient::new(
        provider.clone(),
        ModelSelection::default(),
        RetryPolicy::default(),
    );

    let err = client
        .generate_recipe("a recipe", SubscriptionTier::Free)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerateError::InvalidArtifact(_)));
    assert_eq!(provider.calls(), 3);
}

// Orchestrator

#[tokio::test]
async fn test_free_recipe_consumes_one_generation() {
    let h = harness(FakeProvider::new().with_default_response(&sample_recipe_json()));
    let caller = free_user(&h, 0);

    let outcome = h
        .orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap();

    assert!(!outcome.recipe.ingredients.is_empty());
    assert!(!outcome.recipe.instructions.is_empty());
    assert_eq!(outcome.pdf_status, PdfStatus::Generated);
    let url = outcome.pdf_url.unwrap();
    assert!(url.starts_with(&format!("https://files.test/recipes/{}/roasted-butternut-squash-", caller.user_id)));
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 1);
    // Recipes are not listed as documents
    assert_eq!(h.store.document_count(), 0);
}

#[tokio::test]
async fn test_capped_user_is_refused_without_calling_model() {
    let h = harness(FakeProvider::new().with_default_response(&sample_recipe_json()));
    let caller = free_user(&h, 2);

    h.orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap();
    assert_eq!(h.provider.calls(), 1);

    let err = h
        .orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 403);
    assert!(err.limit_reached());
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 3);
}

#[tokio::test]
async fn test_failed_generation_does_not_consume_quota() {
    let h = harness(FakeProvider::new().with_default_response("no json at all"));
    let caller = free_user(&h, 1);

    let err = h
        .orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::InvalidArtifact(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 1);
}

#[tokio::test]
async fn test_rate_limit_surfaces_as_429() {
    let h = harness(FakeProvider::scripted(
        (0..3).map(|_| Err(LlmError::RateLimited {
            retry_after_secs: Some(10),
        })),
    ));
    let caller = free_user(&h, 0);

    let err = h
        .orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap_err();

    assert!(err.rate_limited());
    assert_eq!(err.status_code(), 429);
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 0);
}

#[tokio::test]
async fn test_invalid_request_rejected_before_quota() {
    let h = harness(FakeProvider::new().with_default_response(&sample_recipe_json()));
    let caller = free_user(&h, 3);

    let request = RecipeRequest {
        seasonal_ingredients: vec![],
        ..recipe_request()
    };
    let err = h
        .orchestrator
        .generate_recipe(caller, &request)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn test_over_long_focus_rejected_before_generation() {
    let h = harness(FakeProvider::new().with_default_response(&sample_meal_plan_json()));
    let caller = premium_user(&h);

    let request = MealPlanRequest {
        seasonal_focus: "a".repeat(300),
        ..meal_plan_request()
    };
    let err = h
        .orchestrator
        .generate_meal_plan(caller, &request)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(h.provider.calls(), 0);
    assert_eq!(h.store.meal_plan_count(), 0);
    assert!(h.blobs.is_empty());
}

#[tokio::test]
async fn test_meal_plan_requires_premium() {
    let h = harness(FakeProvider::new().with_default_response(&sample_meal_plan_json()));
    let caller = free_user(&h, 0);
    let before = h.ledger.get(caller.user_id).unwrap();

    let err = h
        .orchestrator
        .generate_meal_plan(caller, &meal_plan_request())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 403);
    assert!(err.premium_required());
    assert_eq!(h.provider.calls(), 0);
    assert_eq!(h.ledger.get(caller.user_id).unwrap(), before);
}

#[tokio::test]
async fn test_premium_meal_plan_is_saved_with_document() {
    let h = harness(FakeProvider::new().with_default_response(&sample_meal_plan_json()));
    let caller = premium_user(&h);

    let outcome = h
        .orchestrator
        .generate_meal_plan(caller, &meal_plan_request())
        .await
        .unwrap();

    assert_eq!(outcome.meal_plan.meals.len(), 5);
    assert_eq!(outcome.pdf_status, PdfStatus::Generated);

    let saved = h
        .store
        .get_meal_plan(caller.user_id, outcome.meal_plan_id)
        .await
        .unwrap();
    assert_eq!(saved.title, "Autumn 5-Day Meal Plan");
    assert_eq!(saved.pdf_url, outcome.pdf_url);

    let documents = h.store.list_documents(caller.user_id).await.unwrap();
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "Autumn 5-Day Meal Plan");
    assert!(documents[0]
        .storage_key
        .starts_with(&format!("meal-plans/{}/autumn-meal-plan-", caller.user_id)));
    assert!(h.blobs.contains(&documents[0].storage_key));

    // Premium usage is never counted
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 0);
}

#[tokio::test]
async fn test_render_failure_still_returns_artifact() {
    let h = harness(FakeProvider::new().with_default_response(&sample_recipe_json()));
    h.blobs.set_fail_puts(true);
    let caller = free_user(&h, 0);

    let outcome = h
        .orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap();

    assert_eq!(outcome.pdf_url, None);
    assert_eq!(outcome.pdf_status, PdfStatus::Failed);
    assert!(!outcome.recipe.ingredients.is_empty());
    assert_eq!(h.ledger.get(caller.user_id).unwrap().generations_used, 1);
}

#[tokio::test]
async fn test_meal_plan_saved_without_pdf_when_render_fails() {
    let h = harness(FakeProvider::new().with_default_response(&sample_meal_plan_json()));
    h.blobs.set_fail_puts(true);
    let caller = premium_user(&h);

    let outcome = h
        .orchestrator
        .generate_meal_plan(caller, &meal_plan_request())
        .await
        .unwrap();

    assert_eq!(outcome.pdf_status, PdfStatus::Failed);
    let saved = h
        .store
        .get_meal_plan(caller.user_id, outcome.meal_plan_id)
        .await
        .unwrap();
    assert_eq!(saved.pdf_url, None);
    assert_eq!(h.store.document_count(), 0);
}

#[tokio::test]
async fn test_opting_out_skips_render() {
    let h = harness(FakeProvider::new().with_default_response(&sample_recipe_json()));
    let caller = free_user(&h, 0);
    let request = RecipeRequest {
        generate_pdf: Some(false),
        ..recipe_request()
    };

    let outcome = h.orchestrator.generate_recipe(caller, &request).await.unwrap();

    assert_eq!(outcome.pdf_status, PdfStatus::Skipped);
    assert!(h.blobs.is_empty());
}

#[derive(Debug)]
struct StalledProvider;

#[async_trait]
impl LlmProvider for StalledProvider {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String, LlmError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(sample_recipe_json())
    }

    fn provider_name(&self) -> &'static str {
        "stalled"
    }
}

#[derive(Debug)]
struct StalledRenderer;

#[async_trait]
impl ArtifactRenderer for StalledRenderer {
    async fn render(
        &self,
        _artifact: &Artifact,
        _user_id: Uuid,
        _context: &RenderContext,
    ) -> Result<String, RenderError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok("https://files.test/late.pdf".to_string())
    }
}

#[tokio::test(start_paused = true)]
async fn test_generation_deadline_is_fatal() {
    let ledger = Arc::new(InMemoryQuotaLedger::new());
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    ledger.insert(user_id, QuotaRecord::new_free(Utc::now()));

    let client = GenerationClient::new(
        Arc::new(StalledProvider),
        ModelSelection::default(),
        RetryPolicy::immediate(),
    );
    let orchestrator =
        GenerationOrchestrator::new(client, ledger.clone(), Arc::new(StalledRenderer), store)
            .with_timeouts(Timeouts {
                generation: Duration::from_secs(5),
                render: Duration::from_secs(5),
            });

    let caller = Caller {
        user_id,
        tier: SubscriptionTier::Free,
    };
    let err = orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::Timeout(5)));
    assert_eq!(ledger.get(user_id).unwrap().generations_used, 0);
}

#[tokio::test(start_paused = true)]
async fn test_render_deadline_degrades_to_no_pdf() {
    let provider = Arc::new(FakeProvider::new().with_default_response(&sample_recipe_json()));
    let ledger = Arc::new(InMemoryQuotaLedger::new());
    let store = Arc::new(MemoryStore::new());
    let user_id = Uuid::new_v4();
    ledger.insert(user_id, QuotaRecord::new_free(Utc::now()));

    let client = GenerationClient::new(provider, ModelSelection::default(), RetryPolicy::immediate());
    let orchestrator =
        GenerationOrchestrator::new(client, ledger.clone(), Arc::new(StalledRenderer), store)
            .with_timeouts(Timeouts {
                generation: Duration::from_secs(60),
                render: Duration::from_secs(5),
            });

    let caller = Caller {
        user_id,
        tier: SubscriptionTier::Free,
    };
    let outcome = orchestrator
        .generate_recipe(caller, &recipe_request())
        .await
        .unwrap();

    assert_eq!(outcome.pdf_status, PdfStatus::Failed);
    assert_eq!(outcome.pdf_url, None);
    assert_eq!(ledger.get(user_id).unwrap().generations_used, 1);
}
