//! Fake LLM provider for tests and local development.
//!
//! Responses come from, in order: a script of queued results, prompt-substring
//! matches, then an optional default. Every call is counted and recorded so
//! tests can assert how many attempts were made.

use super::{CompletionRequest, LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct FakeProvider {
    /// Results returned one per call before any matching happens.
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    /// Prompt substring -> response, checked in insertion order.
    responses: Mutex<Vec<(String, String)>>,
    default_response: Option<String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that returns `results` in order, one per call.
    pub fn scripted(results: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        let provider = Self::new();
        lock(&provider.script).extend(results);
        provider
    }

    /// Provider that returns `response` for prompts containing `prompt_contains`.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        lock(&self.responses).push((prompt_contains.to_lowercase(), response.to_string()));
    }

    pub fn push_result(&self, result: Result<String, LlmError>) {
        lock(&self.script).push_back(result);
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Canned recipe and meal plan replies so the server runs without an API key.
    pub fn with_sample_responses() -> Self {
        let provider = Self::new();
        provider.add_response("meal plan", &sample_meal_plan_json());
        provider.add_response("recipe", &sample_recipe_json());
        provider
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if let Some(result) = lock(&self.script).pop_front() {
            return result;
        }

        let prompt = request.prompt().to_lowercase();
        for (pattern, response) in lock(&self.responses).iter() {
            if prompt.contains(pattern) {
                return Ok(response.clone());
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "FakeProvider: No response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

fn sample_recipe_value(name: &str, main: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "prepTime": "15 minutes",
        "cookTime": "30 minutes",
        "totalTime": "45 minutes",
        "servings": 4,
        "difficulty": "Easy",
        "seasonalNote": "Autumn squash is at its sweetest right now.",
        "ingredients": [
            format!("2 pounds {}", main),
            "2 tablespoons good olive oil",
            "1 yellow onion, diced",
            "Kosher salt and freshly ground black pepper"
        ],
        "instructions": [
            "Preheat the oven to 400 degrees.",
            format!("Toss the {} with olive oil, salt and pepper.", main),
            "Roast for 30 minutes, turning once, until browned."
        ],
        "tips": ["Roast a double batch and keep half for lunches."],
        "nutrition": {
            "calories": 320,
            "protein": "8g",
            "fiber": "6g",
            "highlights": ["Excellent source of vitamin A"]
        }
    })
}

/// A well-formed recipe reply, wrapped in the kind of prose models add.
pub fn sample_recipe_json() -> String {
    format!(
        "Here is your recipe:\n\n{}\n\nEnjoy!",
        sample_recipe_value("Roasted Butternut Squash", "butternut squash")
    )
}

/// A well-formed five-day meal plan reply.
pub fn sample_meal_plan_json() -> String {
    let mains = [
        ("Roasted Chicken with Root Vegetables", "chicken thighs"),
        ("Butternut Squash Risotto", "butternut squash"),
        ("Maple Glazed Salmon", "salmon fillets"),
        ("Apple and Cheddar Galette", "apples"),
        ("Beef and Barley Stew", "beef chuck"),
    ];
    let meals: Vec<serde_json::Value> = mains
        .iter()
        .map(|(name, main)| sample_recipe_value(name, main))
        .collect();

    serde_json::json!({
        "meals": meals,
        "shoppingList": [
            "2 pounds chicken thighs (Meat section)",
            "1 butternut squash (Produce section)",
            "1 pound salmon fillets",
            "4 apples (Produce)",
            "8 ounces sharp cheddar",
            "1 cup pearl barley (Pantry)",
            "Olive oil",
            "Maple syrup"
        ],
        "totalEstimatedCost": "$85-95",
        "prepTips": ["Roast all the vegetables on Sunday."],
        "leftoverIdeas": ["Turn leftover chicken into soup."]
    })
    .to_string()
}
