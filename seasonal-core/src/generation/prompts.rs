//! Prompt templates for recipe and meal plan generation.

use crate::types::{MealPlanRequest, RecipeRequest, MEAL_PLAN_DAYS};

/// Budget used in the meal plan prompt when the request leaves it out.
pub const DEFAULT_BUDGET: &str = "moderate";

const RECIPE_SCHEMA: &str = r#"{
  "name": "string",
  "prepTime": "string, e.g. 15 minutes",
  "cookTime": "string",
  "totalTime": "string",
  "servings": integer,
  "difficulty": "Easy, Medium or Hard",
  "seasonalNote": "string or null",
  "ingredients": ["string"],
  "instructions": ["string"],
  "tips": ["string"],
  "nutrition": {
    "calories": integer (approximate, per serving),
    "protein": "string (approximate, per serving)",
    "fiber": "string (approximate, per serving)",
    "highlights": ["string"]
  }
}"#;

pub fn recipe_system_prompt() -> String {
    r#"You are a chef who writes seasonal, family-friendly recipes for home cooks.

Your recipes:
- Build on fresh ingredients that are in season right now
- Use simple techniques and ordinary kitchen equipment
- Explain each step in a warm, encouraging voice
- Include practical make-ahead and storage tips
- Suggest easy adaptations for children and picky eaters
- Mention nutritional highlights without counting every calorie

Flavor comes first, but every recipe must be realistic for a weeknight kitchen."#
        .to_string()
}

pub fn meal_plan_system_prompt() -> String {
    r#"You are a meal planner who builds seasonal, family-friendly weekly menus.

Your plans:
- Share seasonal ingredients across several dinners so little goes to waste
- Turn leftovers into new meals
- Balance nutrition across the week
- Give honest preparation time estimates
- Organize the shopping list by grocery store section
- Point out components that can be made ahead

The week should feel cohesive while each dinner still feels different."#
        .to_string()
}

fn list_or(items: &[String], fallback: &str) -> String {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.join(", ")
    }
}

/// Render the user message for a single recipe.
pub fn recipe_prompt(request: &RecipeRequest) -> String {
    format!(
        r#"Create a {meal_type} recipe for {servings} people built around these seasonal ingredients: {ingredients}.

Dietary restrictions: {restrictions}.
Flavor preferences: {preferences}.

The recipe should use ingredients found in an ordinary grocery store, need no special equipment, and include make-ahead tips where they apply.

Respond with JSON in exactly this shape:
{schema}"#,
        meal_type = request.meal_type.trim(),
        servings = request.servings,
        ingredients = list_or(&request.seasonal_ingredients, "whatever is in season"),
        restrictions = list_or(&request.dietary_restrictions, "None"),
        preferences = list_or(&request.preferences, "No specific preferences"),
        schema = RECIPE_SCHEMA,
    )
}

/// Render the user message for a five-day meal plan.
pub fn meal_plan_prompt(request: &MealPlanRequest) -> String {
    let budget = request
        .budget
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .unwrap_or(DEFAULT_BUDGET);

    format!(
        r#"Create a meal plan of {days} dinners, Monday through Friday, focused on {focus} seasonal ingredients for {servings} people.

Dietary restrictions: {restrictions}.
Flavor preferences: {preferences}.
Budget: {budget}. Let it guide ingredient choices and complexity.

Alongside the dinners, provide a combined shopping list where each item names its store section in parentheses, an estimated total cost, prep tips for the week, and ideas for leftovers.

Respond with JSON in exactly this shape, with exactly {days} entries in "meals":
{{
  "meals": [{schema}],
  "shoppingList": ["string, e.g. 2 lbs carrots (Produce section)"],
  "totalEstimatedCost": "string, e.g. $85-95",
  "prepTips": ["string"],
  "leftoverIdeas": ["string"]
}}"#,
        days = MEAL_PLAN_DAYS,
        focus = request.seasonal_focus.trim(),
        servings = request.servings_per_meal,
        restrictions = list_or(&request.dietary_restrictions, "None"),
        preferences = list_or(&request.preferences, "No specific preferences"),
        budget = budget,
        schema = RECIPE_SCHEMA,
    )
}
