use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Longest name we accept from the model before treating the output as garbage.
const MAX_NAME_LEN: usize = 200;
/// Longest free-text label (difficulty, times) we accept from the model.
const MAX_LABEL_LEN: usize = 80;

/// Number of dinners in a generated meal plan (Monday through Friday).
pub const MEAL_PLAN_DAYS: usize = 5;

/// Weekday names used for meal plan days, in order.
pub const WEEKDAYS: [&str; MEAL_PLAN_DAYS] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

/// Subscription level of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(SubscriptionTier::Free),
            "premium" => Some(SubscriptionTier::Premium),
            _ => None,
        }
    }

    pub fn is_premium(&self) -> bool {
        matches!(self, SubscriptionTier::Premium)
    }
}

/// The kind of artifact a generation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Recipe,
    MealPlan,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Recipe => "recipe",
            ArtifactKind::MealPlan => "meal_plan",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "recipe" => Some(ArtifactKind::Recipe),
            "meal_plan" => Some(ArtifactKind::MealPlan),
            _ => None,
        }
    }

    /// Top-level folder for rendered documents of this kind.
    pub fn storage_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::Recipe => "recipes",
            ArtifactKind::MealPlan => "meal-plans",
        }
    }
}

/// The authenticated user a generation runs on behalf of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub tier: SubscriptionTier,
}

/// Request body for generating a single recipe.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RecipeRequest {
    pub dietary_restrictions: Vec<String>,
    pub preferences: Vec<String>,
    pub seasonal_ingredients: Vec<String>,
    pub meal_type: String,
    pub servings: u32,
    #[serde(rename = "generatePDF", skip_serializing_if = "Option::is_none")]
    pub generate_pdf: Option<bool>,
}

/// Request body for generating a five-day meal plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct MealPlanRequest {
    pub dietary_restrictions: Vec<String>,
    pub preferences: Vec<String>,
    pub seasonal_focus: String,
    pub servings_per_meal: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
    #[serde(rename = "generatePDF", skip_serializing_if = "Option::is_none")]
    pub generate_pdf: Option<bool>,
}

/// Nutrition summary attached to a recipe.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    pub calories: Option<u32>,
    #[serde(default)]
    pub protein: String,
    #[serde(default)]
    pub fiber: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

/// A generated recipe.
///
/// Labels such as difficulty and the time strings are free text; the model is
/// not held to a fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub prep_time: String,
    #[serde(default)]
    pub cook_time: String,
    #[serde(default)]
    pub total_time: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub servings: u32,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_note: Option<String>,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutrition: Option<Nutrition>,
}

impl Recipe {
    /// Structural checks on model output. Returns a description of the first problem.
    pub fn validate(&self) -> Result<(), String> {
        check_text("name", &self.name, MAX_NAME_LEN)?;
        for (field, value) in [
            ("difficulty", &self.difficulty),
            ("prepTime", &self.prep_time),
            ("cookTime", &self.cook_time),
            ("totalTime", &self.total_time),
        ] {
            if value.chars().count() > MAX_LABEL_LEN {
                return Err(format!("{} is longer than {} characters", field, MAX_LABEL_LEN));
            }
        }
        if !self.ingredients.iter().any(|i| !i.trim().is_empty()) {
            return Err("recipe has no ingredients".to_string());
        }
        if !self.instructions.iter().any(|i| !i.trim().is_empty()) {
            return Err("recipe has no instructions".to_string());
        }
        Ok(())
    }
}

/// A generated five-day meal plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub meals: Vec<Recipe>,
    #[serde(default)]
    pub shopping_list: Vec<String>,
    #[serde(default)]
    pub total_estimated_cost: String,
    #[serde(default)]
    pub prep_tips: Vec<String>,
    #[serde(default)]
    pub leftover_ideas: Vec<String>,
}

impl MealPlan {
    pub fn validate(&self) -> Result<(), String> {
        if self.meals.len() != MEAL_PLAN_DAYS {
            return Err(format!(
                "meal plan has {} meals, expected {}",
                self.meals.len(),
                MEAL_PLAN_DAYS
            ));
        }
        for (day, meal) in WEEKDAYS.iter().zip(&self.meals) {
            meal.validate().map_err(|e| format!("{}: {}", day, e))?;
        }
        Ok(())
    }
}

/// A parsed, validated artifact.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Recipe(Recipe),
    MealPlan(MealPlan),
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Recipe(_) => ArtifactKind::Recipe,
            Artifact::MealPlan(_) => ArtifactKind::MealPlan,
        }
    }
}

fn check_text(field: &str, value: &str, max_len: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is empty", field));
    }
    if value.chars().count() > max_len {
        return Err(format!("{} is longer than {} characters", field, max_len));
    }
    Ok(())
}

/// Models sometimes emit counts as strings ("4", "about 450 kcal").
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl NumberOrText {
    fn to_u32(&self) -> Option<u32> {
        match self {
            NumberOrText::Number(n) if *n >= 0.0 => Some(n.round() as u32),
            NumberOrText::Number(_) => None,
            NumberOrText::Text(s) => {
                let digits: String = s
                    .chars()
                    .skip_while(|c| !c.is_ascii_digit())
                    .take_while(|c| c.is_ascii_digit())
                    .collect();
                digits.parse().ok()
            }
        }
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.to_u32()).unwrap_or_default())
}

fn lenient_opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.to_u32()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe_json() -> serde_json::Value {
        serde_json::json!({
            "name": "Roasted Butternut Squash Soup",
            "prepTime": "15 minutes",
            "cookTime": "45 minutes",
            "totalTime": "1 hour",
            "servings": "4",
            "difficulty": "Easy",
            "ingredients": ["1 butternut squash", "2 tbsp olive oil"],
            "instructions": ["Roast the squash.", "Blend with stock."],
            "nutrition": {"calories": "about 320", "protein": "6g", "fiber": "5g", "highlights": []}
        })
    }

    #[test]
    fn test_recipe_accepts_string_numbers() {
        let recipe: Recipe = serde_json::from_value(recipe_json()).unwrap();
        assert_eq!(recipe.servings, 4);
        assert_eq!(recipe.nutrition.unwrap().calories, Some(320));
        assert!(recipe.tips.is_empty());
    }

    #[test]
    fn test_recipe_serializes_camel_case() {
        let recipe: Recipe = serde_json::from_value(recipe_json()).unwrap();
        let value = serde_json::to_value(&recipe).unwrap();
        assert_eq!(value["prepTime"], "15 minutes");
        assert!(value.get("seasonalNote").is_none());
    }

    #[test]
    fn test_recipe_requires_ingredients() {
        let mut value = recipe_json();
        value["ingredients"] = serde_json::json!(["  "]);
        let recipe: Recipe = serde_json::from_value(value).unwrap();
        assert_eq!(recipe.validate().unwrap_err(), "recipe has no ingredients");
    }

    #[test]
    fn test_recipe_rejects_blank_name() {
        let mut value = recipe_json();
        value["name"] = serde_json::json!("");
        let recipe: Recipe = serde_json::from_value(value).unwrap();
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn test_free_text_difficulty_is_fine() {
        let mut value = recipe_json();
        value["difficulty"] = serde_json::json!("Easy enough for a weeknight");
        let recipe: Recipe = serde_json::from_value(value).unwrap();
        assert!(recipe.validate().is_ok());
    }

    #[test]
    fn test_meal_plan_needs_five_meals() {
        let recipe: Recipe = serde_json::from_value(recipe_json()).unwrap();
        let plan = MealPlan {
            meals: vec![recipe; 4],
            shopping_list: vec![],
            total_estimated_cost: String::new(),
            prep_tips: vec![],
            leftover_ideas: vec![],
        };
        assert_eq!(
            plan.validate().unwrap_err(),
            "meal plan has 4 meals, expected 5"
        );
    }

    #[test]
    fn test_request_defaults_missing_fields() {
        let request: RecipeRequest =
            serde_json::from_str(r#"{"mealType": "dinner", "generatePDF": false}"#).unwrap();
        assert_eq!(request.meal_type, "dinner");
        assert_eq!(request.servings, 0);
        assert!(request.seasonal_ingredients.is_empty());
        assert_eq!(request.generate_pdf, Some(false));
    }

    #[test]
    fn test_tier_round_trip() {
        assert_eq!(SubscriptionTier::parse("PREMIUM"), Some(SubscriptionTier::Premium));
        assert_eq!(SubscriptionTier::Free.as_str(), "free");
        assert_eq!(SubscriptionTier::parse("gold"), None);
    }
}
