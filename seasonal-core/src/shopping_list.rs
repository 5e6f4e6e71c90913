//! Shopping list grouping for meal plan documents.
//!
//! Items are placed in one of five store sections. A section hint written by
//! the model in parentheses ("Kale (Produce section)") wins; otherwise the item
//! is matched against the keywords in `data/shopping_sections.json`.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ShoppingCategory {
    Produce,
    #[serde(rename = "Meat & Seafood")]
    MeatSeafood,
    #[serde(rename = "Dairy & Eggs")]
    DairyEggs,
    Pantry,
    Other,
}

impl ShoppingCategory {
    /// Display order in the shopping list.
    pub const ALL: [ShoppingCategory; 5] = [
        ShoppingCategory::Produce,
        ShoppingCategory::MeatSeafood,
        ShoppingCategory::DairyEggs,
        ShoppingCategory::Pantry,
        ShoppingCategory::Other,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ShoppingCategory::Produce => "Produce",
            ShoppingCategory::MeatSeafood => "Meat & Seafood",
            ShoppingCategory::DairyEggs => "Dairy & Eggs",
            ShoppingCategory::Pantry => "Pantry",
            ShoppingCategory::Other => "Other",
        }
    }
}

#[derive(Deserialize)]
struct SectionData {
    categories: HashMap<String, ShoppingCategory>,
}

/// Keywords sorted longest first so "butternut squash" beats "butter".
static KEYWORDS: LazyLock<Vec<(String, ShoppingCategory)>> = LazyLock::new(|| {
    let json = include_str!("../data/shopping_sections.json");
    let data: SectionData =
        serde_json::from_str(json).expect("Failed to parse shopping_sections.json");

    let mut keywords: Vec<(String, ShoppingCategory)> = data.categories.into_iter().collect();
    keywords.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    keywords
});

/// Map a store-section hint ("Produce section", "Dairy") to a category.
fn hint_category(hint: &str) -> Option<ShoppingCategory> {
    let hint = hint.to_lowercase();
    let hint = hint
        .trim()
        .trim_end_matches("section")
        .trim_end_matches("aisle")
        .trim();

    let matches = |words: &[&str]| words.iter().any(|w| hint.contains(w));
    if matches(&["produce", "vegetable", "fruit"]) {
        Some(ShoppingCategory::Produce)
    } else if matches(&["meat", "seafood", "fish", "butcher", "deli"]) {
        Some(ShoppingCategory::MeatSeafood)
    } else if matches(&["dairy", "egg", "cheese"]) {
        Some(ShoppingCategory::DairyEggs)
    } else if matches(&["pantry", "canned", "dry goods", "baking", "spice", "grain"]) {
        Some(ShoppingCategory::Pantry)
    } else if matches(&["other", "bakery", "frozen", "misc"]) {
        Some(ShoppingCategory::Other)
    } else {
        None
    }
}

/// Split a trailing "(...)" group off `item`, if there is one.
fn split_hint(item: &str) -> Option<(&str, &str)> {
    let trimmed = item.trim_end();
    let body = trimmed.strip_suffix(')')?;
    let open = body.rfind('(')?;
    Some((body[..open].trim_end(), &body[open + 1..]))
}

/// Categorize one shopping list entry.
///
/// Returns the category and the item text with any recognized section hint
/// removed. Unrecognized parentheticals ("Butter (unsalted)") are kept.
pub fn categorize(item: &str) -> (ShoppingCategory, String) {
    if let Some((text, hint)) = split_hint(item) {
        if let Some(category) = hint_category(hint) {
            return (category, text.to_string());
        }
    }

    let lower = item.to_lowercase();
    let category = KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword.as_str()))
        .map(|(_, category)| *category)
        .unwrap_or(ShoppingCategory::Other);

    (category, item.trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingSection {
    pub category: ShoppingCategory,
    pub items: Vec<String>,
}

/// Group items into sections in display order. Empty sections are left out
/// and every item lands in exactly one section.
pub fn group(items: &[String]) -> Vec<ShoppingSection> {
    let mut buckets: HashMap<ShoppingCategory, Vec<String>> = HashMap::new();
    for item in items {
        let (category, text) = categorize(item);
        buckets.entry(category).or_default().push(text);
    }

    ShoppingCategory::ALL
        .iter()
        .filter_map(|category| {
            buckets.remove(category).map(|items| ShoppingSection {
                category: *category,
                items,
            })
        })
        .collect()
}
