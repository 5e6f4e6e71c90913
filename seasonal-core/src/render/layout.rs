//! Document model for recipe cards and meal plans.
//!
//! Layout decides what goes on the page and in which order. It knows nothing
//! about fonts or coordinates; [`super::pdf`] turns it into pages.

use crate::shopping_list;
use crate::types::{MealPlan, Recipe, WEEKDAYS};
use chrono::{DateTime, Utc};

/// Footer text printed on every page.
pub const FOOTER_TEXT: &str = "Created with Seasonally Simple - seasonallysimple.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Title(String),
    /// Major section heading ("Ingredients", "Shopping List").
    Heading(String),
    /// Minor heading ("Monday", "Produce").
    Subheading(String),
    Paragraph(String),
    /// Small print such as dates and metrics.
    Note(String),
    Bullet(String),
    Numbered(usize, String),
    /// A "Label: value" line.
    Labeled(String, String),
    Spacer,
}

/// Blocks that start on a fresh page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageGroup {
    pub blocks: Vec<Block>,
}

impl PageGroup {
    fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    fn bullets<'a>(&mut self, items: impl IntoIterator<Item = &'a String>) {
        for item in items {
            if !item.trim().is_empty() {
                self.push(Block::Bullet(item.trim().to_string()));
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    pub title: String,
    pub groups: Vec<PageGroup>,
}

pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%B %-d, %Y").to_string()
}

fn metrics_line(recipe: &Recipe) -> String {
    let mut parts = Vec::new();
    for (label, value) in [
        ("Prep", recipe.prep_time.as_str()),
        ("Cook", recipe.cook_time.as_str()),
        ("Total", recipe.total_time.as_str()),
    ] {
        if !value.trim().is_empty() {
            parts.push(format!("{}: {}", label, value.trim()));
        }
    }
    if recipe.servings > 0 {
        parts.push(format!("Serves {}", recipe.servings));
    }
    if !recipe.difficulty.trim().is_empty() {
        parts.push(recipe.difficulty.trim().to_string());
    }
    parts.join("  |  ")
}

/// The body of a recipe: everything below the date line.
fn recipe_body(group: &mut PageGroup, recipe: &Recipe) {
    group.push(Block::Title(recipe.name.trim().to_string()));
    if let Some(note) = recipe.seasonal_note.as_deref().filter(|n| !n.trim().is_empty()) {
        group.push(Block::Paragraph(note.trim().to_string()));
    }
    let metrics = metrics_line(recipe);
    if !metrics.is_empty() {
        group.push(Block::Note(metrics));
    }
    group.push(Block::Spacer);

    group.push(Block::Heading("Ingredients".to_string()));
    group.bullets(&recipe.ingredients);
    group.push(Block::Spacer);

    group.push(Block::Heading("Instructions".to_string()));
    let steps = recipe.instructions.iter().filter(|s| !s.trim().is_empty());
    for (i, step) in steps.enumerate() {
        group.push(Block::Numbered(i + 1, step.trim().to_string()));
    }

    if recipe.tips.iter().any(|t| !t.trim().is_empty()) {
        group.push(Block::Spacer);
        group.push(Block::Heading("Chef's Tips".to_string()));
        group.bullets(&recipe.tips);
    }

    if let Some(nutrition) = &recipe.nutrition {
        group.push(Block::Spacer);
        group.push(Block::Heading("Nutrition Highlights".to_string()));
        if let Some(calories) = nutrition.calories {
            group.push(Block::Labeled(
                "Calories".to_string(),
                format!("{} per serving", calories),
            ));
        }
        if !nutrition.protein.trim().is_empty() {
            group.push(Block::Labeled("Protein".to_string(), nutrition.protein.clone()));
        }
        if !nutrition.fiber.trim().is_empty() {
            group.push(Block::Labeled("Fiber".to_string(), nutrition.fiber.clone()));
        }
        group.bullets(&nutrition.highlights);
    }
}

/// A single recipe card.
pub fn recipe_card(recipe: &Recipe, generated_at: DateTime<Utc>) -> DocumentLayout {
    let mut group = PageGroup::default();
    group.push(Block::Note(format!("Generated on {}", format_date(generated_at))));
    recipe_body(&mut group, recipe);

    DocumentLayout {
        title: recipe.name.trim().to_string(),
        groups: vec![group],
    }
}

/// A meal plan: cover page, one page per dinner, then leftover ideas.
pub fn meal_plan(
    plan: &MealPlan,
    title: &str,
    seasonal_focus: &str,
    generated_at: DateTime<Utc>,
) -> DocumentLayout {
    let date = format_date(generated_at);
    let mut groups = Vec::with_capacity(plan.meals.len() + 2);

    let mut cover = PageGroup::default();
    cover.push(Block::Note(format!("Generated on {}", date)));
    cover.push(Block::Title(title.to_string()));
    cover.push(Block::Paragraph(format!(
        "A {} meal plan designed for simple, delicious cooking",
        seasonal_focus.trim()
    )));
    cover.push(Block::Spacer);

    cover.push(Block::Heading("Week at a Glance".to_string()));
    for (day, meal) in WEEKDAYS.iter().zip(&plan.meals) {
        cover.push(Block::Subheading(format!("{}: {}", day, meal.name.trim())));
        cover.push(Block::Note(format!(
            "{} prep  |  {} cook  |  {}",
            meal.prep_time.trim(),
            meal.cook_time.trim(),
            meal.difficulty.trim()
        )));
    }
    cover.push(Block::Spacer);

    cover.push(Block::Heading("Shopping List".to_string()));
    if !plan.total_estimated_cost.trim().is_empty() {
        cover.push(Block::Labeled(
            "Estimated Cost".to_string(),
            plan.total_estimated_cost.trim().to_string(),
        ));
    }
    for section in shopping_list::group(&plan.shopping_list) {
        cover.push(Block::Subheading(section.category.label().to_string()));
        cover.bullets(&section.items);
    }

    if plan.prep_tips.iter().any(|t| !t.trim().is_empty()) {
        cover.push(Block::Spacer);
        cover.push(Block::Heading("Preparation Tips".to_string()));
        cover.bullets(&plan.prep_tips);
    }
    groups.push(cover);

    for (index, meal) in plan.meals.iter().enumerate() {
        let mut page = PageGroup::default();
        let day = WEEKDAYS[index % WEEKDAYS.len()];
        page.push(Block::Note(format!("{} - {}", day, date)));
        recipe_body(&mut page, meal);
        groups.push(page);
    }

    let mut leftovers = PageGroup::default();
    leftovers.push(Block::Note(format!("Generated on {}", date)));
    leftovers.push(Block::Heading("Leftover Ideas".to_string()));
    leftovers.push(Block::Paragraph(
        "Make the most of your ingredients with these ideas for leftovers:".to_string(),
    ));
    let ideas = plan.leftover_ideas.iter().filter(|i| !i.trim().is_empty());
    for (i, idea) in ideas.enumerate() {
        leftovers.push(Block::Labeled(format!("Idea {}", i + 1), idea.trim().to_string()));
    }
    groups.push(leftovers);

    DocumentLayout {
        title: title.to_string(),
        groups,
    }
}
