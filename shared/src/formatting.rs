//! Display helpers for library meals
//!
//! One home for the ingredient, instruction and nutrition text used by API
//! responses and plan exports.

use crate::models::{Ingredient, NutritionFacts};

/// Format one ingredient as "quantity item (optional) - notes"
pub fn format_ingredient(ingredient: &Ingredient) -> String {
    let mut line = match ingredient.quantity.trim() {
        "" => ingredient.item.trim().to_string(),
        quantity => format!("{} {}", quantity, ingredient.item.trim()),
    };
    if ingredient.optional {
        line.push_str(" (optional)");
    }
    if let Some(notes) = ingredient.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        line.push_str(" - ");
        line.push_str(notes);
    }
    line
}

/// Bullet list of ingredients, one per line
pub fn format_ingredients(ingredients: &[Ingredient]) -> String {
    ingredients
        .iter()
        .map(|i| format!("- {}", format_ingredient(i)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered preparation steps, one per line
pub fn format_instructions(steps: &[String]) -> String {
    steps
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Compact single-line nutrition summary
pub fn format_nutrition(nutrition: &NutritionFacts) -> String {
    let mut parts = vec![
        format!("{:.0} kcal", nutrition.calories),
        format!("P {:.0}g", nutrition.protein_g),
        format!("C {:.0}g", nutrition.carbs_g),
        format!("F {:.0}g", nutrition.fat_g),
    ];
    if nutrition.fiber_g > 0.0 {
        parts.push(format!("Fiber {:.0}g", nutrition.fiber_g));
    }
    if nutrition.sodium_mg > 0.0 {
        parts.push(format!("Na {:.0}mg", nutrition.sodium_mg));
    }
    parts.join(" | ")
}
