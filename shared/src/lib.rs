//! Meal Planner Shared Library
//!
//! Core planning logic shared by the backend and the WASM module: WHOOP
//! record analysis, weekly meal selection, models, and validation.

pub mod errors;
pub mod formatting;
pub mod meal_selection;
pub mod models;
pub mod validation;
pub mod whoop_analysis;

// Re-export commonly used items
pub use errors::*;
pub use meal_selection::{
    resolve_options, select_meals, select_meals_with_min_pool, MealSelection, SelectionOptions,
    WeeklyMealPlan, MIN_POOL_SIZE,
};
pub use models::*;
pub use whoop_analysis::{analyze, whoop_insights, WhoopAnalysis};
