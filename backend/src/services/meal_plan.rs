//! Weekly meal plan generation
//!
//! Combines the user's WHOOP analysis with the image-ready meal library,
//! caches the result per user, and exports cached plans as CSV.

use crate::cache::CachedPlan;
use crate::error::ApiError;
use crate::services::{MealLibraryService, WhoopService};
use crate::state::AppState;
use chrono::Utc;
use meal_planner_shared::formatting::{format_ingredients, format_instructions, format_nutrition};
use meal_planner_shared::{resolve_options, select_meals_with_min_pool, SelectionOptions};
use serde::Serialize;
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// A plan plus whether it came from the cache
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub plan: CachedPlan,
    pub from_cache: bool,
}

/// One CSV row per filled slot
#[derive(Debug, Serialize)]
struct PlanExportRow<'a> {
    day: &'a str,
    meal_type: &'a str,
    name: &'a str,
    tagline: &'a str,
    serving_size: &'a str,
    calories: f64,
    protein_g: f64,
    carbs_g: f64,
    fat_g: f64,
    nutrition: String,
    tags: String,
    ingredients: String,
    instructions: String,
    image_url: &'a str,
    repeated: bool,
}

/// True when a cached plan was generated with the same filters
fn same_filters(cached: &SelectionOptions, requested: &SelectionOptions) -> bool {
    cached.slot_types() == requested.slot_types()
        && cached.tags == requested.tags
        && cached.exclude_tags == requested.exclude_tags
        && cached.max_results() == requested.max_results()
}

pub struct MealPlanService;

impl MealPlanService {
    /// Return the cached plan when it still matches, otherwise generate one
    pub async fn generate(
        state: &AppState,
        user_id: Uuid,
        options: SelectionOptions,
    ) -> Result<GeneratedPlan, ApiError> {
        if !options.wants_fresh_selection() {
            if let Some(cached) = state.plans().get(user_id).await {
                if same_filters(&cached.options, &options) {
                    metrics::counter!("meal_plan_cache_hits_total").increment(1);
                    return Ok(GeneratedPlan {
                        plan: cached,
                        from_cache: true,
                    });
                }
            }
            metrics::counter!("meal_plan_cache_misses_total").increment(1);
        }

        let started = Instant::now();
        let options = resolve_options(options, Utc::now().timestamp_millis());
        let planner = &state.config().planner;

        let analysis =
            WhoopService::analysis(state.db(), user_id, planner.analysis_window_days).await?;
        let pool = MealLibraryService::planning_pool(state.db()).await?;
        let selection =
            select_meals_with_min_pool(&analysis, &pool, &options, planner.min_pool_size)?;

        let validation = &selection.image_class_validation;
        if !validation.is_valid {
            warn!(
                %user_id,
                violations = validation.violations.len(),
                unfilled = validation.unfilled_slots.len(),
                "Generated plan failed image class validation"
            );
        }

        let fresh = if options.wants_fresh_selection() { "true" } else { "false" };
        metrics::counter!("meal_plans_generated_total", "fresh" => fresh).increment(1);
        metrics::histogram!("meal_plan_generation_seconds").record(started.elapsed().as_secs_f64());
        info!(
            %user_id,
            seed = selection.meals.seed,
            slots = selection.meals.slot_count(),
            unique_meals = selection.meals.unique_meal_count(),
            whoop_days = analysis.record_count,
            "Generated meal plan"
        );

        let plan = CachedPlan {
            generated_at: Utc::now(),
            analysis,
            options,
            selection,
        };
        state.plans().insert(user_id, plan.clone()).await;

        Ok(GeneratedPlan {
            plan,
            from_cache: false,
        })
    }

    pub async fn current(state: &AppState, user_id: Uuid) -> Result<CachedPlan, ApiError> {
        state
            .plans()
            .get(user_id)
            .await
            .ok_or_else(|| ApiError::NotFound("No meal plan has been generated yet".to_string()))
    }

    pub async fn clear(state: &AppState, user_id: Uuid) -> bool {
        state.plans().evict(user_id).await
    }

    /// Render a plan as CSV, one row per filled slot
    pub fn to_csv(plan: &CachedPlan) -> Result<String, ApiError> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for slot in plan.selection.meals.slots() {
            let meal = &slot.meal;
            wtr.serialize(PlanExportRow {
                day: &slot.day,
                meal_type: slot.meal_type.label(),
                name: &meal.name,
                tagline: meal.tagline.as_deref().unwrap_or_default(),
                serving_size: meal.serving_size.as_deref().unwrap_or_default(),
                calories: meal.nutrition.calories,
                protein_g: meal.nutrition.protein_g,
                carbs_g: meal.nutrition.carbs_g,
                fat_g: meal.nutrition.fat_g,
                nutrition: format_nutrition(&meal.nutrition),
                tags: meal.tags.join(", "),
                ingredients: format_ingredients(&meal.ingredients),
                instructions: format_instructions(&meal.instructions),
                image_url: meal.image_url.as_deref().unwrap_or_default(),
                repeated: slot.reused,
            })
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV flush error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("CSV encoding error: {}", e)))
    }
}
