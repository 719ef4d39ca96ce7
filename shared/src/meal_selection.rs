//! Meal selection for weekly plans
//!
//! Turns a `WhoopAnalysis` and the meal library into a Monday-Sunday plan:
//!
//! 1. keep meals that have an image (at least `MIN_POOL_SIZE` required)
//! 2. apply caller meal-type and tag filters
//! 3. order by a seeded shuffle, meals matching analysis-preferred tags first
//! 4. spread the selection evenly across meal types
//! 5. fill day/slot pairs, reusing meals by a fixed index once a type runs out
//!
//! The same inputs and `timestamp` always give the same plan.

use crate::errors::{PlannerError, PlannerResult};
use crate::models::{ImageClass, LibraryMeal, MealType};
use crate::whoop_analysis::{
    whoop_insights, CarbTiming, EnergyDensity, NutritionalRecommendations, ProteinEmphasis,
    WhoopAnalysis,
};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Minimum number of image-bearing meals needed to build a plan
pub const MIN_POOL_SIZE: usize = 20;

/// Seven days of four slots
pub const DEFAULT_MAX_RESULTS: usize = 28;

/// Plan days in slot-walk order
pub const DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Seed used when the caller gives no timestamp
pub const BASE_SEED: u64 = 0x6d65_616c_706c_616e;

// ============================================================================
// Options
// ============================================================================

/// Caller options for a selection run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionOptions {
    /// Discard any cached plan and draw again
    pub regenerate: bool,
    /// Same effect as `regenerate`
    #[serde(alias = "forceNewSelection")]
    pub force_new_selection: bool,
    /// Seed for the pseudo-random ordering
    pub timestamp: Option<i64>,
    /// Slot types to plan; all four when absent or empty
    #[serde(alias = "mealTypes")]
    pub meal_types: Option<Vec<MealType>>,
    /// A meal must carry at least one of these tags
    pub tags: Vec<String>,
    /// A meal must carry none of these tags
    #[serde(alias = "excludeTags")]
    pub exclude_tags: Vec<String>,
    #[serde(alias = "maxResults")]
    pub max_results: Option<usize>,
}

impl SelectionOptions {
    pub fn wants_fresh_selection(&self) -> bool {
        self.regenerate || self.force_new_selection
    }

    pub fn seed(&self) -> u64 {
        self.timestamp.map(|t| t as u64).unwrap_or(BASE_SEED)
    }

    pub fn max_results(&self) -> usize {
        self.max_results
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_RESULTS)
    }

    /// Requested slot types in Breakfast, Lunch, Snack, Dinner order
    pub fn slot_types(&self) -> Vec<MealType> {
        match &self.meal_types {
            Some(types) if !types.is_empty() => MealType::ALL
                .into_iter()
                .filter(|t| types.contains(t))
                .collect(),
            _ => MealType::ALL.to_vec(),
        }
    }
}

/// Seed fresh draws from the caller's clock when no timestamp was given
pub fn resolve_options(mut options: SelectionOptions, now_millis: i64) -> SelectionOptions {
    if options.wants_fresh_selection() && options.timestamp.is_none() {
        options.timestamp = Some(now_millis);
    }
    options
}

// ============================================================================
// Output
// ============================================================================

/// One filled day/slot pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSlot {
    pub day: String,
    pub meal_type: MealType,
    pub meal: LibraryMeal,
    /// True when the meal already appeared earlier in the plan
    pub reused: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: String,
    pub slots: Vec<PlanSlot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyMealPlan {
    pub days: Vec<DayPlan>,
    /// Seed the plan was drawn with
    pub seed: u64,
}

impl WeeklyMealPlan {
    pub fn slots(&self) -> impl Iterator<Item = &PlanSlot> {
        self.days.iter().flat_map(|d| d.slots.iter())
    }

    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    pub fn unique_meal_count(&self) -> usize {
        self.slots().map(|s| s.meal.id).collect::<HashSet<_>>().len()
    }
}

/// Reference to a day/slot pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRef {
    pub day: String,
    pub meal_type: MealType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<Uuid>,
}

/// Image completeness report for a generated plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageClassValidation {
    pub total_slots: usize,
    pub class_a_slots: usize,
    pub class_b_slots: usize,
    /// Slots whose meal lacks an image
    pub violations: Vec<SlotRef>,
    /// Slots no meal could fill
    pub unfilled_slots: Vec<SlotRef>,
    pub is_valid: bool,
}

/// Full result of a selection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSelection {
    pub meals: WeeklyMealPlan,
    pub whoop_insights: String,
    pub selection_summary: String,
    pub image_class_validation: ImageClassValidation,
}

// ============================================================================
// Selection
// ============================================================================

/// Tags favoured by the analysis recommendations
pub fn preferred_tags(rec: &NutritionalRecommendations) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if rec.anti_inflammatory {
        tags.extend(["anti-inflammatory", "omega-3"]);
    }
    if rec.protein_emphasis == ProteinEmphasis::High {
        tags.push("high-protein");
    }
    if rec.hydration_focus {
        tags.push("hydrating");
    }
    match rec.energy_density {
        EnergyDensity::Light => tags.extend(["light", "low-calorie"]),
        EnergyDensity::High => tags.push("energy-dense"),
        EnergyDensity::Moderate => {}
    }
    match rec.carb_timing {
        CarbTiming::EveningFocused => tags.push("complex-carbs"),
        CarbTiming::AroundTraining => tags.extend(["pre-workout", "post-workout"]),
        CarbTiming::Balanced => {}
    }
    tags
}

/// Canonical id order, seeded shuffle, then preferred meals first
pub fn order_pool<'a>(
    mut meals: Vec<&'a LibraryMeal>,
    seed: u64,
    preferred: &[&str],
) -> Vec<&'a LibraryMeal> {
    meals.sort_by_key(|m| m.id);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    meals.shuffle(&mut rng);
    if !preferred.is_empty() {
        meals.sort_by_key(|m| !m.has_any_tag(preferred));
    }
    meals
}

fn passes_filters(meal: &LibraryMeal, slot_types: &[MealType], options: &SelectionOptions) -> bool {
    slot_types.iter().any(|t| meal.serves(*t))
        && (options.tags.is_empty() || meal.has_any_tag(&options.tags))
        && !meal.has_any_tag(&options.exclude_tags)
}

/// Spread an ordered pool evenly across meal types
///
/// Each primary meal type gets up to `max_results / distinct_types` meals in
/// pool order; remaining room is topped up from unused meals in pool order.
pub fn diversify<'a>(ordered: &[&'a LibraryMeal], max_results: usize) -> Vec<&'a LibraryMeal> {
    let mut groups: HashMap<MealType, Vec<&LibraryMeal>> = HashMap::new();
    for meal in ordered {
        if let Some(meal_type) = meal.primary_meal_type() {
            groups.entry(meal_type).or_default().push(meal);
        }
    }
    if groups.is_empty() || max_results == 0 {
        return Vec::new();
    }

    let per_type = (max_results / groups.len()).max(1);
    let mut selected: Vec<&LibraryMeal> = Vec::with_capacity(max_results);
    let mut taken: HashSet<Uuid> = HashSet::new();

    for meal_type in MealType::ALL {
        if let Some(group) = groups.get(&meal_type) {
            for meal in group.iter().take(per_type) {
                if taken.insert(meal.id) {
                    selected.push(meal);
                }
            }
        }
    }
    selected.truncate(max_results);

    for meal in ordered {
        if selected.len() >= max_results {
            break;
        }
        if meal.primary_meal_type().is_some() && taken.insert(meal.id) {
            selected.push(meal);
        }
    }
    selected
}

/// Fill every day/slot pair from the selection
///
/// Returns the plan plus the slots that no meal could fill.
fn assign_slots(
    selection: &[&LibraryMeal],
    filtered: &[&LibraryMeal],
    slot_types: &[MealType],
    seed: u64,
) -> (WeeklyMealPlan, Vec<SlotRef>) {
    let candidates: HashMap<MealType, Vec<&LibraryMeal>> = slot_types
        .iter()
        .map(|t| {
            let mut list: Vec<&LibraryMeal> =
                selection.iter().copied().filter(|m| m.serves(*t)).collect();
            if list.is_empty() {
                list = filtered.iter().copied().filter(|m| m.serves(*t)).collect();
            }
            (*t, list)
        })
        .collect();

    let slot_count = slot_types.len();
    let mut used: HashSet<Uuid> = HashSet::new();
    let mut unfilled = Vec::new();
    let mut days = Vec::with_capacity(DAYS.len());

    for (day_index, day) in DAYS.iter().enumerate() {
        let mut slots = Vec::with_capacity(slot_count);
        for (slot_index, meal_type) in slot_types.iter().enumerate() {
            let pool = candidates.get(meal_type).map(Vec::as_slice).unwrap_or(&[]);
            if pool.is_empty() {
                unfilled.push(SlotRef {
                    day: day.to_string(),
                    meal_type: *meal_type,
                    meal_id: None,
                });
                continue;
            }

            let (meal, reused) = match pool.iter().find(|m| !used.contains(&m.id)) {
                Some(fresh) => (*fresh, false),
                None => (pool[(day_index * slot_count + slot_index) % pool.len()], true),
            };
            used.insert(meal.id);
            slots.push(PlanSlot {
                day: day.to_string(),
                meal_type: *meal_type,
                meal: meal.clone(),
                reused,
            });
        }
        days.push(DayPlan {
            day: day.to_string(),
            slots,
        });
    }

    (WeeklyMealPlan { days, seed }, unfilled)
}

/// Check every planned meal carries an image
pub fn validate_image_classes(plan: &WeeklyMealPlan, unfilled: Vec<SlotRef>) -> ImageClassValidation {
    let mut class_a_slots = 0;
    let mut violations = Vec::new();
    for slot in plan.slots() {
        match slot.meal.image_class() {
            ImageClass::A => class_a_slots += 1,
            ImageClass::B => violations.push(SlotRef {
                day: slot.day.clone(),
                meal_type: slot.meal_type,
                meal_id: Some(slot.meal.id),
            }),
        }
    }
    ImageClassValidation {
        total_slots: plan.slot_count(),
        class_a_slots,
        class_b_slots: violations.len(),
        is_valid: violations.is_empty() && unfilled.is_empty(),
        violations,
        unfilled_slots: unfilled,
    }
}

fn build_summary(
    options: &SelectionOptions,
    preferred: &[&str],
    plan: &WeeklyMealPlan,
    pool_size: usize,
    eligible: usize,
    selected: usize,
) -> String {
    let slot_labels: Vec<&str> = options.slot_types().iter().map(|t| t.label()).collect();
    let mut parts = vec![format!(
        "Selected {} meals from {} image-ready library meals ({} awaiting images) for {} slots.",
        selected,
        eligible,
        pool_size - eligible,
        slot_labels.join(", ")
    )];
    if !options.tags.is_empty() {
        parts.push(format!("Required tags: {}.", options.tags.join(", ")));
    }
    if !options.exclude_tags.is_empty() {
        parts.push(format!("Excluded tags: {}.", options.exclude_tags.join(", ")));
    }
    if !preferred.is_empty() {
        parts.push(format!("Preferred from WHOOP analysis: {}.", preferred.join(", ")));
    }
    parts.push(if options.wants_fresh_selection() {
        format!("Fresh draw (seed {}).", plan.seed)
    } else {
        format!("Stable draw (seed {}).", plan.seed)
    });
    let reused = plan.slots().filter(|s| s.reused).count();
    if reused > 0 {
        parts.push(format!(
            "{} slots repeat a meal because their meal type ran out of fresh options.",
            reused
        ));
    }
    parts.join(" ")
}

/// Build a weekly plan with the default minimum pool size
pub fn select_meals(
    analysis: &WhoopAnalysis,
    pool: &[LibraryMeal],
    options: &SelectionOptions,
) -> PlannerResult<MealSelection> {
    select_meals_with_min_pool(analysis, pool, options, MIN_POOL_SIZE)
}

/// Build a weekly plan, requiring `min_pool_size` image-bearing meals
pub fn select_meals_with_min_pool(
    analysis: &WhoopAnalysis,
    pool: &[LibraryMeal],
    options: &SelectionOptions,
    min_pool_size: usize,
) -> PlannerResult<MealSelection> {
    analysis.validate()?;

    let eligible: Vec<&LibraryMeal> = pool.iter().filter(|m| m.has_image()).collect();
    if eligible.len() < min_pool_size {
        return Err(PlannerError::InsufficientPool {
            available: eligible.len(),
            required: min_pool_size,
        });
    }

    let slot_types = options.slot_types();
    let preferred = preferred_tags(&analysis.recommendations);
    let eligible_count = eligible.len();

    let filtered: Vec<&LibraryMeal> = order_pool(eligible, options.seed(), &preferred)
        .into_iter()
        .filter(|m| passes_filters(m, &slot_types, options))
        .collect();

    let selection = diversify(&filtered, options.max_results());
    let (plan, unfilled) = assign_slots(&selection, &filtered, &slot_types, options.seed());
    let image_class_validation = validate_image_classes(&plan, unfilled);
    let selection_summary = build_summary(
        options,
        &preferred,
        &plan,
        pool.len(),
        eligible_count,
        selection.len(),
    );

    Ok(MealSelection {
        meals: plan,
        whoop_insights: whoop_insights(analysis),
        selection_summary,
        image_class_validation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewLibraryMeal;
    use crate::whoop_analysis::{analyze, FatigueLevel};
    use crate::HealthRecord;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn meal(n: u128, meal_type: MealType, with_image: bool, tags: &[&str]) -> LibraryMeal {
        NewLibraryMeal {
            name: format!("{} #{}", meal_type, n),
            meal_type: meal_type.label().to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            image_url: with_image.then(|| format!("https://img.example.com/{}.png", n)),
            ..Default::default()
        }
        .into_meal(Uuid::from_u128(n))
    }

    /// `per_type` image-bearing meals for every meal type
    fn pool(per_type: usize) -> Vec<LibraryMeal> {
        let mut meals = Vec::new();
        let mut n = 1u128;
        for meal_type in MealType::ALL {
            for _ in 0..per_type {
                meals.push(meal(n, meal_type, true, &[]));
                n += 1;
            }
        }
        meals
    }

    #[test]
    fn test_resolve_options_seeds_fresh_draws() {
        let fresh = SelectionOptions {
            regenerate: true,
            ..Default::default()
        };
        assert_eq!(resolve_options(fresh, 1234).timestamp, Some(1234));

        let pinned = SelectionOptions {
            force_new_selection: true,
            timestamp: Some(7),
            ..Default::default()
        };
        assert_eq!(resolve_options(pinned, 1234).timestamp, Some(7));

        assert_eq!(resolve_options(SelectionOptions::default(), 1234).timestamp, None);
    }

    fn with_timestamp(ts: i64) -> SelectionOptions {
        SelectionOptions {
            regenerate: true,
            timestamp: Some(ts),
            ..Default::default()
        }
    }

    fn plan_ids(selection: &MealSelection) -> Vec<Uuid> {
        selection.meals.slots().map(|s| s.meal.id).collect()
    }

    #[test]
    fn test_twenty_meals_fill_all_28_slots() {
        let analysis = WhoopAnalysis::neutral();
        let meals = pool(5);
        let options = SelectionOptions {
            max_results: Some(28),
            ..Default::default()
        };

        let first = select_meals(&analysis, &meals, &options).unwrap();
        let second = select_meals(&analysis, &meals, &options).unwrap();

        assert_eq!(first.meals.slot_count(), 28);
        assert!(first.image_class_validation.is_valid);
        assert_eq!(first.image_class_validation.class_a_slots, 28);
        for slot in first.meals.slots() {
            assert!(slot.meal.serves(slot.meal_type));
        }
        assert_eq!(first.meals.unique_meal_count(), 20);
        assert_eq!(first, second);

        // Days 0-4 consume the five meals of each type, days 5 and 6 reuse
        // by (day_index * slot_count + slot_index) % pool_size.
        for (slot_index, meal_type) in MealType::ALL.iter().enumerate() {
            let fresh: Vec<Uuid> = first.meals.days[..5]
                .iter()
                .map(|d| d.slots[slot_index].meal.id)
                .collect();
            for day_index in 5..7 {
                let slot = &first.meals.days[day_index].slots[slot_index];
                assert_eq!(slot.meal_type, *meal_type);
                assert!(slot.reused);
                let expected = fresh[(day_index * 4 + slot_index) % 5];
                assert_eq!(slot.meal.id, expected);
            }
        }
    }

    #[test]
    fn test_insufficient_pool_reports_counts() {
        let mut meals = pool(0);
        for n in 0..15u128 {
            meals.push(meal(n + 1, MealType::ALL[(n % 4) as usize], true, &[]));
        }
        for n in 100..110u128 {
            meals.push(meal(n, MealType::Dinner, false, &[]));
        }

        let err = select_meals(&WhoopAnalysis::neutral(), &meals, &SelectionOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            PlannerError::InsufficientPool {
                available: 15,
                required: 20
            }
        );
        let msg = err.to_string();
        assert!(msg.contains("15") && msg.contains("20"));
    }

    #[test]
    fn test_invalid_analysis_is_rejected() {
        let mut analysis = WhoopAnalysis::neutral();
        analysis.averages.sleep_hours = -3.0;
        let result = select_meals(&analysis, &pool(5), &SelectionOptions::default());
        assert!(matches!(result, Err(PlannerError::InvalidAnalysis(_))));
    }

    #[test]
    fn test_meals_without_images_are_never_planned() {
        let mut meals = pool(5);
        for n in 200..240u128 {
            meals.push(meal(n, MealType::ALL[(n % 4) as usize], false, &["high-protein"]));
        }
        let selection =
            select_meals(&WhoopAnalysis::neutral(), &meals, &with_timestamp(42)).unwrap();
        assert!(selection.meals.slots().all(|s| s.meal.has_image()));
        assert_eq!(selection.image_class_validation.class_b_slots, 0);
        assert!(selection.selection_summary.contains("40 awaiting images"));
    }

    #[test]
    fn test_different_timestamps_change_ordering() {
        let analysis = WhoopAnalysis::neutral();
        let meals = pool(10);
        let a = select_meals(&analysis, &meals, &with_timestamp(1_700_000_000_000)).unwrap();
        let b = select_meals(&analysis, &meals, &with_timestamp(1_700_000_000_001)).unwrap();
        let a_again = select_meals(&analysis, &meals, &with_timestamp(1_700_000_000_000)).unwrap();
        assert_ne!(plan_ids(&a), plan_ids(&b));
        assert_eq!(plan_ids(&a), plan_ids(&a_again));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let analysis = WhoopAnalysis::neutral();
        let meals = pool(8);
        let mut reversed = meals.clone();
        reversed.reverse();
        let options = with_timestamp(7);
        assert_eq!(
            plan_ids(&select_meals(&analysis, &meals, &options).unwrap()),
            plan_ids(&select_meals(&analysis, &reversed, &options).unwrap())
        );
    }

    #[test]
    fn test_tag_filters() {
        let mut meals = pool(6);
        for n in 300..310u128 {
            meals.push(meal(n, MealType::ALL[(n % 4) as usize], true, &["vegan"]));
        }
        for n in 400..410u128 {
            meals.push(meal(n, MealType::ALL[(n % 4) as usize], true, &["vegan", "nuts"]));
        }

        let options = SelectionOptions {
            tags: vec!["Vegan".to_string()],
            exclude_tags: vec!["nuts".to_string()],
            ..Default::default()
        };
        let selection = select_meals(&WhoopAnalysis::neutral(), &meals, &options).unwrap();
        assert!(selection.meals.slot_count() > 0);
        for slot in selection.meals.slots() {
            assert!(slot.meal.has_tag("vegan"));
            assert!(!slot.meal.has_tag("nuts"));
        }
        assert!(selection.selection_summary.contains("Required tags: Vegan."));
    }

    #[test]
    fn test_excluded_type_leaves_slots_unfilled() {
        let mut meals = pool(6);
        for m in meals.iter_mut().filter(|m| m.serves(MealType::Snack)) {
            m.tags.push("dairy".to_string());
        }
        let options = SelectionOptions {
            exclude_tags: vec!["dairy".to_string()],
            ..Default::default()
        };
        let selection = select_meals(&WhoopAnalysis::neutral(), &meals, &options).unwrap();
        let validation = &selection.image_class_validation;
        assert_eq!(validation.unfilled_slots.len(), 7);
        assert!(validation.unfilled_slots.iter().all(|s| s.meal_type == MealType::Snack));
        assert!(!validation.is_valid);
        assert_eq!(selection.meals.slot_count(), 21);
    }

    #[test]
    fn test_meal_type_subset_plans_only_those_slots() {
        let options = SelectionOptions {
            meal_types: Some(vec![MealType::Dinner, MealType::Breakfast]),
            ..Default::default()
        };
        let selection = select_meals(&WhoopAnalysis::neutral(), &pool(6), &options).unwrap();
        assert_eq!(selection.meals.slot_count(), 14);
        let first_day: Vec<MealType> =
            selection.meals.days[0].slots.iter().map(|s| s.meal_type).collect();
        assert_eq!(first_day, vec![MealType::Breakfast, MealType::Dinner]);
    }

    #[test]
    fn test_combined_label_fills_either_slot() {
        let mut meals = pool(5);
        for n in 500..510u128 {
            let mut m = meal(n, MealType::Lunch, true, &[]);
            m.meal_type = "Lunch/Dinner".to_string();
            meals.push(m);
        }
        let selection = select_meals(&WhoopAnalysis::neutral(), &meals, &with_timestamp(3)).unwrap();
        for slot in selection.meals.slots() {
            assert!(slot.meal.serves(slot.meal_type));
        }
    }

    #[test]
    fn test_fatigue_prefers_anti_inflammatory_meals() {
        let records: Vec<HealthRecord> = (0..5)
            .map(|i| HealthRecord {
                recovery_score: Some(30.0),
                ..HealthRecord::empty(
                    NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + chrono::Duration::days(i),
                )
            })
            .collect();
        let analysis = analyze(&records).unwrap();
        assert_eq!(analysis.physiological_state.fatigue_level, FatigueLevel::High);

        let mut meals = pool(6);
        for n in 600..604u128 {
            meals.push(meal(n, MealType::Dinner, true, &["Anti-Inflammatory"]));
        }
        let options = SelectionOptions {
            meal_types: Some(vec![MealType::Dinner]),
            max_results: Some(4),
            ..Default::default()
        };
        let selection = select_meals(&analysis, &meals, &options).unwrap();
        assert_eq!(selection.meals.slot_count(), 7);
        assert!(selection.meals.slots().all(|s| s.meal.has_tag("anti-inflammatory")));
        assert!(selection.selection_summary.contains("anti-inflammatory"));
    }

    #[test]
    fn test_diversify_spreads_across_types() {
        let mut meals = pool(0);
        for n in 1..=20u128 {
            meals.push(meal(n, MealType::Breakfast, true, &[]));
        }
        for n in 21..=24u128 {
            meals.push(meal(n, MealType::Snack, true, &[]));
        }
        let refs: Vec<&LibraryMeal> = meals.iter().collect();
        let picked = diversify(&refs, 10);
        assert_eq!(picked.len(), 10);
        let snacks = picked.iter().filter(|m| m.serves(MealType::Snack)).count();
        assert_eq!(snacks, 4);
    }

    #[test]
    fn test_options_accept_camel_case_aliases() {
        let options: SelectionOptions = serde_json::from_str(
            r#"{"forceNewSelection": true, "maxResults": 12, "excludeTags": ["nuts"], "timestamp": 99}"#,
        )
        .unwrap();
        assert!(options.wants_fresh_selection());
        assert_eq!(options.max_results(), 12);
        assert_eq!(options.seed(), 99);
        assert_eq!(options.exclude_tags, vec!["nuts".to_string()]);
    }

    fn type_counts() -> impl Strategy<Value = [usize; 4]> {
        [5usize..12, 5usize..12, 5usize..12, 5usize..12]
    }

    fn build_pool(counts: [usize; 4], imageless: usize) -> Vec<LibraryMeal> {
        let mut meals = Vec::new();
        let mut n = 1u128;
        for (meal_type, count) in MealType::ALL.iter().zip(counts) {
            for _ in 0..count {
                meals.push(meal(n, *meal_type, true, &[]));
                n += 1;
            }
        }
        for i in 0..imageless {
            meals.push(meal(n, MealType::ALL[i % 4], false, &[]));
            n += 1;
        }
        meals
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// No meal without an image ever reaches a plan
        #[test]
        fn prop_only_image_meals(counts in type_counts(), imageless in 0usize..30, seed in any::<i64>()) {
            let meals = build_pool(counts, imageless);
            let selection = select_meals(&WhoopAnalysis::neutral(), &meals, &with_timestamp(seed)).unwrap();
            prop_assert!(selection.meals.slots().all(|s| s.meal.has_image()));
            prop_assert!(selection.image_class_validation.violations.is_empty());
        }

        /// Meals repeat only when their type has fewer meals than slots
        #[test]
        fn prop_no_reuse_when_type_pool_is_large_enough(counts in type_counts(), seed in any::<i64>()) {
            let meals = build_pool(counts, 0);
            let selection = select_meals(&WhoopAnalysis::neutral(), &meals, &with_timestamp(seed)).unwrap();

            for (meal_type, count) in MealType::ALL.iter().zip(counts) {
                let ids: Vec<Uuid> = selection.meals.slots()
                    .filter(|s| s.meal_type == *meal_type)
                    .map(|s| s.meal.id)
                    .collect();
                prop_assert_eq!(ids.len(), DAYS.len());
                let unique: HashSet<Uuid> = ids.iter().copied().collect();
                if count >= DAYS.len() {
                    prop_assert_eq!(unique.len(), ids.len(),
                        "{} repeated a meal with {} available", meal_type, count);
                } else {
                    prop_assert_eq!(unique.len(), count);
                }
            }
        }

        /// Same inputs and timestamp give the same plan
        #[test]
        fn prop_deterministic(counts in type_counts(), seed in any::<i64>()) {
            let meals = build_pool(counts, 5);
            let options = with_timestamp(seed);
            let a = select_meals(&WhoopAnalysis::neutral(), &meals, &options).unwrap();
            let b = select_meals(&WhoopAnalysis::neutral(), &meals, &options).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
