//! Meal Planner WASM Module
//!
//! Browser bindings for the WHOOP analyzer and the weekly meal selector.
//! Everything crosses the boundary as JSON strings.

use js_sys::Date;
use meal_planner_shared::{
    analyze, resolve_options, whoop_insights, HealthRecord, LibraryMeal, SelectionOptions,
    WhoopAnalysis,
};
use wasm_bindgen::prelude::*;

/// Analyze a JSON array of WHOOP records into a JSON analysis
#[wasm_bindgen]
pub fn analyze_records(records_json: &str) -> Result<String, JsValue> {
    analyze_json(records_json).map_err(|e| JsValue::from_str(&e))
}

/// Plan a week of meals
///
/// `options_json` may be empty, in which case defaults apply. A fresh draw
/// without a timestamp is seeded from `Date.now()`.
#[wasm_bindgen]
pub fn select_meals(
    analysis_json: &str,
    pool_json: &str,
    options_json: &str,
) -> Result<String, JsValue> {
    plan_json(analysis_json, pool_json, options_json, Date::now() as i64)
        .map_err(|e| JsValue::from_str(&e))
}

/// Analysis used when a user has no WHOOP data yet
#[wasm_bindgen]
pub fn neutral_analysis() -> String {
    serde_json::to_string(&WhoopAnalysis::neutral()).unwrap_or_default()
}

/// Human-readable insight text for a JSON analysis
#[wasm_bindgen]
pub fn insights(analysis_json: &str) -> Result<String, JsValue> {
    insights_json(analysis_json).map_err(|e| JsValue::from_str(&e))
}

fn analyze_json(records_json: &str) -> Result<String, String> {
    let records: Vec<HealthRecord> =
        serde_json::from_str(records_json).map_err(|e| format!("Invalid records: {}", e))?;
    let analysis = analyze(&records).map_err(|e| e.to_string())?;
    serde_json::to_string(&analysis).map_err(|e| e.to_string())
}

fn plan_json(
    analysis_json: &str,
    pool_json: &str,
    options_json: &str,
    now_millis: i64,
) -> Result<String, String> {
    let analysis: WhoopAnalysis =
        serde_json::from_str(analysis_json).map_err(|e| format!("Invalid analysis: {}", e))?;
    let pool: Vec<LibraryMeal> =
        serde_json::from_str(pool_json).map_err(|e| format!("Invalid meal pool: {}", e))?;
    let options = if options_json.trim().is_empty() {
        SelectionOptions::default()
    } else {
        serde_json::from_str(options_json).map_err(|e| format!("Invalid options: {}", e))?
    };
    let options = resolve_options(options, now_millis);

    let selection = meal_planner_shared::select_meals(&analysis, &pool, &options)
        .map_err(|e| e.to_string())?;
    serde_json::to_string(&selection).map_err(|e| e.to_string())
}

fn insights_json(analysis_json: &str) -> Result<String, String> {
    let analysis: WhoopAnalysis =
        serde_json::from_str(analysis_json).map_err(|e| format!("Invalid analysis: {}", e))?;
    Ok(whoop_insights(&analysis))
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn select_meals_reports_errors_as_js_values() {
        let err = select_meals(&neutral_analysis(), "[]", "").unwrap_err();
        assert!(err.as_string().unwrap().contains("Insufficient meal pool"));
    }

    #[wasm_bindgen_test]
    fn analyze_records_round_trips() {
        let out = analyze_records(r#"[{"date": "2024-03-01", "recovery_score": 80.0}]"#).unwrap();
        assert!(out.contains("\"record_count\":1"));
    }

    #[wasm_bindgen_test]
    fn select_meals_seeds_fresh_draws_from_date_now() {
        let pool: Vec<String> = (1..=24)
            .map(|n| {
                let meal_type = ["Breakfast", "Lunch/Dinner", "Snack"][n % 3];
                format!(
                    r#"{{"id":"00000000-0000-0000-0000-{:012}","name":"Meal {}","meal_type":"{}","image_url":"https://img.example.com/{}.png"}}"#,
                    n, n, meal_type, n
                )
            })
            .collect();
        let pool = format!("[{}]", pool.join(","));
        let out = select_meals(&neutral_analysis(), &pool, r#"{"regenerate": true}"#).unwrap();
        let base_seed = format!("\"seed\":{}", meal_planner_shared::meal_selection::BASE_SEED);
        assert!(!out.contains(&base_seed));
    }
}
