//! Input validation functions
//!
//! Range checks for synced health records and library meals. Errors carry the
//! technical field name plus a user-facing label.

use crate::models::{HealthRecord, MealType, NewLibraryMeal, NutritionFacts};
use regex_lite::Regex;
use std::sync::OnceLock;

/// Maximum WHOOP day strain
pub const MAX_STRAIN: f64 = 21.0;

/// Maximum length of a meal name
pub const MAX_MEAL_NAME_LEN: usize = 200;

fn check_finite(value: f64, what: &str) -> Result<(), String> {
    if value.is_nan() || value.is_infinite() {
        return Err(format!("{} must be a valid number", what));
    }
    Ok(())
}

fn check_range(value: f64, min: f64, max: f64, what: &str) -> Result<(), String> {
    check_finite(value, what)?;
    if value < min || value > max {
        return Err(format!("{} must be between {} and {}", what, min, max));
    }
    Ok(())
}

/// Validate percentage value (0-100)
pub fn validate_percentage(value: f64) -> Result<(), String> {
    check_range(value, 0.0, 100.0, "Percentage")
}

/// Validate recovery score (0-100)
pub fn validate_recovery_score(score: f64) -> Result<(), String> {
    check_range(score, 0.0, 100.0, "Recovery score")
}

/// Validate day strain (0-21)
pub fn validate_strain(strain: f64) -> Result<(), String> {
    check_range(strain, 0.0, MAX_STRAIN, "Strain")
}

/// Validate hours slept in a day
pub fn validate_sleep_hours(hours: f64) -> Result<(), String> {
    check_range(hours, 0.0, 24.0, "Sleep hours")
}

/// Validate calories burned in a day
pub fn validate_calories_burned(calories: i32) -> Result<(), String> {
    if calories < 0 {
        return Err("Calories cannot be negative".to_string());
    }
    if calories > 20000 {
        return Err("Calorie value unreasonably high".to_string());
    }
    Ok(())
}

/// Validate heart rate (bpm)
pub fn validate_heart_rate(bpm: f64) -> Result<(), String> {
    check_finite(bpm, "Heart rate")?;
    if bpm < 20.0 {
        return Err("Heart rate too low".to_string());
    }
    if bpm > 300.0 {
        return Err("Heart rate too high".to_string());
    }
    Ok(())
}

/// Validate heart rate variability (ms)
pub fn validate_hrv(hrv: f64) -> Result<(), String> {
    check_range(hrv, 0.0, 300.0, "HRV")
}

/// Validate skin temperature (Celsius)
pub fn validate_skin_temp(celsius: f64) -> Result<(), String> {
    check_range(celsius, 25.0, 45.0, "Skin temperature")
}

/// Validate respiratory rate (breaths per minute)
pub fn validate_respiratory_rate(rate: f64) -> Result<(), String> {
    check_range(rate, 4.0, 60.0, "Respiratory rate")
}

/// Validate every present metric of a synced record
pub fn validate_health_record(record: &HealthRecord) -> Result<(), ValidationError> {
    fn field<T: Copy>(
        value: Option<T>,
        name: &str,
        check: fn(T) -> Result<(), String>,
    ) -> Result<(), ValidationError> {
        match value {
            Some(v) => check(v).map_err(|msg| ValidationError::new(name, &msg)),
            None => Ok(()),
        }
    }

    field(record.recovery_score, "recovery_score", validate_recovery_score)?;
    field(record.strain, "strain", validate_strain)?;
    field(record.sleep_hours, "sleep_hours", validate_sleep_hours)?;
    field(record.calories_burned, "calories_burned", validate_calories_burned)?;
    field(record.avg_heart_rate, "avg_heart_rate", validate_heart_rate)?;
    field(record.resting_heart_rate, "resting_heart_rate", validate_heart_rate)?;
    field(record.hrv, "hrv", validate_hrv)?;
    field(record.spo2_percentage, "spo2_percentage", validate_percentage)?;
    field(record.skin_temp_celsius, "skin_temp_celsius", validate_skin_temp)?;
    field(record.respiratory_rate, "respiratory_rate", validate_respiratory_rate)?;
    Ok(())
}

// ============================================================================
// Meal Validation
// ============================================================================

fn image_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("image URL regex is valid"))
}

/// Validate a generated image URL
pub fn validate_image_url(url: &str) -> Result<(), String> {
    if url.trim().is_empty() {
        return Err("Image URL cannot be empty".to_string());
    }
    if url.len() > 2048 {
        return Err("Image URL too long".to_string());
    }
    if !image_url_regex().is_match(url.trim()) {
        return Err("Image URL must be an http(s) URL".to_string());
    }
    Ok(())
}

/// Validate a meal category label such as "Lunch/Dinner"
pub fn validate_meal_type_label(label: &str) -> Result<(), String> {
    if MealType::parse_label(label).is_empty() {
        return Err(format!(
            "Invalid meal type '{}'. Must be one of: Breakfast, Lunch, Snack, Dinner",
            label
        ));
    }
    Ok(())
}

/// Validate nutrition facts are finite and non-negative
pub fn validate_nutrition(nutrition: &NutritionFacts) -> Result<(), String> {
    let values = [
        ("Calories", nutrition.calories),
        ("Protein", nutrition.protein_g),
        ("Carbs", nutrition.carbs_g),
        ("Fat", nutrition.fat_g),
        ("Fiber", nutrition.fiber_g),
        ("Sodium", nutrition.sodium_mg),
    ];
    for (what, value) in values {
        check_finite(value, what)?;
        if value < 0.0 {
            return Err(format!("{} cannot be negative", what));
        }
    }
    if nutrition.calories > 5000.0 {
        return Err("Calories per serving unreasonably high".to_string());
    }
    Ok(())
}

/// Validate a meal before it enters the library
pub fn validate_new_meal(meal: &NewLibraryMeal) -> Result<(), ValidationError> {
    let name = meal.name.trim();
    if name.is_empty() {
        return Err(ValidationError::new("name", "cannot be empty"));
    }
    if name.len() > MAX_MEAL_NAME_LEN {
        return Err(ValidationError::new("name", "too long"));
    }
    validate_meal_type_label(&meal.meal_type)
        .map_err(|msg| ValidationError::new("meal_type", &msg))?;
    validate_nutrition(&meal.nutrition).map_err(|msg| ValidationError::new("nutrition", &msg))?;
    if meal.ingredients.iter().any(|i| i.item.trim().is_empty()) {
        return Err(ValidationError::new("ingredients", "ingredient item cannot be empty"));
    }
    if let Some(url) = meal.image_url.as_deref().filter(|u| !u.trim().is_empty()) {
        validate_image_url(url).map_err(|msg| ValidationError::new("image_url", &msg))?;
    }
    Ok(())
}

// ============================================================================
// User-Friendly Field Labels
// ============================================================================

/// Map technical field names to user-friendly display labels
pub fn get_field_display_label(field_name: &str) -> &str {
    match field_name {
        "recovery_score" => "Recovery Score",
        "strain" => "Strain",
        "sleep_hours" => "Sleep",
        "calories_burned" => "Calories Burned",
        "avg_heart_rate" => "Average Heart Rate",
        "resting_heart_rate" => "Resting Heart Rate",
        "hrv" => "Heart Rate Variability",
        "spo2_percentage" => "Blood Oxygen",
        "skin_temp_celsius" => "Skin Temperature",
        "respiratory_rate" => "Respiratory Rate",
        "name" => "Meal Name",
        "meal_type" => "Meal Type",
        "nutrition" => "Nutrition Facts",
        "ingredients" => "Ingredients",
        "image_url" => "Image URL",
        _ => field_name,
    }
}

/// Validation error with field context
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub display_label: String,
}

impl ValidationError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
            display_label: get_field_display_label(field).to_string(),
        }
    }

    /// Format as user-friendly error message
    pub fn user_message(&self) -> String {
        format!("{}: {}", self.display_label, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Ingredient;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_validate_recovery_score() {
        assert!(validate_recovery_score(0.0).is_ok());
        assert!(validate_recovery_score(100.0).is_ok());
        assert!(validate_recovery_score(-1.0).is_err());
        assert!(validate_recovery_score(101.0).is_err());
        assert!(validate_recovery_score(f64::NAN).is_err());
    }

    #[test]
    fn test_validate_strain() {
        assert!(validate_strain(14.2).is_ok());
        assert!(validate_strain(21.0).is_ok());
        assert!(validate_strain(21.5).is_err());
        assert!(validate_strain(-0.1).is_err());
    }

    #[test]
    fn test_validate_heart_rate() {
        assert!(validate_heart_rate(60.0).is_ok());
        assert!(validate_heart_rate(10.0).is_err());
        assert!(validate_heart_rate(350.0).is_err());
        assert!(validate_heart_rate(f64::INFINITY).is_err());
    }

    #[test]
    fn test_validate_health_record_reports_field() {
        let mut record = HealthRecord::empty(day());
        assert!(validate_health_record(&record).is_ok());

        record.sleep_hours = Some(26.0);
        let err = validate_health_record(&record).unwrap_err();
        assert_eq!(err.field, "sleep_hours");
        assert!(err.user_message().starts_with("Sleep:"));
    }

    #[test]
    fn test_validate_image_url() {
        assert!(validate_image_url("https://cdn.example.com/meals/oats.png").is_ok());
        assert!(validate_image_url("http://localhost:9000/bucket/a.jpg").is_ok());
        assert!(validate_image_url("").is_err());
        assert!(validate_image_url("ftp://example.com/a.png").is_err());
        assert!(validate_image_url("not a url").is_err());
    }

    #[test]
    fn test_validate_new_meal() {
        let mut meal = NewLibraryMeal {
            name: "Overnight Oats".to_string(),
            meal_type: "Breakfast".to_string(),
            ingredients: vec![Ingredient {
                item: "rolled oats".to_string(),
                quantity: "1/2 cup".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(validate_new_meal(&meal).is_ok());

        meal.meal_type = "Brunch".to_string();
        assert_eq!(validate_new_meal(&meal).unwrap_err().field, "meal_type");

        meal.meal_type = "Lunch/Dinner".to_string();
        meal.nutrition.fat_g = -2.0;
        assert_eq!(validate_new_meal(&meal).unwrap_err().field, "nutrition");

        meal.nutrition.fat_g = 2.0;
        meal.image_url = Some("   ".to_string());
        assert!(validate_new_meal(&meal).is_ok());

        meal.name = "  ".to_string();
        assert_eq!(validate_new_meal(&meal).unwrap_err().field, "name");
    }

    #[test]
    fn test_field_display_labels() {
        assert_eq!(get_field_display_label("hrv"), "Heart Rate Variability");
        assert_eq!(get_field_display_label("unknown_field"), "unknown_field");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_valid_recovery_range(score in 0.0f64..=100.0) {
            prop_assert!(validate_recovery_score(score).is_ok());
        }

        #[test]
        fn prop_invalid_recovery_above_max(score in 100.01f64..1000.0) {
            prop_assert!(validate_recovery_score(score).is_err());
        }

        #[test]
        fn prop_valid_percentage_range(pct in 0.0f64..=100.0) {
            prop_assert!(validate_percentage(pct).is_ok());
        }

        #[test]
        fn prop_valid_sleep_range(hours in 0.0f64..=24.0) {
            prop_assert!(validate_sleep_hours(hours).is_ok());
        }
    }
}
