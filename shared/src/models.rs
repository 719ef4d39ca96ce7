//! Data models for the meal planner

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Health Records
// ============================================================================

/// One day of WHOOP physiological data for a user
///
/// Every metric is optional because the tracker may omit any field on any day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub date: NaiveDate,
    /// Recovery score, 0-100
    #[serde(default)]
    pub recovery_score: Option<f64>,
    /// Day strain, non-negative
    #[serde(default)]
    pub strain: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
    #[serde(default)]
    pub calories_burned: Option<i32>,
    #[serde(default)]
    pub avg_heart_rate: Option<f64>,
    #[serde(default)]
    pub resting_heart_rate: Option<f64>,
    /// Heart rate variability (ms)
    #[serde(default)]
    pub hrv: Option<f64>,
    #[serde(default)]
    pub spo2_percentage: Option<f64>,
    #[serde(default)]
    pub skin_temp_celsius: Option<f64>,
    #[serde(default)]
    pub respiratory_rate: Option<f64>,
}

impl HealthRecord {
    /// Create a record with no metrics for the given day
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            ..Default::default()
        }
    }

    /// True when the tracker reported nothing for this day
    pub fn has_no_metrics(&self) -> bool {
        self.recovery_score.is_none()
            && self.strain.is_none()
            && self.sleep_hours.is_none()
            && self.calories_burned.is_none()
            && self.avg_heart_rate.is_none()
            && self.resting_heart_rate.is_none()
            && self.hrv.is_none()
            && self.spo2_percentage.is_none()
            && self.skin_temp_celsius.is_none()
            && self.respiratory_rate.is_none()
    }
}

// ============================================================================
// Meal Types
// ============================================================================

/// Meal slot category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MealType {
    #[serde(alias = "breakfast")]
    Breakfast,
    #[serde(alias = "lunch")]
    Lunch,
    #[serde(alias = "snack")]
    Snack,
    #[serde(alias = "dinner")]
    Dinner,
}

impl MealType {
    /// All meal types in plan slot order
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Snack,
        MealType::Dinner,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Snack => "Snack",
            MealType::Dinner => "Dinner",
        }
    }

    /// Parse a library category label into the meal types it covers
    ///
    /// Combined labels such as "Lunch/Dinner" cover every listed type.
    /// Unknown parts are skipped.
    pub fn parse_label(label: &str) -> Vec<MealType> {
        let mut types = Vec::new();
        for part in label.split('/') {
            if let Ok(meal_type) = part.parse::<MealType>() {
                if !types.contains(&meal_type) {
                    types.push(meal_type);
                }
            }
        }
        types
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "snack" | "snacks" => Ok(MealType::Snack),
            "dinner" => Ok(MealType::Dinner),
            other => Err(format!("Unknown meal type: {}", other)),
        }
    }
}

// ============================================================================
// Library Meals
// ============================================================================

/// A single ingredient line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    pub quantity: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Nutrition facts per serving
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    #[serde(default)]
    pub fiber_g: f64,
    #[serde(default)]
    pub sodium_mg: f64,
}

/// Image completeness class of a library meal
///
/// Class A meals carry a generated image and may appear in plans. Class B
/// meals still need an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageClass {
    A,
    B,
}

/// A curated meal in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryMeal {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    /// Category label, e.g. "Breakfast" or "Lunch/Dinner"
    pub meal_type: String,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub why_this_meal: Option<String>,
    #[serde(default)]
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl LibraryMeal {
    /// A meal counts as having an image only when the URL is non-blank
    pub fn has_image(&self) -> bool {
        self.image_url
            .as_deref()
            .map(|url| !url.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn image_class(&self) -> ImageClass {
        if self.has_image() {
            ImageClass::A
        } else {
            ImageClass::B
        }
    }

    /// Meal types this meal can fill
    pub fn meal_types(&self) -> Vec<MealType> {
        MealType::parse_label(&self.meal_type)
    }

    /// First listed meal type, used for grouping
    pub fn primary_meal_type(&self) -> Option<MealType> {
        self.meal_types().into_iter().next()
    }

    pub fn serves(&self, meal_type: MealType) -> bool {
        self.meal_types().contains(&meal_type)
    }

    /// Case-insensitive tag check
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim();
        self.tags.iter().any(|t| t.trim().eq_ignore_ascii_case(tag))
    }

    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.has_tag(t.as_ref()))
    }
}

/// A meal that has not been stored yet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLibraryMeal {
    pub name: String,
    #[serde(default)]
    pub tagline: Option<String>,
    pub meal_type: String,
    #[serde(default)]
    pub serving_size: Option<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub why_this_meal: Option<String>,
    #[serde(default)]
    pub nutrition: NutritionFacts,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewLibraryMeal {
    pub fn into_meal(self, id: Uuid) -> LibraryMeal {
        LibraryMeal {
            id,
            name: self.name,
            tagline: self.tagline,
            meal_type: self.meal_type,
            serving_size: self.serving_size,
            ingredients: self.ingredients,
            instructions: self.instructions,
            why_this_meal: self.why_this_meal,
            nutrition: self.nutrition,
            tags: self.tags,
            image_url: self.image_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn meal(meal_type: &str, image_url: Option<&str>) -> LibraryMeal {
        NewLibraryMeal {
            name: "Test meal".to_string(),
            meal_type: meal_type.to_string(),
            image_url: image_url.map(str::to_string),
            tags: vec!["High-Protein".to_string()],
            ..Default::default()
        }
        .into_meal(Uuid::new_v4())
    }

    #[rstest]
    #[case("Breakfast", vec![MealType::Breakfast])]
    #[case("lunch", vec![MealType::Lunch])]
    #[case("Lunch/Dinner", vec![MealType::Lunch, MealType::Dinner])]
    #[case(" Snacks ", vec![MealType::Snack])]
    #[case("Brunch", vec![])]
    fn test_parse_label(#[case] label: &str, #[case] expected: Vec<MealType>) {
        assert_eq!(MealType::parse_label(label), expected);
    }

    #[test]
    fn test_combined_label_serves_both_types() {
        let m = meal("Lunch/Dinner", Some("https://img.example.com/a.png"));
        assert!(m.serves(MealType::Lunch));
        assert!(m.serves(MealType::Dinner));
        assert!(!m.serves(MealType::Breakfast));
        assert_eq!(m.primary_meal_type(), Some(MealType::Lunch));
    }

    #[test]
    fn test_blank_image_url_is_class_b() {
        assert_eq!(meal("Dinner", Some("   ")).image_class(), ImageClass::B);
        assert_eq!(meal("Dinner", None).image_class(), ImageClass::B);
        assert_eq!(
            meal("Dinner", Some("https://img.example.com/a.png")).image_class(),
            ImageClass::A
        );
    }

    #[test]
    fn test_tags_match_case_insensitively() {
        let m = meal("Dinner", None);
        assert!(m.has_tag("high-protein"));
        assert!(m.has_any_tag(&["light", "HIGH-PROTEIN"]));
        assert!(!m.has_tag("vegan"));
    }

    #[test]
    fn test_health_record_defaults_from_json() {
        let record: HealthRecord =
            serde_json::from_str(r#"{"date":"2024-03-01","recovery_score":71.0}"#).unwrap();
        assert_eq!(record.recovery_score, Some(71.0));
        assert!(record.strain.is_none());
        assert!(!record.has_no_metrics());
        assert!(HealthRecord::empty(record.date).has_no_metrics());
    }
}
