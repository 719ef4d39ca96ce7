//! Bulk meal import from CSV or JSON
//!
//! Parsing is separate from storage so bad rows can be reported by number
//! while the valid rows are still imported.
//!
//! CSV columns:
//! `name,tagline,meal_type,serving_size,ingredients,instructions,why_this_meal,
//! calories,protein_g,carbs_g,fat_g,fiber_g,sodium_mg,tags,image_url`
//!
//! `ingredients` holds `;`-separated `item|quantity[|optional][|notes]`
//! entries, `instructions` holds `;`-separated steps, and `tags` is
//! comma-separated.

use crate::error::ApiError;
use crate::repositories::LibraryMealRepository;
use meal_planner_shared::validation::validate_new_meal;
use meal_planner_shared::{Ingredient, NewLibraryMeal, NutritionFacts};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

/// Import payload format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Csv,
    Json,
}

impl ImportFormat {
    /// JSON when the content opens an array, CSV otherwise
    pub fn detect(content: &str) -> Self {
        if content.trim_start().starts_with('[') {
            ImportFormat::Json
        } else {
            ImportFormat::Csv
        }
    }
}

/// A row that could not be imported
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// CSV line number (header is line 1) or 1-based JSON array position
    pub row: u64,
    pub message: String,
}

/// Parsed content before storage
#[derive(Debug, Default)]
pub struct ParsedImport {
    pub meals: Vec<(u64, NewLibraryMeal)>,
    pub errors: Vec<RowError>,
}

/// Import outcome returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub format: ImportFormat,
    pub imported: usize,
    pub failed: usize,
    pub meal_ids: Vec<Uuid>,
    pub errors: Vec<RowError>,
}

#[derive(Debug, Deserialize)]
struct CsvMealRow {
    name: String,
    tagline: Option<String>,
    meal_type: String,
    serving_size: Option<String>,
    #[serde(default)]
    ingredients: String,
    #[serde(default)]
    instructions: String,
    why_this_meal: Option<String>,
    calories: Option<f64>,
    protein_g: Option<f64>,
    carbs_g: Option<f64>,
    fat_g: Option<f64>,
    fiber_g: Option<f64>,
    sodium_mg: Option<f64>,
    #[serde(default)]
    tags: String,
    image_url: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse one `item|quantity[|optional][|notes]` entry
pub fn parse_ingredient(entry: &str) -> Result<Ingredient, String> {
    let parts: Vec<&str> = entry.split('|').map(str::trim).collect();
    let item = parts.first().copied().unwrap_or_default();
    if item.is_empty() {
        return Err(format!("ingredient '{}' has no item", entry.trim()));
    }

    let mut ingredient = Ingredient {
        item: item.to_string(),
        quantity: parts.get(1).copied().unwrap_or_default().to_string(),
        ..Default::default()
    };
    let mut rest = parts.iter().skip(2).copied();
    if let Some(flag) = rest.next() {
        match flag.to_lowercase().as_str() {
            "optional" | "true" | "yes" => ingredient.optional = true,
            "" | "false" | "no" | "required" => {}
            notes => ingredient.notes = Some(notes.to_string()),
        }
    }
    if let Some(notes) = rest.next().filter(|n| !n.is_empty()) {
        ingredient.notes = Some(notes.to_string());
    }
    Ok(ingredient)
}

/// Parse a `;`-separated ingredient list, skipping empty entries
pub fn parse_ingredients(field: &str) -> Result<Vec<Ingredient>, String> {
    field
        .split(';')
        .filter(|e| !e.trim().is_empty())
        .map(parse_ingredient)
        .collect()
}

fn split_list(field: &str, separator: char) -> Vec<String> {
    field
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl CsvMealRow {
    fn into_new_meal(self) -> Result<NewLibraryMeal, String> {
        Ok(NewLibraryMeal {
            name: self.name.trim().to_string(),
            tagline: non_blank(self.tagline),
            meal_type: self.meal_type.trim().to_string(),
            serving_size: non_blank(self.serving_size),
            ingredients: parse_ingredients(&self.ingredients)?,
            instructions: split_list(&self.instructions, ';'),
            why_this_meal: non_blank(self.why_this_meal),
            nutrition: NutritionFacts {
                calories: self.calories.unwrap_or_default(),
                protein_g: self.protein_g.unwrap_or_default(),
                carbs_g: self.carbs_g.unwrap_or_default(),
                fat_g: self.fat_g.unwrap_or_default(),
                fiber_g: self.fiber_g.unwrap_or_default(),
                sodium_mg: self.sodium_mg.unwrap_or_default(),
            },
            tags: split_list(&self.tags, ','),
            image_url: non_blank(self.image_url),
        })
    }
}

fn accept(parsed: &mut ParsedImport, row: u64, meal: NewLibraryMeal) {
    match validate_new_meal(&meal) {
        Ok(()) => parsed.meals.push((row, meal)),
        Err(e) => parsed.errors.push(RowError {
            row,
            message: e.user_message(),
        }),
    }
}

/// Parse CSV content with a header row
pub fn parse_csv(content: &str) -> Result<ParsedImport, String> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|e| format!("Invalid CSV header: {}", e))?
        .clone();
    for required in ["name", "meal_type"] {
        if !headers.iter().any(|h| h == required) {
            return Err(format!("CSV header is missing the '{}' column", required));
        }
    }

    let mut parsed = ParsedImport::default();
    for (index, result) in reader.records().enumerate() {
        let fallback_row = index as u64 + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let row = e.position().map(|p| p.line()).unwrap_or(fallback_row);
                parsed.errors.push(RowError {
                    row,
                    message: e.to_string(),
                });
                continue;
            }
        };
        let row = record.position().map(|p| p.line()).unwrap_or(fallback_row);
        let meal = record
            .deserialize::<CsvMealRow>(Some(&headers))
            .map_err(|e| e.to_string())
            .and_then(CsvMealRow::into_new_meal);
        match meal {
            Ok(meal) => accept(&mut parsed, row, meal),
            Err(message) => parsed.errors.push(RowError { row, message }),
        }
    }
    Ok(parsed)
}

/// Parse a JSON array of meal objects
pub fn parse_json(content: &str) -> Result<ParsedImport, String> {
    let items: Vec<serde_json::Value> =
        serde_json::from_str(content).map_err(|e| format!("Invalid JSON: {}", e))?;

    let mut parsed = ParsedImport::default();
    for (index, item) in items.into_iter().enumerate() {
        let row = index as u64 + 1;
        match serde_json::from_value::<NewLibraryMeal>(item) {
            Ok(meal) => accept(&mut parsed, row, meal),
            Err(e) => parsed.errors.push(RowError {
                row,
                message: e.to_string(),
            }),
        }
    }
    Ok(parsed)
}

pub struct MealImportService;

impl MealImportService {
    /// Parse and store meals, reporting rows that failed
    pub async fn import(
        pool: &PgPool,
        content: &str,
        format: Option<ImportFormat>,
    ) -> Result<ImportReport, ApiError> {
        let format = format.unwrap_or_else(|| ImportFormat::detect(content));
        let parsed = match format {
            ImportFormat::Csv => parse_csv(content),
            ImportFormat::Json => parse_json(content),
        }
        .map_err(ApiError::BadRequest)?;

        let mut meal_ids = Vec::with_capacity(parsed.meals.len());
        for (row, meal) in &parsed.meals {
            let stored = LibraryMealRepository::create(pool, meal)
                .await
                .map_err(|e| ApiError::Internal(e.context(format!("import row {}", row))))?;
            meal_ids.push(stored.id);
        }

        if !parsed.errors.is_empty() {
            warn!(failed = parsed.errors.len(), "Skipped invalid meal rows during import");
        }
        metrics::counter!("meals_imported_total").increment(meal_ids.len() as u64);
        info!(imported = meal_ids.len(), ?format, "Imported library meals");

        Ok(ImportReport {
            format,
            imported: meal_ids.len(),
            failed: parsed.errors.len(),
            meal_ids,
            errors: parsed.errors,
        })
    }
}
