//! Meal library service
//!
//! CRUD for curated meals plus image completeness tracking. Only meals with
//! an image (class A) are handed to the planner.

use crate::error::ApiError;
use crate::repositories::{LibraryMealRepository, MealFilter};
use meal_planner_shared::validation::{validate_image_url, validate_new_meal, ValidationError};
use meal_planner_shared::{LibraryMeal, MealType, NewLibraryMeal};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Meal still waiting for a generated image
#[derive(Debug, Clone, Serialize)]
pub struct MissingImage {
    pub id: Uuid,
    pub name: String,
    pub meal_type: String,
}

/// Library image completeness report
#[derive(Debug, Clone, Serialize)]
pub struct ImageStatus {
    pub total_meals: i64,
    pub class_a: i64,
    pub class_b: i64,
    pub min_pool_size: usize,
    pub ready_for_planning: bool,
    /// Class A meals per meal type
    pub class_a_by_type: Vec<TypeCount>,
    pub missing_images: Vec<MissingImage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeCount {
    pub meal_type: MealType,
    pub count: usize,
}

/// Class A counts per meal type, combined labels counting toward each type
pub fn count_by_type(meals: &[LibraryMeal]) -> Vec<TypeCount> {
    MealType::ALL
        .into_iter()
        .map(|meal_type| TypeCount {
            meal_type,
            count: meals
                .iter()
                .filter(|m| m.has_image() && m.serves(meal_type))
                .count(),
        })
        .collect()
}

pub struct MealLibraryService;

impl MealLibraryService {
    pub async fn list(pool: &PgPool, filter: MealFilter) -> Result<Vec<LibraryMeal>, ApiError> {
        let rows = LibraryMealRepository::list(pool, &filter)
            .await
            .map_err(ApiError::from)?;
        Ok(rows.into_iter().map(|r| r.into_meal()).collect())
    }

    pub async fn get(pool: &PgPool, id: Uuid) -> Result<LibraryMeal, ApiError> {
        LibraryMealRepository::get_by_id(pool, id)
            .await
            .map_err(ApiError::from)?
            .map(|r| r.into_meal())
            .ok_or_else(|| ApiError::NotFound(format!("Meal {} not found", id)))
    }

    pub async fn create(pool: &PgPool, meal: NewLibraryMeal) -> Result<LibraryMeal, ApiError> {
        validate_new_meal(&meal)?;
        let row = LibraryMealRepository::create(pool, &meal)
            .await
            .map_err(ApiError::from)?;
        info!(meal_id = %row.id, name = %row.name, "Added library meal");
        Ok(row.into_meal())
    }

    /// Attach a generated image, promoting the meal to class A
    pub async fn set_image(pool: &PgPool, id: Uuid, image_url: &str) -> Result<LibraryMeal, ApiError> {
        validate_image_url(image_url).map_err(|msg| ValidationError::new("image_url", &msg))?;
        let meal = LibraryMealRepository::set_image_url(pool, id, image_url)
            .await
            .map_err(ApiError::from)?
            .map(|r| r.into_meal())
            .ok_or_else(|| ApiError::NotFound(format!("Meal {} not found", id)))?;
        info!(meal_id = %id, "Attached meal image");
        Ok(meal)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<(), ApiError> {
        let deleted = LibraryMealRepository::delete(pool, id)
            .await
            .map_err(ApiError::from)?;
        if !deleted {
            return Err(ApiError::NotFound(format!("Meal {} not found", id)));
        }
        Ok(())
    }

    /// Image-bearing meals used as the planning pool
    pub async fn planning_pool(pool: &PgPool) -> Result<Vec<LibraryMeal>, ApiError> {
        let rows = LibraryMealRepository::list_with_images(pool)
            .await
            .map_err(ApiError::from)?;
        Ok(rows.into_iter().map(|r| r.into_meal()).collect())
    }

    pub async fn image_status(pool: &PgPool, min_pool_size: usize) -> Result<ImageStatus, ApiError> {
        let counts = LibraryMealRepository::image_counts(pool)
            .await
            .map_err(ApiError::from)?;
        let ready = Self::planning_pool(pool).await?;
        let missing = Self::list(
            pool,
            MealFilter {
                has_image: Some(false),
                ..Default::default()
            },
        )
        .await?;

        Ok(ImageStatus {
            total_meals: counts.total,
            class_a: counts.with_image,
            class_b: counts.total - counts.with_image,
            min_pool_size,
            ready_for_planning: counts.with_image >= min_pool_size as i64,
            class_a_by_type: count_by_type(&ready),
            missing_images: missing
                .into_iter()
                .map(|m| MissingImage {
                    id: m.id,
                    name: m.name,
                    meal_type: m.meal_type,
                })
                .collect(),
        })
    }
}
