//! Meal library repository for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use meal_planner_shared::{Ingredient, LibraryMeal, NewLibraryMeal, NutritionFacts};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

/// Library meal row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LibraryMealRow {
    pub id: Uuid,
    pub name: String,
    pub tagline: Option<String>,
    pub meal_type: String,
    pub serving_size: Option<String>,
    pub ingredients: Json<Vec<Ingredient>>,
    pub instructions: Json<Vec<String>>,
    pub why_this_meal: Option<String>,
    pub nutrition: Json<NutritionFacts>,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LibraryMealRow {
    pub fn into_meal(self) -> LibraryMeal {
        LibraryMeal {
            id: self.id,
            name: self.name,
            tagline: self.tagline,
            meal_type: self.meal_type,
            serving_size: self.serving_size,
            ingredients: self.ingredients.0,
            instructions: self.instructions.0,
            why_this_meal: self.why_this_meal,
            nutrition: self.nutrition.0,
            tags: self.tags,
            image_url: self.image_url,
        }
    }
}

/// Filters for listing the library
#[derive(Debug, Clone, Default)]
pub struct MealFilter {
    /// Matches any meal whose category label mentions this type
    pub meal_type: Option<String>,
    pub tag: Option<String>,
    pub has_image: Option<bool>,
}

/// Image completeness counts for the library
#[derive(Debug, Clone, Copy, sqlx::FromRow)]
pub struct ImageCounts {
    pub total: i64,
    pub with_image: i64,
}

const COLUMNS: &str = "id, name, tagline, meal_type, serving_size, ingredients, instructions, \
    why_this_meal, nutrition, tags, image_url, created_at";

const HAS_IMAGE: &str = "(image_url IS NOT NULL AND btrim(image_url) <> '')";

/// Library meal repository
pub struct LibraryMealRepository;

impl LibraryMealRepository {
    /// Insert a new meal
    pub async fn create(pool: &PgPool, meal: &NewLibraryMeal) -> Result<LibraryMealRow> {
        let sql = format!(
            r#"
            INSERT INTO library_meals (
                name, tagline, meal_type, serving_size, ingredients, instructions,
                why_this_meal, nutrition, tags, image_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, LibraryMealRow>(&sql)
            .bind(meal.name.trim())
            .bind(&meal.tagline)
            .bind(meal.meal_type.trim())
            .bind(&meal.serving_size)
            .bind(Json(&meal.ingredients))
            .bind(Json(&meal.instructions))
            .bind(&meal.why_this_meal)
            .bind(Json(&meal.nutrition))
            .bind(&meal.tags)
            .bind(&meal.image_url)
            .fetch_one(pool)
            .await?;

        Ok(row)
    }

    pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<LibraryMealRow>> {
        let sql = format!("SELECT {} FROM library_meals WHERE id = $1", COLUMNS);
        let row = sqlx::query_as::<_, LibraryMealRow>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row)
    }

    /// List meals matching the filter, ordered by name
    pub async fn list(pool: &PgPool, filter: &MealFilter) -> Result<Vec<LibraryMealRow>> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM library_meals WHERE TRUE", COLUMNS));

        if let Some(meal_type) = filter.meal_type.as_deref() {
            query
                .push(" AND meal_type ILIKE ")
                .push_bind(format!("%{}%", meal_type.trim()));
        }
        if let Some(tag) = filter.tag.as_deref() {
            query
                .push(" AND EXISTS (SELECT 1 FROM unnest(tags) t WHERE lower(t) = lower(")
                .push_bind(tag.trim().to_string())
                .push("))");
        }
        match filter.has_image {
            Some(true) => {
                query.push(" AND ").push(HAS_IMAGE);
            }
            Some(false) => {
                query.push(" AND NOT ").push(HAS_IMAGE);
            }
            None => {}
        }
        query.push(" ORDER BY name ASC, id ASC");

        let rows = query
            .build_query_as::<LibraryMealRow>()
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }

    /// Every meal that has an image, the pool used for planning
    pub async fn list_with_images(pool: &PgPool) -> Result<Vec<LibraryMealRow>> {
        Self::list(
            pool,
            &MealFilter {
                has_image: Some(true),
                ..Default::default()
            },
        )
        .await
    }

    /// Attach a generated image
    pub async fn set_image_url(pool: &PgPool, id: Uuid, image_url: &str) -> Result<Option<LibraryMealRow>> {
        let sql = format!(
            r#"
            UPDATE library_meals
            SET image_url = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, LibraryMealRow>(&sql)
            .bind(id)
            .bind(image_url.trim())
            .fetch_optional(pool)
            .await?;

        Ok(row)
    }

    pub async fn image_counts(pool: &PgPool) -> Result<ImageCounts> {
        let sql = format!(
            "SELECT COUNT(*) AS total, COUNT(*) FILTER (WHERE {}) AS with_image FROM library_meals",
            HAS_IMAGE
        );
        let counts = sqlx::query_as::<_, ImageCounts>(&sql).fetch_one(pool).await?;
        Ok(counts)
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM library_meals WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
