//! Meal library API routes

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::repositories::MealFilter;
use crate::services::meal_import::{ImportFormat, ImportReport};
use crate::services::meal_library::ImageStatus;
use crate::services::{MealImportService, MealLibraryService};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use meal_planner_shared::{LibraryMeal, NewLibraryMeal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

pub fn meal_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_meals).post(create_meal))
        .route("/import", post(import_meals))
        .route("/image-status", get(image_status))
        .route("/:id", get(get_meal).delete(delete_meal))
        .route("/:id/image", put(set_image))
}

#[derive(Debug, Default, Deserialize)]
pub struct MealListQuery {
    pub meal_type: Option<String>,
    pub tag: Option<String>,
    pub has_image: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct MealListResponse {
    pub count: usize,
    pub meals: Vec<LibraryMeal>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(length(min = 1, max = 5_000_000))]
    pub content: String,
    /// Detected from the content when absent
    pub format: Option<ImportFormat>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetImageRequest {
    #[validate(url, length(max = 2048))]
    pub image_url: String,
}

/// Every cached plan was drawn from the old planning pool
async fn invalidate_plans(state: &AppState) {
    let cleared = state.plans().clear().await;
    debug!(cleared, "Meal library changed, cleared cached plans");
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest(format!("Invalid meal id: {}", id)))
}

/// GET /api/v1/meals - List library meals
async fn list_meals(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<MealListQuery>,
) -> Result<Json<MealListResponse>, ApiError> {
    let filter = MealFilter {
        meal_type: query.meal_type,
        tag: query.tag,
        has_image: query.has_image,
    };
    let meals = MealLibraryService::list(state.db(), filter).await?;
    Ok(Json(MealListResponse {
        count: meals.len(),
        meals,
    }))
}

/// GET /api/v1/meals/:id
async fn get_meal(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<LibraryMeal>, ApiError> {
    let meal = MealLibraryService::get(state.db(), parse_id(&id)?).await?;
    Ok(Json(meal))
}

/// POST /api/v1/meals - Add a meal to the library
async fn create_meal(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(req): Json<NewLibraryMeal>,
) -> Result<(StatusCode, Json<LibraryMeal>), ApiError> {
    let meal = MealLibraryService::create(state.db(), req).await?;
    invalidate_plans(&state).await;
    Ok((StatusCode::CREATED, Json(meal)))
}

/// POST /api/v1/meals/import - Bulk import CSV or JSON content
async fn import_meals(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ImportRequest>,
) -> Result<Json<ImportReport>, ApiError> {
    req.validate()?;
    let report = MealImportService::import(state.db(), &req.content, req.format).await?;
    if report.imported > 0 {
        invalidate_plans(&state).await;
    }
    info!(
        user_id = %auth.user_id,
        imported = report.imported,
        failed = report.failed,
        "Meal import finished"
    );
    Ok(Json(report))
}

/// PUT /api/v1/meals/:id/image - Attach a generated image
async fn set_image(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SetImageRequest>,
) -> Result<Json<LibraryMeal>, ApiError> {
    req.validate()?;
    let meal = MealLibraryService::set_image(state.db(), parse_id(&id)?, &req.image_url).await?;
    invalidate_plans(&state).await;
    Ok(Json(meal))
}

/// GET /api/v1/meals/image-status - Class A/B counts and meals missing images
async fn image_status(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ImageStatus>, ApiError> {
    let status =
        MealLibraryService::image_status(state.db(), state.config().planner.min_pool_size).await?;
    Ok(Json(status))
}

/// DELETE /api/v1/meals/:id
async fn delete_meal(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    MealLibraryService::delete(state.db(), parse_id(&id)?).await?;
    invalidate_plans(&state).await;
    Ok(StatusCode::NO_CONTENT)
}
