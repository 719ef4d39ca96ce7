//! Meal plan API routes

use crate::auth::AuthUser;
use crate::cache::CachedPlan;
use crate::error::ApiError;
use crate::services::MealPlanService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use meal_planner_shared::{MealSelection, MealType, SelectionOptions, WhoopAnalysis};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/generate", post(generate_plan))
        .route("/current", get(current_plan))
        .route("/export", get(export_plan))
        .route("/cache", delete(clear_cache))
}

/// Body of a generate call; every field is optional
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct GeneratePlanRequest {
    pub regenerate: bool,
    #[serde(alias = "forceNewSelection")]
    pub force_new_selection: bool,
    pub timestamp: Option<i64>,
    #[serde(alias = "mealTypes")]
    pub meal_types: Option<Vec<MealType>>,
    #[validate(length(max = 25))]
    pub tags: Vec<String>,
    #[serde(alias = "excludeTags")]
    #[validate(length(max = 25))]
    pub exclude_tags: Vec<String>,
    #[serde(alias = "maxResults")]
    #[validate(range(min = 1, max = 200))]
    pub max_results: Option<usize>,
}

impl From<GeneratePlanRequest> for SelectionOptions {
    fn from(req: GeneratePlanRequest) -> Self {
        SelectionOptions {
            regenerate: req.regenerate,
            force_new_selection: req.force_new_selection,
            timestamp: req.timestamp,
            meal_types: req.meal_types,
            tags: req.tags,
            exclude_tags: req.exclude_tags,
            max_results: req.max_results,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub generated_at: DateTime<Utc>,
    pub from_cache: bool,
    pub analysis: WhoopAnalysis,
    pub options: SelectionOptions,
    #[serde(flatten)]
    pub selection: MealSelection,
}

impl PlanResponse {
    fn new(plan: CachedPlan, from_cache: bool) -> Self {
        Self {
            generated_at: plan.generated_at,
            from_cache,
            analysis: plan.analysis,
            options: plan.options,
            selection: plan.selection,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClearCacheResponse {
    pub cleared: bool,
}

/// POST /api/v1/meal-plan/generate - Analyze WHOOP data and select meals
async fn generate_plan(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<GeneratePlanRequest>,
) -> Result<Json<PlanResponse>, ApiError> {
    req.validate()?;
    let generated = MealPlanService::generate(&state, auth.user_id, req.into()).await?;
    Ok(Json(PlanResponse::new(generated.plan, generated.from_cache)))
}

/// GET /api/v1/meal-plan/current - Most recent cached plan
async fn current_plan(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PlanResponse>, ApiError> {
    let plan = MealPlanService::current(&state, auth.user_id).await?;
    Ok(Json(PlanResponse::new(plan, true)))
}

/// GET /api/v1/meal-plan/export - Cached plan as CSV
async fn export_plan(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let plan = MealPlanService::current(&state, auth.user_id).await?;
    let csv = MealPlanService::to_csv(&plan)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"meal_plan.csv\""),
    );
    Ok((headers, csv))
}

/// DELETE /api/v1/meal-plan/cache - Forget the cached plan
async fn clear_cache(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Json<ClearCacheResponse> {
    let cleared = MealPlanService::clear(&state, auth.user_id).await;
    Json(ClearCacheResponse { cleared })
}
