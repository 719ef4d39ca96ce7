//! WHOOP record API routes

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::services::whoop::SyncSummary;
use crate::services::WhoopService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use meal_planner_shared::{whoop_insights, HealthRecord, WhoopAnalysis};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub fn whoop_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/records",
            post(sync_records).get(list_records).delete(delete_records),
        )
        .route("/analysis", get(get_analysis))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SyncRecordsRequest {
    #[validate(length(min = 1, max = 366))]
    pub records: Vec<HealthRecord>,
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub days: i64,
    pub records: Vec<HealthRecord>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub days: i64,
    pub analysis: WhoopAnalysis,
    pub insights: String,
}

/// POST /api/v1/whoop/records - Upsert daily records
///
/// New records change the analysis, so the cached plan is evicted.
async fn sync_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<SyncRecordsRequest>,
) -> Result<Json<SyncSummary>, ApiError> {
    req.validate()?;
    let summary = WhoopService::sync_records(state.db(), auth.user_id, req.records).await?;
    state.plans().evict(auth.user_id).await;
    Ok(Json(summary))
}

/// GET /api/v1/whoop/records?days=N - Recent records, oldest first
async fn list_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<RecordsResponse>, ApiError> {
    let days = query
        .days
        .unwrap_or(state.config().planner.analysis_window_days);
    let records = WhoopService::recent_records(state.db(), auth.user_id, days).await?;
    Ok(Json(RecordsResponse { days, records }))
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordsResponse {
    pub deleted: u64,
}

/// DELETE /api/v1/whoop/records - Forget all synced records
///
/// The cached plan was derived from those records, so it is evicted too.
async fn delete_records(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<DeleteRecordsResponse>, ApiError> {
    let deleted = WhoopService::delete_records(state.db(), auth.user_id).await?;
    state.plans().evict(auth.user_id).await;
    Ok(Json(DeleteRecordsResponse { deleted }))
}

/// GET /api/v1/whoop/analysis?days=N - Analysis of the recent window
async fn get_analysis(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<WindowQuery>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let days = query
        .days
        .unwrap_or(state.config().planner.analysis_window_days);
    let analysis = WhoopService::analysis(state.db(), auth.user_id, days).await?;
    let insights = whoop_insights(&analysis);
    Ok(Json(AnalysisResponse {
        days,
        analysis,
        insights,
    }))
}
