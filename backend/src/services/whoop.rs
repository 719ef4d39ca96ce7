//! WHOOP record sync and analysis service

use crate::error::ApiError;
use crate::repositories::HealthRecordRepository;
use chrono::{Duration, NaiveDate, Utc};
use meal_planner_shared::validation::validate_health_record;
use meal_planner_shared::{analyze, HealthRecord, PlannerError, WhoopAnalysis};
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

/// Longest history window a caller may request
pub const MAX_WINDOW_DAYS: i64 = 90;

/// Largest batch accepted by one sync call
pub const MAX_SYNC_BATCH: usize = 366;

/// Outcome of a record sync
#[derive(Debug, Clone, serde::Serialize)]
pub struct SyncSummary {
    pub synced: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

/// First day of a window of `days` days ending today
pub fn window_start(today: NaiveDate, days: i64) -> NaiveDate {
    let days = days.clamp(1, MAX_WINDOW_DAYS);
    today - Duration::days(days - 1)
}

/// Check a batch before anything is written
pub fn validate_batch(records: &[HealthRecord]) -> Result<(), PlannerError> {
    if records.is_empty() {
        return Err(PlannerError::EmptyRecords);
    }
    if records.len() > MAX_SYNC_BATCH {
        return Err(PlannerError::InvalidRecord(format!(
            "at most {} records per sync, got {}",
            MAX_SYNC_BATCH,
            records.len()
        )));
    }
    for (index, record) in records.iter().enumerate() {
        validate_health_record(record).map_err(|e| {
            PlannerError::InvalidRecord(format!(
                "record {} ({}): {}",
                index,
                record.date,
                e.user_message()
            ))
        })?;
    }
    Ok(())
}

pub struct WhoopService;

impl WhoopService {
    /// Upsert a batch of daily records for a user
    ///
    /// The whole batch is rejected when any record is out of range.
    pub async fn sync_records(
        pool: &PgPool,
        user_id: Uuid,
        records: Vec<HealthRecord>,
    ) -> Result<SyncSummary, ApiError> {
        validate_batch(&records)?;

        for record in &records {
            HealthRecordRepository::upsert(pool, user_id, record)
                .await
                .map_err(ApiError::from)?;
        }

        metrics::counter!("whoop_records_synced_total").increment(records.len() as u64);
        info!(%user_id, count = records.len(), "Synced WHOOP records");

        Ok(SyncSummary {
            synced: records.len(),
            first_date: records.iter().map(|r| r.date).min(),
            last_date: records.iter().map(|r| r.date).max(),
        })
    }

    /// Records from the last `days` days, oldest first
    pub async fn recent_records(
        pool: &PgPool,
        user_id: Uuid,
        days: i64,
    ) -> Result<Vec<HealthRecord>, ApiError> {
        let since = window_start(Utc::now().date_naive(), days);
        let rows = HealthRecordRepository::get_since(pool, user_id, since)
            .await
            .map_err(ApiError::from)?;

        Ok(rows.into_iter().map(|r| r.into_record()).collect())
    }

    /// Remove every record a user has synced
    pub async fn delete_records(pool: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
        let deleted = HealthRecordRepository::delete_all(pool, user_id)
            .await
            .map_err(ApiError::from)?;
        info!(%user_id, deleted, "Deleted WHOOP records");
        Ok(deleted)
    }

    /// Analyze the last `days` days, or return the neutral analysis when
    /// the user has no data in that window
    pub async fn analysis(pool: &PgPool, user_id: Uuid, days: i64) -> Result<WhoopAnalysis, ApiError> {
        let records = Self::recent_records(pool, user_id, days).await?;
        if records.is_empty() {
            debug!(%user_id, "No WHOOP records in window, using neutral analysis");
            return Ok(WhoopAnalysis::neutral());
        }
        Ok(analyze(&records)?)
    }
}
