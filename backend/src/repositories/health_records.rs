//! WHOOP health record repository for database operations

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use meal_planner_shared::HealthRecord;
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// Health record row from database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct HealthRecordRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub record_date: NaiveDate,
    pub recovery_score: Option<Decimal>,
    pub strain: Option<Decimal>,
    pub sleep_hours: Option<Decimal>,
    pub calories_burned: Option<i32>,
    pub avg_heart_rate: Option<Decimal>,
    pub resting_heart_rate: Option<Decimal>,
    pub hrv: Option<Decimal>,
    pub spo2_percentage: Option<Decimal>,
    pub skin_temp_celsius: Option<Decimal>,
    pub respiratory_rate: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl HealthRecordRow {
    pub fn into_record(self) -> HealthRecord {
        let f = |d: Option<Decimal>| d.and_then(|d| d.to_f64());
        HealthRecord {
            date: self.record_date,
            recovery_score: f(self.recovery_score),
            strain: f(self.strain),
            sleep_hours: f(self.sleep_hours),
            calories_burned: self.calories_burned,
            avg_heart_rate: f(self.avg_heart_rate),
            resting_heart_rate: f(self.resting_heart_rate),
            hrv: f(self.hrv),
            spo2_percentage: f(self.spo2_percentage),
            skin_temp_celsius: f(self.skin_temp_celsius),
            respiratory_rate: f(self.respiratory_rate),
        }
    }
}

fn to_decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64)
}

const COLUMNS: &str = "id, user_id, record_date, recovery_score, strain, sleep_hours, \
    calories_burned, avg_heart_rate, resting_heart_rate, hrv, spo2_percentage, \
    skin_temp_celsius, respiratory_rate, updated_at";

/// Health record repository
pub struct HealthRecordRepository;

impl HealthRecordRepository {
    /// Insert or replace the record for a user's day
    pub async fn upsert(pool: &PgPool, user_id: Uuid, record: &HealthRecord) -> Result<HealthRecordRow> {
        let sql = format!(
            r#"
            INSERT INTO health_records (
                user_id, record_date, recovery_score, strain, sleep_hours, calories_burned,
                avg_heart_rate, resting_heart_rate, hrv, spo2_percentage, skin_temp_celsius,
                respiratory_rate
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (user_id, record_date) DO UPDATE SET
                recovery_score = EXCLUDED.recovery_score,
                strain = EXCLUDED.strain,
                sleep_hours = EXCLUDED.sleep_hours,
                calories_burned = EXCLUDED.calories_burned,
                avg_heart_rate = EXCLUDED.avg_heart_rate,
                resting_heart_rate = EXCLUDED.resting_heart_rate,
                hrv = EXCLUDED.hrv,
                spo2_percentage = EXCLUDED.spo2_percentage,
                skin_temp_celsius = EXCLUDED.skin_temp_celsius,
                respiratory_rate = EXCLUDED.respiratory_rate,
                updated_at = NOW()
            RETURNING {}
            "#,
            COLUMNS
        );

        let row = sqlx::query_as::<_, HealthRecordRow>(&sql)
            .bind(user_id)
            .bind(record.date)
            .bind(to_decimal(record.recovery_score))
            .bind(to_decimal(record.strain))
            .bind(to_decimal(record.sleep_hours))
            .bind(record.calories_burned)
            .bind(to_decimal(record.avg_heart_rate))
            .bind(to_decimal(record.resting_heart_rate))
            .bind(to_decimal(record.hrv))
            .bind(to_decimal(record.spo2_percentage))
            .bind(to_decimal(record.skin_temp_celsius))
            .bind(to_decimal(record.respiratory_rate))
            .fetch_one(pool)
            .await?;

        Ok(row)
    }

    /// Records on or after `since`, oldest first
    pub async fn get_since(pool: &PgPool, user_id: Uuid, since: NaiveDate) -> Result<Vec<HealthRecordRow>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM health_records
            WHERE user_id = $1 AND record_date >= $2
            ORDER BY record_date ASC
            "#,
            COLUMNS
        );

        let rows = sqlx::query_as::<_, HealthRecordRow>(&sql)
            .bind(user_id)
            .bind(since)
            .fetch_all(pool)
            .await?;

        Ok(rows)
    }

    /// Delete every record for a user
    pub async fn delete_all(pool: &PgPool, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM health_records WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
