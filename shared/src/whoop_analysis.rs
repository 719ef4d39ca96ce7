//! WHOOP health data analysis
//!
//! Reduces a window of daily `HealthRecord`s to averages, directional trends,
//! a physiological-state snapshot and nutritional recommendations that drive
//! meal selection.
//!
//! # Thresholds
//!
//! | rule | boundaries |
//! |---|---|
//! | trend | relative change of later half vs earlier half beyond ±5% |
//! | fatigue | recovery < 50 high, < 75 moderate, else low |
//! | recovery status | recovery < 34 poor, < 67 adequate, else optimal |
//! | metabolic demand | strain >= 14 or calories >= 2800 high; strain >= 10 or calories >= 2200 moderate |
//! | sleep quality | < 6h poor, < 7h fair, < 8h good, else excellent |
//!
//! All functions are pure. The only failure is an empty input.

use crate::errors::{PlannerError, PlannerResult};
use crate::models::HealthRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Relative change beyond which a trend is no longer stable
pub const TREND_THRESHOLD: f64 = 0.05;

// ============================================================================
// Metrics
// ============================================================================

/// A tracked metric of a `HealthRecord`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    RecoveryScore,
    Strain,
    SleepHours,
    CaloriesBurned,
    AvgHeartRate,
    RestingHeartRate,
    Hrv,
    Spo2,
    SkinTemp,
    RespiratoryRate,
}

impl Metric {
    pub const ALL: [Metric; 10] = [
        Metric::RecoveryScore,
        Metric::Strain,
        Metric::SleepHours,
        Metric::CaloriesBurned,
        Metric::AvgHeartRate,
        Metric::RestingHeartRate,
        Metric::Hrv,
        Metric::Spo2,
        Metric::SkinTemp,
        Metric::RespiratoryRate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::RecoveryScore => "recovery_score",
            Metric::Strain => "strain",
            Metric::SleepHours => "sleep_hours",
            Metric::CaloriesBurned => "calories_burned",
            Metric::AvgHeartRate => "avg_heart_rate",
            Metric::RestingHeartRate => "resting_heart_rate",
            Metric::Hrv => "hrv",
            Metric::Spo2 => "spo2_percentage",
            Metric::SkinTemp => "skin_temp_celsius",
            Metric::RespiratoryRate => "respiratory_rate",
        }
    }

    /// Neutral value used when a metric is missing from every record
    pub fn neutral_default(&self) -> f64 {
        match self {
            Metric::RecoveryScore => 65.0,
            Metric::Strain => 12.0,
            Metric::SleepHours => 7.5,
            Metric::CaloriesBurned => 2200.0,
            Metric::AvgHeartRate => 70.0,
            Metric::RestingHeartRate => 65.0,
            Metric::Hrv => 45.0,
            Metric::Spo2 => 97.0,
            Metric::SkinTemp => 33.5,
            Metric::RespiratoryRate => 15.0,
        }
    }

    pub fn value(&self, record: &HealthRecord) -> Option<f64> {
        match self {
            Metric::RecoveryScore => record.recovery_score,
            Metric::Strain => record.strain,
            Metric::SleepHours => record.sleep_hours,
            Metric::CaloriesBurned => record.calories_burned.map(f64::from),
            Metric::AvgHeartRate => record.avg_heart_rate,
            Metric::RestingHeartRate => record.resting_heart_rate,
            Metric::Hrv => record.hrv,
            Metric::Spo2 => record.spo2_percentage,
            Metric::SkinTemp => record.skin_temp_celsius,
            Metric::RespiratoryRate => record.respiratory_rate,
        }
    }

    /// Mean over the records where this metric is present
    pub fn mean(&self, records: &[HealthRecord]) -> Option<f64> {
        let (sum, count) = records
            .iter()
            .filter_map(|r| self.value(r))
            .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
        if count == 0 {
            None
        } else {
            Some(sum / count as f64)
        }
    }
}

/// Per-metric averages over the analysis window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricAverages {
    pub recovery_score: f64,
    pub strain: f64,
    pub sleep_hours: f64,
    pub calories_burned: f64,
    pub avg_heart_rate: f64,
    pub resting_heart_rate: f64,
    pub hrv: f64,
    pub spo2_percentage: f64,
    pub skin_temp_celsius: f64,
    pub respiratory_rate: f64,
}

impl MetricAverages {
    /// Averages made entirely of neutral defaults
    pub fn neutral() -> Self {
        let mut averages = Self {
            recovery_score: 0.0,
            strain: 0.0,
            sleep_hours: 0.0,
            calories_burned: 0.0,
            avg_heart_rate: 0.0,
            resting_heart_rate: 0.0,
            hrv: 0.0,
            spo2_percentage: 0.0,
            skin_temp_celsius: 0.0,
            respiratory_rate: 0.0,
        };
        for metric in Metric::ALL {
            averages.set(metric, metric.neutral_default());
        }
        averages
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::RecoveryScore => self.recovery_score,
            Metric::Strain => self.strain,
            Metric::SleepHours => self.sleep_hours,
            Metric::CaloriesBurned => self.calories_burned,
            Metric::AvgHeartRate => self.avg_heart_rate,
            Metric::RestingHeartRate => self.resting_heart_rate,
            Metric::Hrv => self.hrv,
            Metric::Spo2 => self.spo2_percentage,
            Metric::SkinTemp => self.skin_temp_celsius,
            Metric::RespiratoryRate => self.respiratory_rate,
        }
    }

    fn set(&mut self, metric: Metric, value: f64) {
        let slot = match metric {
            Metric::RecoveryScore => &mut self.recovery_score,
            Metric::Strain => &mut self.strain,
            Metric::SleepHours => &mut self.sleep_hours,
            Metric::CaloriesBurned => &mut self.calories_burned,
            Metric::AvgHeartRate => &mut self.avg_heart_rate,
            Metric::RestingHeartRate => &mut self.resting_heart_rate,
            Metric::Hrv => &mut self.hrv,
            Metric::Spo2 => &mut self.spo2_percentage,
            Metric::SkinTemp => &mut self.skin_temp_celsius,
            Metric::RespiratoryRate => &mut self.respiratory_rate,
        };
        *slot = value;
    }
}

// ============================================================================
// Trends
// ============================================================================

/// Direction of a metric across the analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Declining,
    Stable,
}

impl Trend {
    pub fn label(&self) -> &'static str {
        match self {
            Trend::Improving => "improving",
            Trend::Declining => "declining",
            Trend::Stable => "stable",
        }
    }
}

/// Trends for the metrics that influence meal choice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrendSet {
    pub recovery: Trend,
    pub sleep: Trend,
    pub strain: Trend,
}

impl TrendSet {
    pub fn stable() -> Self {
        Self {
            recovery: Trend::Stable,
            sleep: Trend::Stable,
            strain: Trend::Stable,
        }
    }
}

/// Classify the change from an earlier to a later average
///
/// Stable when either side is missing or the earlier average is zero.
pub fn classify_trend(earlier: Option<f64>, later: Option<f64>) -> Trend {
    match (earlier, later) {
        (Some(earlier), Some(later)) if earlier > 0.0 => {
            let change = (later - earlier) / earlier;
            if change > TREND_THRESHOLD {
                Trend::Improving
            } else if change < -TREND_THRESHOLD {
                Trend::Declining
            } else {
                Trend::Stable
            }
        }
        _ => Trend::Stable,
    }
}

/// Trend of one metric over date-ascending records
///
/// The earlier half holds `n / 2` records; the later half takes the extra
/// record when `n` is odd.
pub fn metric_trend(metric: Metric, sorted: &[HealthRecord]) -> Trend {
    let (earlier, later) = sorted.split_at(sorted.len() / 2);
    classify_trend(metric.mean(earlier), metric.mean(later))
}

// ============================================================================
// Physiological State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FatigueLevel {
    Low,
    Moderate,
    High,
}

impl FatigueLevel {
    pub fn label(&self) -> &'static str {
        match self {
            FatigueLevel::Low => "low",
            FatigueLevel::Moderate => "moderate",
            FatigueLevel::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryStatus {
    Poor,
    Adequate,
    Optimal,
}

impl RecoveryStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecoveryStatus::Poor => "poor",
            RecoveryStatus::Adequate => "adequate",
            RecoveryStatus::Optimal => "optimal",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetabolicDemand {
    Low,
    Moderate,
    High,
}

impl MetabolicDemand {
    pub fn label(&self) -> &'static str {
        match self {
            MetabolicDemand::Low => "low",
            MetabolicDemand::Moderate => "moderate",
            MetabolicDemand::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SleepQuality {
    pub fn label(&self) -> &'static str {
        match self {
            SleepQuality::Poor => "poor",
            SleepQuality::Fair => "fair",
            SleepQuality::Good => "good",
            SleepQuality::Excellent => "excellent",
        }
    }
}

/// Qualitative snapshot derived from the averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysiologicalState {
    pub fatigue_level: FatigueLevel,
    pub recovery_status: RecoveryStatus,
    pub metabolic_demand: MetabolicDemand,
    pub sleep_quality: SleepQuality,
}

pub fn classify_fatigue(recovery: f64) -> FatigueLevel {
    if recovery < 50.0 {
        FatigueLevel::High
    } else if recovery < 75.0 {
        FatigueLevel::Moderate
    } else {
        FatigueLevel::Low
    }
}

pub fn classify_recovery_status(recovery: f64) -> RecoveryStatus {
    if recovery < 34.0 {
        RecoveryStatus::Poor
    } else if recovery < 67.0 {
        RecoveryStatus::Adequate
    } else {
        RecoveryStatus::Optimal
    }
}

pub fn classify_metabolic_demand(strain: f64, calories: f64) -> MetabolicDemand {
    if strain >= 14.0 || calories >= 2800.0 {
        MetabolicDemand::High
    } else if strain >= 10.0 || calories >= 2200.0 {
        MetabolicDemand::Moderate
    } else {
        MetabolicDemand::Low
    }
}

pub fn classify_sleep_quality(sleep_hours: f64) -> SleepQuality {
    if sleep_hours < 6.0 {
        SleepQuality::Poor
    } else if sleep_hours < 7.0 {
        SleepQuality::Fair
    } else if sleep_hours < 8.0 {
        SleepQuality::Good
    } else {
        SleepQuality::Excellent
    }
}

pub fn derive_state(averages: &MetricAverages) -> PhysiologicalState {
    PhysiologicalState {
        fatigue_level: classify_fatigue(averages.recovery_score),
        recovery_status: classify_recovery_status(averages.recovery_score),
        metabolic_demand: classify_metabolic_demand(averages.strain, averages.calories_burned),
        sleep_quality: classify_sleep_quality(averages.sleep_hours),
    }
}

// ============================================================================
// Nutritional Recommendations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProteinEmphasis {
    Standard,
    Moderate,
    High,
}

impl ProteinEmphasis {
    pub fn label(&self) -> &'static str {
        match self {
            ProteinEmphasis::Standard => "standard",
            ProteinEmphasis::Moderate => "moderate",
            ProteinEmphasis::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbTiming {
    Balanced,
    AroundTraining,
    EveningFocused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnergyDensity {
    Light,
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NutritionalRecommendations {
    pub protein_emphasis: ProteinEmphasis,
    pub carb_timing: CarbTiming,
    pub anti_inflammatory: bool,
    pub hydration_focus: bool,
    pub energy_density: EnergyDensity,
}

pub fn derive_recommendations(state: &PhysiologicalState) -> NutritionalRecommendations {
    let protein_emphasis = match (state.fatigue_level, state.metabolic_demand) {
        (FatigueLevel::High, _) | (_, MetabolicDemand::High) => ProteinEmphasis::High,
        (FatigueLevel::Moderate, _) | (_, MetabolicDemand::Moderate) => ProteinEmphasis::Moderate,
        _ => ProteinEmphasis::Standard,
    };

    let carb_timing = if state.metabolic_demand == MetabolicDemand::High {
        CarbTiming::AroundTraining
    } else if matches!(state.sleep_quality, SleepQuality::Poor | SleepQuality::Fair) {
        CarbTiming::EveningFocused
    } else {
        CarbTiming::Balanced
    };

    let energy_density = match state.metabolic_demand {
        MetabolicDemand::High => EnergyDensity::High,
        MetabolicDemand::Moderate => EnergyDensity::Moderate,
        MetabolicDemand::Low => EnergyDensity::Light,
    };

    NutritionalRecommendations {
        protein_emphasis,
        carb_timing,
        anti_inflammatory: state.fatigue_level == FatigueLevel::High
            || state.recovery_status == RecoveryStatus::Poor,
        hydration_focus: state.metabolic_demand == MetabolicDemand::High
            || state.recovery_status == RecoveryStatus::Poor,
        energy_density,
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Inclusive range of days covered by an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Calendar days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Result of analyzing a window of WHOOP records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhoopAnalysis {
    pub record_count: usize,
    /// `None` only for the neutral default analysis
    pub date_range: Option<DateRange>,
    pub averages: MetricAverages,
    /// Metrics absent from every record, averaged as their neutral default
    #[serde(default)]
    pub defaulted_metrics: Vec<String>,
    pub trends: TrendSet,
    pub physiological_state: PhysiologicalState,
    pub recommendations: NutritionalRecommendations,
}

impl WhoopAnalysis {
    /// Default analysis for users without any synced data
    pub fn neutral() -> Self {
        let averages = MetricAverages::neutral();
        let physiological_state = derive_state(&averages);
        let recommendations = derive_recommendations(&physiological_state);
        Self {
            record_count: 0,
            date_range: None,
            averages,
            defaulted_metrics: Metric::ALL.iter().map(|m| m.name().to_string()).collect(),
            trends: TrendSet::stable(),
            physiological_state,
            recommendations,
        }
    }

    pub fn has_data(&self) -> bool {
        self.record_count > 0
    }

    /// Check an analysis received from outside the analyzer
    pub fn validate(&self) -> PlannerResult<()> {
        for metric in Metric::ALL {
            let value = self.averages.get(metric);
            if !value.is_finite() {
                return Err(PlannerError::InvalidAnalysis(format!(
                    "average {} is not a finite number",
                    metric.name()
                )));
            }
            if value < 0.0 {
                return Err(PlannerError::InvalidAnalysis(format!(
                    "average {} is negative ({})",
                    metric.name(),
                    value
                )));
            }
        }
        if self.averages.recovery_score > 100.0 {
            return Err(PlannerError::InvalidAnalysis(format!(
                "average recovery_score {} exceeds 100",
                self.averages.recovery_score
            )));
        }
        match (self.record_count, &self.date_range) {
            (0, Some(_)) => Err(PlannerError::InvalidAnalysis(
                "date_range present without records".to_string(),
            )),
            (n, None) if n > 0 => Err(PlannerError::InvalidAnalysis(format!(
                "record_count is {} but date_range is missing",
                n
            ))),
            (_, Some(range)) if range.start > range.end => Err(PlannerError::InvalidAnalysis(
                format!("date_range start {} is after end {}", range.start, range.end),
            )),
            (n, Some(range)) if n as i64 > range.days() => {
                Err(PlannerError::InvalidAnalysis(format!(
                    "record_count {} exceeds the {} days between {} and {}",
                    n,
                    range.days(),
                    range.start,
                    range.end
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Analyze a window of daily records for one user
///
/// Records may arrive in any date order; a sorted copy is analyzed. When
/// two records share a date the later one in the input wins, as a later
/// sync would.
pub fn analyze(records: &[HealthRecord]) -> PlannerResult<WhoopAnalysis> {
    if records.is_empty() {
        return Err(PlannerError::EmptyRecords);
    }

    let mut ordered = records.to_vec();
    ordered.sort_by_key(|r| r.date);
    let mut sorted: Vec<HealthRecord> = Vec::with_capacity(ordered.len());
    for record in ordered {
        match sorted.last_mut() {
            Some(last) if last.date == record.date => *last = record,
            _ => sorted.push(record),
        }
    }

    let mut averages = MetricAverages::neutral();
    let mut defaulted_metrics = Vec::new();
    for metric in Metric::ALL {
        match metric.mean(&sorted) {
            Some(mean) => averages.set(metric, mean),
            None => defaulted_metrics.push(metric.name().to_string()),
        }
    }

    let trends = TrendSet {
        recovery: metric_trend(Metric::RecoveryScore, &sorted),
        sleep: metric_trend(Metric::SleepHours, &sorted),
        strain: metric_trend(Metric::Strain, &sorted),
    };

    let physiological_state = derive_state(&averages);
    let recommendations = derive_recommendations(&physiological_state);

    let date_range = DateRange {
        start: sorted[0].date,
        end: sorted[sorted.len() - 1].date,
    };

    Ok(WhoopAnalysis {
        record_count: sorted.len(),
        date_range: Some(date_range),
        averages,
        defaulted_metrics,
        trends,
        physiological_state,
        recommendations,
    })
}

/// Human-readable summary of an analysis for display
pub fn whoop_insights(analysis: &WhoopAnalysis) -> String {
    let avg = &analysis.averages;
    let state = &analysis.physiological_state;
    let rec = &analysis.recommendations;

    let header = match &analysis.date_range {
        Some(range) => format!(
            "Based on {} days of WHOOP data ({} to {})",
            analysis.record_count, range.start, range.end
        ),
        None => "No WHOOP data available, using baseline values".to_string(),
    };

    let mut focus = vec![format!("{} protein", rec.protein_emphasis.label())];
    focus.push(
        match rec.carb_timing {
            CarbTiming::Balanced => "balanced carbs",
            CarbTiming::AroundTraining => "carbs around training",
            CarbTiming::EveningFocused => "complex carbs in the evening",
        }
        .to_string(),
    );
    if rec.anti_inflammatory {
        focus.push("anti-inflammatory foods".to_string());
    }
    if rec.hydration_focus {
        focus.push("extra hydration".to_string());
    }

    format!(
        "{}: average recovery {:.0}% ({}), sleep {:.1}h ({}), strain {:.1} ({}). \
         Fatigue is {}, metabolic demand is {} and sleep quality is {}. \
         Focus: {}.",
        header,
        avg.recovery_score,
        analysis.trends.recovery.label(),
        avg.sleep_hours,
        analysis.trends.sleep.label(),
        avg.strain,
        analysis.trends.strain.label(),
        state.fatigue_level.label(),
        state.metabolic_demand.label(),
        state.sleep_quality.label(),
        focus.join(", ")
    )
}
