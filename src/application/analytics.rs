//! Analytics: Dashboard statistics derived from prediction history.
//!
//! Every function here is pure and total: empty input, a single record, or an
//! unexpected risk category yields a neutral value (0, `None`, or exclusion),
//! never an error. Nothing is cached; callers recompute from a fresh
//! `HistoryStore::get_all()` snapshot.

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{PredictionRecord, RiskLevel};

/// Number of points kept by [`comparison_series`].
pub const COMPARISON_WINDOW: usize = 5;

/// Number of rows shown in the recent predictions table.
pub const RECENT_LIMIT: usize = 5;

/// Dashboard time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeRange {
    #[default]
    All,
    Last7Days,
    Last30Days,
}

impl TimeRange {
    /// Trailing window length, `None` for `All`.
    #[must_use]
    pub fn days(self) -> Option<i64> {
        match self {
            Self::All => None,
            Self::Last7Days => Some(7),
            Self::Last30Days => Some(30),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Last7Days => "7days",
            Self::Last30Days => "30days",
        }
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" => Ok(Self::All),
            "7days" => Ok(Self::Last7Days),
            "30days" => Ok(Self::Last30Days),
            other => Err(format!(
                "Unknown time range '{other}' (expected all, 7days or 30days)"
            )),
        }
    }
}

impl std::fmt::Display for TimeRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One chart point of the chronological series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// "Prediction k", k counted from the earliest record
    pub label: String,
    /// Calendar date (YYYY-MM-DD, UTC)
    pub date: String,
    pub timestamp: DateTime<Utc>,
    pub probability: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    /// Submitted age
    pub age: f64,
    /// Submitted serum cholesterol
    pub cholesterol: f64,
}

/// Record counts per risk bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl RiskCounts {
    /// Records that landed in one of the three buckets.
    #[must_use]
    pub fn bucketed(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Keep records inside the trailing window ending now.
#[must_use]
pub fn filter_by_time_range(records: &[PredictionRecord], range: TimeRange) -> Vec<PredictionRecord> {
    filter_by_time_range_at(records, range, Utc::now())
}

/// Keep records with `timestamp >= now - N days`. `All` is the identity.
#[must_use]
pub fn filter_by_time_range_at(
    records: &[PredictionRecord],
    range: TimeRange,
    now: DateTime<Utc>,
) -> Vec<PredictionRecord> {
    match range.days() {
        None => records.to_vec(),
        Some(days) => {
            let cutoff = now - Duration::days(days);
            records
                .iter()
                .filter(|r| r.timestamp() >= cutoff)
                .cloned()
                .collect()
        }
    }
}

/// Sort ascending by timestamp and label the result "Prediction 1..n".
///
/// Ties on timestamp fall back to creation order. Missing age/cholesterol
/// chart as 0.
#[must_use]
pub fn to_chronological_series(records: &[PredictionRecord]) -> Vec<ChartPoint> {
    let mut ordered: Vec<&PredictionRecord> = records.iter().collect();
    ordered.sort_by_key(|r| (r.timestamp(), r.id()));

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, r)| {
            let input = r.input_data();
            ChartPoint {
                label: format!("Prediction {}", i + 1),
                date: r.timestamp().format("%Y-%m-%d").to_string(),
                timestamp: r.timestamp(),
                probability: r.probability(),
                risk_level: r.risk_level().cloned(),
                age: finite_or_zero(input.age),
                cholesterol: finite_or_zero(input.chol),
            }
        })
        .collect()
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// Last [`COMPARISON_WINDOW`] points of the chronological series.
///
/// Empty when fewer than two records are available.
#[must_use]
pub fn comparison_series(records: &[PredictionRecord]) -> Vec<ChartPoint> {
    if records.len() < 2 {
        return Vec::new();
    }
    let series = to_chronological_series(records);
    let skip = series.len().saturating_sub(COMPARISON_WINDOW);
    series.into_iter().skip(skip).collect()
}

/// Exact counts of High/Medium/Low; other or missing levels are not counted.
#[must_use]
pub fn compute_risk_counts(records: &[PredictionRecord]) -> RiskCounts {
    records
        .iter()
        .fold(RiskCounts::default(), |mut counts, r| {
            match r.risk_level() {
                Some(RiskLevel::High) => counts.high += 1,
                Some(RiskLevel::Medium) => counts.medium += 1,
                Some(RiskLevel::Low) => counts.low += 1,
                Some(RiskLevel::Unrecognized(_)) | None => {}
            }
            counts
        })
}

/// Mean probability over records that carry one; 0 if none do.
#[must_use]
pub fn compute_average_probability(records: &[PredictionRecord]) -> f64 {
    let (sum, n) = records
        .iter()
        .filter_map(PredictionRecord::probability)
        .fold((0.0, 0usize), |(sum, n), p| (sum + p, n + 1));

    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

/// Earliest minus latest probability of a chronological series.
///
/// Positive means risk went down. `None` with fewer than two points or when
/// an endpoint has no probability. Intermediate points are ignored, so noisy
/// data can disagree with the visual trend.
#[must_use]
pub fn compute_trend_delta(series: &[ChartPoint]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }
    let first = series.first()?.probability?;
    let last = series.last()?.probability?;
    Some(first - last)
}

/// Share of records rated Low; 0 for empty input.
#[must_use]
pub fn compute_consistency_ratio(records: &[PredictionRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    compute_risk_counts(records).low as f64 / records.len() as f64
}

/// First `n` records in their native (newest-first) order.
#[must_use]
pub fn take_recent(records: &[PredictionRecord], n: usize) -> Vec<PredictionRecord> {
    records.iter().take(n).cloned().collect()
}

/// Everything the dashboard shows for one time window.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub range: TimeRange,
    pub total: usize,
    pub counts: RiskCounts,
    pub average_probability: f64,
    pub trend_delta: Option<f64>,
    pub consistency_ratio: f64,
    pub series: Vec<ChartPoint>,
    pub comparison: Vec<ChartPoint>,
    pub recent: Vec<PredictionRecord>,
}

impl DashboardSummary {
    /// Compute the dashboard over a newest-first snapshot.
    #[must_use]
    pub fn compute(records: &[PredictionRecord], range: TimeRange) -> Self {
        Self::compute_at(records, range, Utc::now())
    }

    #[must_use]
    pub fn compute_at(records: &[PredictionRecord], range: TimeRange, now: DateTime<Utc>) -> Self {
        let filtered = filter_by_time_range_at(records, range, now);
        let series = to_chronological_series(&filtered);

        Self {
            range,
            total: filtered.len(),
            counts: compute_risk_counts(&filtered),
            average_probability: compute_average_probability(&filtered),
            trend_delta: compute_trend_delta(&series),
            consistency_ratio: compute_consistency_ratio(&filtered),
            comparison: comparison_series(&filtered),
            recent: take_recent(&filtered, RECENT_LIMIT),
            series,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
