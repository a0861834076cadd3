//! Plain-text reports.
//!
//! A printable report for one prediction record and a textual rendering of
//! the dashboard summary. Output is plain UTF-8 with fixed-width columns.

use std::fmt::Write as _;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::application::analytics::{ChartPoint, DashboardSummary};
use crate::domain::{PredictionRecord, FIELD_SPECS};

const RULE_WIDTH: usize = 64;
const MAX_REPORT_FEATURES: usize = 10;
const MAX_REPORT_RECOMMENDATIONS: usize = 5;

const DISCLAIMER: &str = "This prediction is based on a machine learning model and should not \
be used as a substitute for professional medical advice. Always consult with a qualified \
healthcare provider for accurate diagnosis and treatment recommendations.";

fn rule(out: &mut String) {
    out.push_str(&"─".repeat(RULE_WIDTH));
    out.push('\n');
}

fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "\n{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
}

fn percent(probability: Option<f64>) -> String {
    probability.map_or_else(|| "N/A".to_string(), |p| format!("{:.1}%", p * 100.0))
}

/// Ten-cell bar for a probability in [0, 1].
#[must_use]
pub fn risk_bar(probability: f64) -> String {
    let filled = (probability.clamp(0.0, 1.0) * 10.0) as usize;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(10 - filled))
}

/// Render the printable report for one record.
#[must_use]
pub fn render_record_report(record: &PredictionRecord, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Heart Disease Risk Assessment");
    let _ = writeln!(
        out,
        "Report generated: {}",
        generated_at.format("%B %d, %Y at %H:%M UTC")
    );
    let _ = writeln!(out, "Prediction: {}", record.id());
    rule(&mut out);

    section(&mut out, "Patient & Test Information");
    let input = record.input_data();
    for (spec, value) in FIELD_SPECS.iter().zip(input.to_vec()) {
        let _ = writeln!(out, "  {:<26} {}", format!("{}:", spec.label), value);
    }
    let _ = writeln!(
        out,
        "  {:<26} {}",
        "Test date:",
        record.timestamp().format("%Y-%m-%d %H:%M")
    );

    section(&mut out, "Prediction Results");
    let risk = record
        .risk_level()
        .map_or_else(|| "Unknown".to_string(), ToString::to_string);
    let _ = writeln!(out, "  {:<26} {} Risk", "Risk level:", risk);
    let _ = writeln!(out, "  {:<26} {}", "Probability:", percent(record.probability()));
    let _ = writeln!(
        out,
        "  {:<26} {}",
        "Confidence:",
        record.confidence().unwrap_or("N/A")
    );
    if let Some(p) = record.probability() {
        let _ = writeln!(out, "  {:<26} {} {}", "Risk visualization:", risk_bar(p), percent(Some(p)));
    }
    if let Some(level) = record.risk_level() {
        let _ = writeln!(out, "  {}", level.description());
    }
    if record.is_partial() {
        let _ = writeln!(out, "  Note: the service returned an incomplete result.");
    }

    let features = record.top_features(MAX_REPORT_FEATURES);
    if !features.is_empty() {
        section(&mut out, "Feature Importance Analysis");
        let _ = writeln!(out, "  {:<12} {:>10}  Impact", "Feature", "Importance");
        for (name, weight) in features {
            let impact = if weight > 0.0 { "Increases risk" } else { "Decreases risk" };
            let _ = writeln!(out, "  {name:<12} {weight:>10.3}  {impact}");
        }
    }

    let recommendations = record.personalized_recommendations();
    if !recommendations.is_empty() {
        section(&mut out, "Recommended Next Steps");
        for rec in recommendations.iter().take(MAX_REPORT_RECOMMENDATIONS) {
            let _ = writeln!(out, "  • {rec}");
        }
    }

    section(&mut out, "Important Disclaimer");
    let _ = writeln!(out, "  {DISCLAIMER}");
    rule(&mut out);

    out
}

/// Write the record report to `path`, replacing any existing file.
///
/// # Errors
/// Returns `HeartwiseError::Io` if the file cannot be written.
pub fn save_record_report(
    record: &PredictionRecord,
    path: &Path,
    generated_at: DateTime<Utc>,
) -> crate::Result<()> {
    std::fs::write(path, render_record_report(record, generated_at))?;
    tracing::info!("Report for prediction {} saved", record.id());
    Ok(())
}

/// Export records as a pretty-printed JSON array.
///
/// # Errors
/// Returns `HeartwiseError::Serialization` if encoding fails, or
/// `HeartwiseError::Io` if the file cannot be written.
pub fn export_history(records: &[PredictionRecord], path: &Path) -> crate::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    tracing::info!("Exported {} predictions", records.len());
    Ok(())
}

fn series_row(out: &mut String, point: &ChartPoint) {
    let risk = point
        .risk_level
        .as_ref()
        .map_or("-", |level| level.as_str());
    let _ = writeln!(
        out,
        "  {:<14} {}  {:>6}  {:<7} age {:>3}  chol {:>3}",
        point.label,
        point.date,
        percent(point.probability),
        risk,
        point.age,
        point.cholesterol
    );
}

/// Render the dashboard summary as text.
#[must_use]
pub fn render_dashboard(summary: &DashboardSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Health Dashboard ({})", summary.range);
    rule(&mut out);

    if summary.is_empty() {
        let _ = writeln!(out, "No predictions yet. Submit one to see your dashboard.");
        return out;
    }

    let _ = writeln!(out, "  {:<22} {}", "Total predictions:", summary.total);
    let _ = writeln!(
        out,
        "  {:<22} {}",
        "Average risk:",
        percent(Some(summary.average_probability))
    );
    let _ = writeln!(
        out,
        "  {:<22} {} high / {} medium / {} low",
        "Risk distribution:", summary.counts.high, summary.counts.medium, summary.counts.low
    );
    let trend = match summary.trend_delta {
        Some(delta) if delta > 0.0 => format!("improving by {:.1} points", delta * 100.0),
        Some(delta) if delta < 0.0 => format!("worsening by {:.1} points", -delta * 100.0),
        Some(_) => "stable".to_string(),
        None => "not enough data".to_string(),
    };
    let _ = writeln!(out, "  {:<22} {}", "Trend:", trend);
    let _ = writeln!(
        out,
        "  {:<22} {:.0}% low-risk results",
        "Consistency:",
        summary.consistency_ratio * 100.0
    );

    section(&mut out, "Risk Over Time");
    for point in &summary.series {
        series_row(&mut out, point);
    }

    if !summary.comparison.is_empty() {
        section(&mut out, "Recent Comparison");
        for point in &summary.comparison {
            let probability = point.probability.unwrap_or(0.0);
            let _ = writeln!(out, "  {:<14} {} {}", point.label, risk_bar(probability), percent(point.probability));
        }
    }

    section(&mut out, "Recent Predictions");
    for record in &summary.recent {
        let risk = record.risk_level().map_or("-", |level| level.as_str());
        let _ = writeln!(
            out,
            "  {:<6} {}  {:<7} {:>6}",
            record.id().to_string(),
            record.timestamp().format("%Y-%m-%d %H:%M"),
            risk,
            percent(record.probability())
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analytics::TimeRange;
    use crate::domain::{ClinicalInput, PredictionResponse, RiskLevel};
    use crate::HeartwiseError;
    use chrono::{Duration, TimeZone};
    use std::collections::BTreeMap;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0)
            .single()
            .expect("Valid date")
    }

    fn record(probability: f64, level: RiskLevel, timestamp: DateTime<Utc>) -> PredictionRecord {
        let response = PredictionResponse {
            prediction: Some(u8::from(probability >= 0.5)),
            probability: Some(probability),
            risk_level: Some(level),
            confidence: Some(format!("{:.1}%", probability * 100.0)),
            feature_importance: BTreeMap::from([
                ("ca".to_string(), 0.25),
                ("thalach".to_string(), -0.08),
            ]),
            recommendations: vec!["Consult a cardiologist".to_string()],
        };
        let input = ClinicalInput {
            age: 63.0,
            chol: 233.0,
            ..Default::default()
        };
        PredictionRecord::create_at(response, input, timestamp)
    }

    #[test]
    fn test_risk_bar() {
        assert_eq!(risk_bar(0.87), "[████████░░]");
        assert_eq!(risk_bar(0.0), "[░░░░░░░░░░]");
        assert_eq!(risk_bar(1.5), "[██████████]");
    }

    #[test]
    fn test_record_report_sections() {
        let report = render_record_report(&record(0.87, RiskLevel::High, at()), at());

        assert!(report.contains("Report generated: March 01, 2024 at 09:30 UTC"));
        assert!(report.contains("Patient & Test Information"));
        assert!(report.contains("High Risk"));
        assert!(report.contains("87.0%"));
        assert!(report.contains("Increases risk"));
        assert!(report.contains("Decreases risk"));
        assert!(report.contains("• Focus on managing ca as it's a significant risk factor"));
        assert!(report.contains("Important Disclaimer"));
        assert!(!report.contains("incomplete result"));
    }

    #[test]
    fn test_partial_record_report() {
        let response = PredictionResponse {
            prediction: Some(1),
            ..Default::default()
        };
        let partial = PredictionRecord::create_at(response, ClinicalInput::default(), at());
        let report = render_record_report(&partial, at());

        assert!(report.contains("Unknown Risk"));
        assert!(report.contains("Probability:"));
        assert!(report.contains("N/A"));
        assert!(report.contains("incomplete result"));
    }

    #[test]
    fn test_dashboard_empty() {
        let summary = DashboardSummary::compute_at(&[], TimeRange::All, at());
        assert!(render_dashboard(&summary).contains("No predictions yet"));
    }

    #[test]
    fn test_dashboard_trend_wording() {
        let records = vec![
            record(0.3, RiskLevel::Low, at()),
            record(0.8, RiskLevel::High, at() - Duration::days(1)),
        ];
        let summary = DashboardSummary::compute_at(&records, TimeRange::Last7Days, at());
        let text = render_dashboard(&summary);

        assert!(text.contains("Health Dashboard (7days)"));
        assert!(text.contains("improving by 50.0 points"));
        assert!(text.contains("1 high / 0 medium / 1 low"));
        assert!(text.contains("Recent Comparison"));
    }

    #[test]
    fn test_save_record_report() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("report.txt");

        save_record_report(&record(0.87, RiskLevel::High, at()), &path, at())
            .expect("Should save");
        let text = std::fs::read_to_string(&path).expect("Should read back");
        assert!(text.starts_with("Heart Disease Risk Assessment"));

        let missing = dir.path().join("no-such-dir").join("report.txt");
        let err = save_record_report(&record(0.2, RiskLevel::Low, at()), &missing, at())
            .expect_err("Parent directory does not exist");
        assert!(matches!(err, HeartwiseError::Io(_)));
    }

    #[test]
    fn test_export_history_json() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("history.json");
        let records = vec![
            record(0.3, RiskLevel::Low, at()),
            record(0.8, RiskLevel::from("Severe"), at() - Duration::days(1)),
        ];

        export_history(&records, &path).expect("Should export");
        let body: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("Should read back"))
                .expect("Valid JSON");

        let rows = body.as_array().expect("JSON array");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["risk_level"], "Low");
        assert_eq!(rows[1]["risk_level"], "Severe");
        assert_eq!(rows[0]["input_data"]["age"], 63.0);
    }
}
