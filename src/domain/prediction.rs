//! Prediction result and history record types.
//!
//! Represents the output of the external heart disease prediction service and
//! the immutable record kept for each completed request.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clinical::ClinicalInput;

/// Risk level bucket assigned by the prediction service.
///
/// The service is trusted as given: categories outside Low/Medium/High are
/// kept verbatim as `Unrecognized` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RiskLevel {
    /// Low risk of heart disease
    Low,
    /// Medium risk, follow-up recommended
    Medium,
    /// High risk, consultation recommended
    High,
    /// Any other label sent by the service
    Unrecognized(String),
}

impl RiskLevel {
    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Low => "Low risk - Maintain healthy habits",
            Self::Medium => "Medium risk - Follow-up recommended",
            Self::High => "High risk - Consult a cardiologist",
            Self::Unrecognized(_) => "Unrecognized risk category",
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unrecognized(label) => label,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(label: String) -> Self {
        match label.as_str() {
            "Low" => Self::Low,
            "Medium" => Self::Medium,
            "High" => Self::High,
            _ => Self::Unrecognized(label),
        }
    }
}

impl From<&str> for RiskLevel {
    fn from(label: &str) -> Self {
        Self::from(label.to_string())
    }
}

impl From<RiskLevel> for String {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Unrecognized(label) => label,
            other => other.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a successful `POST /predict` response.
///
/// Every field is optional on the wire; see [`PredictionResult`] for how
/// absent fields are surfaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Binary prediction (0 = no disease signal, 1 = disease signal)
    #[serde(default)]
    pub prediction: Option<u8>,

    /// Estimated risk probability (0.0 to 1.0)
    #[serde(default)]
    pub probability: Option<f64>,

    #[serde(default)]
    pub risk_level: Option<RiskLevel>,

    /// Display string such as "87.0%"
    #[serde(default)]
    pub confidence: Option<String>,

    /// Signed per-feature contribution (positive increases risk)
    #[serde(default)]
    pub feature_importance: BTreeMap<String, f64>,

    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// A prediction response classified by completeness.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionResult {
    /// prediction, probability and risk_level were all present
    Complete(PredictionResponse),
    /// At least one of them was absent
    Partial {
        response: PredictionResponse,
        missing: Vec<&'static str>,
    },
}

impl PredictionResult {
    /// Classify a decoded response.
    #[must_use]
    pub fn from_response(response: PredictionResponse) -> Self {
        let mut missing = Vec::new();
        if response.prediction.is_none() {
            missing.push("prediction");
        }
        if response.probability.is_none() {
            missing.push("probability");
        }
        if response.risk_level.is_none() {
            missing.push("risk_level");
        }

        if missing.is_empty() {
            Self::Complete(response)
        } else {
            Self::Partial { response, missing }
        }
    }

    #[must_use]
    pub fn response(&self) -> &PredictionResponse {
        match self {
            Self::Complete(response) | Self::Partial { response, .. } => response,
        }
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Partial { .. })
    }

    fn into_parts(self) -> (PredictionResponse, bool) {
        match self {
            Self::Complete(response) => (response, false),
            Self::Partial { response, .. } => (response, true),
        }
    }
}

impl From<PredictionResponse> for PredictionResult {
    fn from(response: PredictionResponse) -> Self {
        Self::from_response(response)
    }
}

/// Opaque record identifier, increasing with creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordId(u64);

static NEXT_RECORD_ID: AtomicU64 = AtomicU64::new(1);

impl RecordId {
    fn next() -> Self {
        Self(NEXT_RECORD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One stored prediction: the service's answer plus the input that produced it.
///
/// Immutable after creation; fields are only readable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    id: RecordId,
    timestamp: DateTime<Utc>,
    prediction: Option<u8>,
    probability: Option<f64>,
    risk_level: Option<RiskLevel>,
    confidence: Option<String>,
    feature_importance: BTreeMap<String, f64>,
    recommendations: Vec<String>,
    input_data: ClinicalInput,
    partial: bool,
}

impl PredictionRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn create(result: impl Into<PredictionResult>, input: ClinicalInput) -> Self {
        Self::create_at(result, input, Utc::now())
    }

    /// Create a record with an explicit creation instant.
    #[must_use]
    pub fn create_at(
        result: impl Into<PredictionResult>,
        input: ClinicalInput,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let (response, partial) = result.into().into_parts();
        Self {
            id: RecordId::next(),
            timestamp,
            prediction: response.prediction,
            probability: response.probability,
            risk_level: response.risk_level,
            confidence: response.confidence,
            feature_importance: response.feature_importance,
            recommendations: response.recommendations,
            input_data: input,
            partial,
        }
    }

    #[must_use]
    pub fn id(&self) -> RecordId {
        self.id
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn prediction(&self) -> Option<u8> {
        self.prediction
    }

    #[must_use]
    pub fn probability(&self) -> Option<f64> {
        self.probability
    }

    #[must_use]
    pub fn risk_level(&self) -> Option<&RiskLevel> {
        self.risk_level.as_ref()
    }

    #[must_use]
    pub fn confidence(&self) -> Option<&str> {
        self.confidence.as_deref()
    }

    #[must_use]
    pub fn feature_importance(&self) -> &BTreeMap<String, f64> {
        &self.feature_importance
    }

    #[must_use]
    pub fn recommendations(&self) -> &[String] {
        &self.recommendations
    }

    #[must_use]
    pub fn input_data(&self) -> &ClinicalInput {
        &self.input_data
    }

    /// Whether the originating response lacked required fields.
    #[must_use]
    pub fn is_partial(&self) -> bool {
        self.partial
    }

    /// Feature importances by descending absolute weight, at most `n`.
    #[must_use]
    pub fn top_features(&self, n: usize) -> Vec<(&str, f64)> {
        let mut features: Vec<(&str, f64)> = self
            .feature_importance
            .iter()
            .map(|(name, weight)| (name.as_str(), *weight))
            .collect();
        features.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        features.truncate(n);
        features
    }

    /// Server recommendations extended with input-specific advice.
    #[must_use]
    pub fn personalized_recommendations(&self) -> Vec<String> {
        let mut recommendations = self.recommendations.clone();

        if let Some((feature, _)) = self
            .top_features(3)
            .into_iter()
            .find(|(_, weight)| weight.abs() > 0.1)
        {
            recommendations.push(format!(
                "Focus on managing {feature} as it's a significant risk factor"
            ));
        }
        if self.input_data.age > 50.0 {
            recommendations.push("Consider regular cardiac screenings due to age factor".to_string());
        }
        if self.input_data.chol > 240.0 {
            recommendations
                .push("Work with your doctor to manage high cholesterol levels".to_string());
        }

        recommendations
    }
}
