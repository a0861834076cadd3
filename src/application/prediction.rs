//! Prediction service: The submission boundary.
//!
//! This service coordinates:
//! - Form coercion (local rejection, no network call)
//! - The remote prediction request
//! - Record construction and history append
//!
//! A failed submission never touches the history.

use std::path::Path;
use std::sync::Arc;

use crate::application::HistoryStore;
use crate::domain::{ClinicalInput, PredictionForm, PredictionRecord, PredictionResult};
use crate::ports::{HealthStatus, PredictionApi};
use crate::HeartwiseError;

/// Service for submitting predictions and recording their results.
pub struct PredictionService<A>
where
    A: PredictionApi,
{
    api: Arc<A>,
    history: Arc<HistoryStore>,
}

impl<A> PredictionService<A>
where
    A: PredictionApi,
{
    /// Create a new prediction service.
    pub fn new(api: Arc<A>, history: Arc<HistoryStore>) -> Self {
        Self { api, history }
    }

    /// The history this service appends to.
    #[must_use]
    pub fn history(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Coerce a form and submit it.
    ///
    /// # Errors
    /// Returns `HeartwiseError::Validation` if any field is empty or not a
    /// number, or `HeartwiseError::Api` if the request fails.
    pub fn submit(&self, form: &PredictionForm) -> Result<PredictionRecord, HeartwiseError> {
        let input = form.to_clinical_input()?;
        self.submit_input(input)
    }

    /// Submit validated input and append the result to history.
    ///
    /// # Errors
    /// Returns `HeartwiseError::Api` if the request fails.
    pub fn submit_input(&self, input: ClinicalInput) -> Result<PredictionRecord, HeartwiseError> {
        tracing::info!("Submitting prediction request");

        let response = self.api.predict(&input)?;
        let result = PredictionResult::from_response(response);
        if let PredictionResult::Partial { missing, .. } = &result {
            tracing::warn!(
                "Prediction response missing fields: {}",
                missing.join(", ")
            );
        }

        let record = self.history.add_prediction(result, input);
        tracing::info!(
            "Prediction recorded: id={} risk={}",
            record.id(),
            record
                .risk_level()
                .map_or("unknown", |level| level.as_str())
        );
        Ok(record)
    }

    /// Out-of-range warnings for the input. Not enforced at submission.
    #[must_use]
    pub fn range_warnings(input: &ClinicalInput) -> Vec<String> {
        input.validate().err().unwrap_or_default()
    }

    /// Upload a CSV for batch scoring. Results are not recorded.
    ///
    /// # Errors
    /// Returns `HeartwiseError::Api` if the upload fails.
    pub fn submit_batch(&self, csv_path: &Path) -> Result<serde_json::Value, HeartwiseError> {
        tracing::info!("Submitting batch file");
        Ok(self.api.predict_batch(csv_path)?)
    }

    /// # Errors
    /// Returns `HeartwiseError::Api` if the request fails.
    pub fn model_info(&self) -> Result<serde_json::Value, HeartwiseError> {
        Ok(self.api.model_info()?)
    }

    /// # Errors
    /// Returns `HeartwiseError::Api` if the request fails.
    pub fn features(&self) -> Result<serde_json::Value, HeartwiseError> {
        Ok(self.api.features()?)
    }

    /// # Errors
    /// Returns `HeartwiseError::Api` if the request fails.
    pub fn health(&self) -> Result<HealthStatus, HeartwiseError> {
        Ok(self.api.health()?)
    }
}
