//! Prediction API port: Trait for the external prediction service.
//!
//! This trait abstracts the HTTP transport from the application logic so the
//! submission path can be exercised without a running backend.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{ClinicalInput, PredictionResponse};

/// Fallback shown when the service sends no `error` message.
pub const REMOTE_ERROR_FALLBACK: &str =
    "Failed to get prediction. Please check your data and try again.";

/// Errors that can occur while talking to the prediction service.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("Server responded with status {status}")]
    Remote {
        status: u16,
        error: Option<String>,
        details: Option<String>,
    },

    /// No response was received.
    #[error("No response received: {0}")]
    Transport(String),

    /// The request could not be constructed or sent.
    #[error("Request could not be constructed: {0}")]
    Request(String),

    /// A success status with an unreadable body.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Remote { error, details, .. } => {
                let message = error.as_deref().unwrap_or(REMOTE_ERROR_FALLBACK);
                match details {
                    Some(d) => format!("Server error: {message} Details: {d}"),
                    None => format!("Server error: {message}"),
                }
            }
            Self::Transport(_) => "Network error: Unable to connect to the prediction service. Please make sure the backend server is running.".to_string(),
            Self::Request(message) => format!("Error: {message}"),
            Self::Decode(message) => {
                format!("Error: The prediction service returned an unreadable response ({message})")
            }
        }
    }
}

/// Error body sent by the service on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl HealthStatus {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Trait for the external prediction service.
///
/// Implementations must not retry; each call maps to exactly one request.
pub trait PredictionApi: Send + Sync {
    /// Submit one patient's features (`POST /predict`).
    ///
    /// # Errors
    /// Returns `ApiError` for remote, transport, or decoding failures.
    fn predict(&self, input: &ClinicalInput) -> Result<PredictionResponse, ApiError>;

    /// Upload a CSV file for batch scoring (`POST /predict/batch`).
    ///
    /// # Errors
    /// Returns `ApiError` if the file cannot be read or the request fails.
    fn predict_batch(&self, csv_path: &Path) -> Result<serde_json::Value, ApiError>;

    /// Model metadata (`GET /model/info`).
    ///
    /// # Errors
    /// Returns `ApiError` if the request fails.
    fn model_info(&self) -> Result<serde_json::Value, ApiError>;

    /// Feature descriptions and valid ranges (`GET /features`).
    ///
    /// # Errors
    /// Returns `ApiError` if the request fails.
    fn features(&self) -> Result<serde_json::Value, ApiError>;

    /// Service health (`GET /health`).
    ///
    /// # Errors
    /// Returns `ApiError` if the request fails.
    fn health(&self) -> Result<HealthStatus, ApiError>;
}
