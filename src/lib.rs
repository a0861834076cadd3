//! # Heartwise
//!
//! Client for a heart disease risk assessment service.
//!
//! This crate provides:
//! - Validation and coercion of the 13 UCI clinical inputs
//! - A blocking HTTP adapter for the external prediction service
//! - A session-lifetime prediction history with change notifications
//! - Pure dashboard analytics over that history
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (clinical input, form, prediction record)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (reqwest client, log sanitizer)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven client settings

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use domain::{ClinicalInput, PredictionRecord, RiskLevel};

/// Result type for Heartwise operations
pub type Result<T> = std::result::Result<T, HeartwiseError>;

/// Main error type for Heartwise
#[derive(Debug, thiserror::Error)]
pub enum HeartwiseError {
    #[error("Invalid clinical input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Prediction service error: {0}")]
    Api(#[from] ports::ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl HeartwiseError {
    /// Text suitable for showing to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => e.message(),
            Self::Api(e) => e.user_message(),
            other => format!("Error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_delegates() {
        let err = HeartwiseError::from(ports::ApiError::Remote {
            status: 500,
            error: Some("Prediction failed".to_string()),
            details: None,
        });
        assert_eq!(err.user_message(), "Server error: Prediction failed");

        let err = HeartwiseError::Config("bad range".to_string());
        assert_eq!(err.user_message(), "Error: Configuration error: bad range");
    }
}
