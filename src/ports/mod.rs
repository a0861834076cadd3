//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary between
//! the application and the remote prediction service.

mod prediction_api;

pub use prediction_api::{ApiError, ErrorBody, HealthStatus, PredictionApi, REMOTE_ERROR_FALLBACK};
