//! Domain layer: Core business types and logic.
//!
//! Pure Rust types with no I/O. All wire-facing types are serializable.

mod clinical;
mod form;
mod prediction;

pub use clinical::{ClinicalInput, FieldSpec, FEATURE_COUNT, FIELD_NAMES, FIELD_SPECS};
pub use form::{FormField, PredictionForm, ValidationError};
pub use prediction::{
    PredictionRecord, PredictionResponse, PredictionResult, RecordId, RiskLevel,
};
