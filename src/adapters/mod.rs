//! Adapters layer: Concrete implementations of ports.
//!
//! - `http`: reqwest implementation of `PredictionApi`
//! - `sanitize`: redacting writer for log output

pub mod http;
pub mod sanitize;

pub use http::HttpPredictionClient;
