//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

pub mod analytics;
mod history;
mod prediction;
pub mod report;
mod worker;

pub use analytics::{DashboardSummary, TimeRange};
pub use history::{HistoryEvent, HistoryStore, SubscriptionId};
pub use prediction::PredictionService;
pub use worker::{PredictionProgress, PredictionWorker, PredictionWorkerHandle};
