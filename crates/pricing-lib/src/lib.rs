//! Property price prediction engine
//!
//! This crate provides:
//! - Feature validation and normalization
//! - A heuristic pricing model with per-factor breakdowns
//! - Learned-model inference through tract, with automatic fallback
//! - Batch prediction and market trend reporting
//! - Health checks and observability

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod schemas;

pub use error::PredictError;
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{PricingMetrics, StructuredLogger};
