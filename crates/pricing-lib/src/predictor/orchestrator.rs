//! Estimator selection
//!
//! Tries the learned model first and falls back to the heuristic model
//! whenever the learned model is unavailable. The fallback is a normal
//! operating mode: it is visible through `ModelUsed`, never as an error.

use super::features::FeatureNormalizer;
use super::heuristic::HeuristicPricingModel;
use super::inference::{LearnedEstimate, LearnedModelAdapter};
use super::store::ModelStore;
use crate::error::PredictError;
use crate::models::{FeatureRecord, ModelUsed, Prediction, PredictionResult, PriceRange, PropertyFeatures};
use std::sync::Arc;
use tracing::debug;

/// Spread applied around learned-model estimates
pub const LEARNED_RANGE_FRACTION: f64 = 0.05;

pub const LEARNED_CONFIDENCE: f64 = 0.90;

/// Result shape for a learned-model estimate: ±5%, no breakdown
pub fn learned_result(value: f64) -> PredictionResult {
    PredictionResult {
        estimated_price: value.round() as i64,
        price_range: PriceRange {
            min: (value * (1.0 - LEARNED_RANGE_FRACTION)).round() as i64,
            max: (value * (1.0 + LEARNED_RANGE_FRACTION)).round() as i64,
        },
        confidence: LEARNED_CONFIDENCE,
        breakdown: Default::default(),
    }
}

/// Single entry point for price predictions
///
/// Cheap to clone; clones share the same model store.
#[derive(Clone)]
pub struct PredictionOrchestrator {
    store: Arc<ModelStore>,
    heuristic: HeuristicPricingModel,
}

impl PredictionOrchestrator {
    pub fn new(store: Arc<ModelStore>) -> Self {
        Self {
            store,
            heuristic: HeuristicPricingModel::new(),
        }
    }

    /// Orchestrator that only ever uses the heuristic model
    pub fn heuristic_only() -> Self {
        Self::new(Arc::new(ModelStore::empty()))
    }

    pub fn store(&self) -> &Arc<ModelStore> {
        &self.store
    }

    pub fn heuristic(&self) -> &HeuristicPricingModel {
        &self.heuristic
    }

    /// Validate raw features, then predict
    pub fn predict_features(&self, features: &PropertyFeatures) -> Result<Prediction, PredictError> {
        let record = FeatureNormalizer::new().normalize(features)?;
        self.predict(&record)
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction, PredictError> {
        let adapter = self.store.current();
        self.predict_with(&adapter, record)
    }

    /// Predict against a specific adapter snapshot
    pub fn predict_with(
        &self,
        adapter: &LearnedModelAdapter,
        record: &FeatureRecord,
    ) -> Result<Prediction, PredictError> {
        match adapter.try_estimate(record) {
            LearnedEstimate::Estimate(value) => Ok(Prediction {
                result: learned_result(value),
                model_used: ModelUsed::MlModel,
            }),
            LearnedEstimate::Unavailable(reason) => {
                debug!(reason = %reason, "Learned model unavailable, using heuristic model");
                Ok(Prediction {
                    result: self.heuristic.estimate(record)?.into_result(),
                    model_used: ModelUsed::Heuristic,
                })
            }
        }
    }
}
