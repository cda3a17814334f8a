//! Batch prediction
//!
//! A batch is served by exactly one estimator. The learned model gets one
//! pass over every record; if that pass fails anywhere, its partial output
//! is discarded and the whole batch is priced by the heuristic model.

use super::heuristic::HeuristicPricingModel;
use super::inference::{LearnedModelAdapter, UnavailableReason};
use super::orchestrator::{learned_result, PredictionOrchestrator};
use crate::error::PredictError;
use crate::models::{BatchItem, BatchOutcome, FeatureRecord, ModelUsed, PredictionResult, PropertyFeatures};
use tracing::debug;

/// Largest batch accepted at the service boundary
pub const MAX_BATCH_SIZE: usize = 100;

/// Learned pass over all records at once; any failure fails the whole pass
pub fn vectorized_learned(
    adapter: &LearnedModelAdapter,
    records: &[FeatureRecord],
) -> Result<Vec<PredictionResult>, UnavailableReason> {
    let values = adapter.try_estimate_batch(records)?;
    Ok(values.into_iter().map(learned_result).collect())
}

/// Price every record independently with the heuristic model
pub fn per_item_heuristic(
    heuristic: &HeuristicPricingModel,
    records: &[FeatureRecord],
) -> Result<Vec<PredictionResult>, PredictError> {
    records
        .iter()
        .map(|record| heuristic.estimate(record).map(|e| e.into_result()))
        .collect()
}

/// Pick the estimator for a whole batch
pub fn price_batch(
    adapter: &LearnedModelAdapter,
    heuristic: &HeuristicPricingModel,
    records: &[FeatureRecord],
) -> Result<(Vec<PredictionResult>, ModelUsed), PredictError> {
    match vectorized_learned(adapter, records) {
        Ok(results) => Ok((results, ModelUsed::MlModel)),
        Err(reason) => {
            debug!(reason = %reason, records = records.len(), "Learned batch pass unavailable, re-running with heuristic model");
            Ok((per_item_heuristic(heuristic, records)?, ModelUsed::Heuristic))
        }
    }
}

/// Runs batches against one adapter snapshot
pub struct BatchRunner<'a> {
    orchestrator: &'a PredictionOrchestrator,
}

impl<'a> BatchRunner<'a> {
    pub fn new(orchestrator: &'a PredictionOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Predict for normalized records; `features` is echoed back per item
    pub fn predict_batch(
        &self,
        features: &[PropertyFeatures],
        records: &[FeatureRecord],
    ) -> Result<BatchOutcome, PredictError> {
        if records.is_empty() {
            return Err(PredictError::EmptyBatch);
        }
        if features.len() != records.len() {
            return Err(PredictError::Computation(format!(
                "{} feature sets for {} records",
                features.len(),
                records.len()
            )));
        }

        let adapter = self.orchestrator.store().current();
        let (results, model_used) = price_batch(&adapter, self.orchestrator.heuristic(), records)?;

        let items = features
            .iter()
            .zip(results)
            .enumerate()
            .map(|(idx, (features, prediction))| BatchItem {
                property_id: idx + 1,
                features: features.clone(),
                prediction,
            })
            .collect();

        Ok(BatchOutcome { items, model_used })
    }
}
