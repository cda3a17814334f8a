//! Learned-model inference using tract
//!
//! Wraps a pre-trained ONNX regression graph. The adapter never fails: any
//! problem (no artifact, shape mismatch, bad output) comes back as
//! `LearnedEstimate::Unavailable` and the caller falls back.

use super::encoder::{CategoricalColumn, CategoricalEncoder};
use super::features::current_year;
use crate::models::FeatureRecord;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tract_onnx::prelude::*;
use tracing::{debug, warn};

/// Number of input features expected by the model
pub const NUM_FEATURES: usize = 8;

/// Column order the artifact was trained on
pub const TRAINING_COLUMNS: [&str; NUM_FEATURES] = [
    "Area",
    "Bedrooms",
    "Bathrooms",
    "Floors",
    "YearBuilt",
    "Location",
    "Condition",
    "Garage",
];

/// Maximum inference latency before warning
const MAX_INFERENCE_MS: u128 = 5;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// One encoded input row in `TRAINING_COLUMNS` order
pub type FeatureRow = [f32; NUM_FEATURES];

/// Predict-only regression artifact
pub trait RegressionModel: Send + Sync {
    /// One output per input row, in order
    fn predict_rows(&self, rows: &[FeatureRow]) -> Result<Vec<f32>>;

    fn version(&self) -> &str;
}

/// ONNX regression graph executed with tract
pub struct OnnxRegressor {
    plan: TractModel,
    version: String,
}

impl OnnxRegressor {
    /// Parse and optimize an ONNX model from bytes
    pub fn from_bytes(model_bytes: &[u8], version: impl Into<String>) -> Result<Self> {
        let plan = tract_onnx::onnx()
            .model_for_read(&mut std::io::Cursor::new(model_bytes))
            .context("Failed to parse ONNX model")?
            .with_input_fact(0, f32::fact([1, NUM_FEATURES]).into())
            .context("Failed to set input shape")?
            .into_optimized()
            .context("Failed to optimize model")?
            .into_runnable()
            .context("Failed to create runnable model")?;
        Ok(Self {
            plan,
            version: version.into(),
        })
    }

    fn run_row(&self, row: &FeatureRow) -> Result<f32> {
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, NUM_FEATURES), row.to_vec())?.into();
        let result = self.plan.run(tvec!(input.into()))?;
        let output = result.first().context("No output from model")?;
        let view = output.to_array_view::<f32>()?;
        let value = view.iter().next().copied().context("Model output is empty")?;
        Ok(value)
    }
}

impl RegressionModel for OnnxRegressor {
    fn predict_rows(&self, rows: &[FeatureRow]) -> Result<Vec<f32>> {
        let start = Instant::now();
        let values = rows
            .iter()
            .map(|row| self.run_row(row))
            .collect::<Result<Vec<_>>>()?;

        let elapsed = start.elapsed();
        if elapsed.as_millis() > MAX_INFERENCE_MS * rows.len().max(1) as u128 {
            warn!(elapsed_ms = elapsed.as_millis(), rows = rows.len(), "Inference exceeded latency target");
        } else {
            debug!(elapsed_us = elapsed.as_micros(), rows = rows.len(), "Inference completed");
        }
        Ok(values)
    }

    fn version(&self) -> &str {
        &self.version
    }
}

/// Why the learned model could not produce an estimate
#[derive(Debug, Clone, PartialEq)]
pub enum UnavailableReason {
    /// No artifact is loaded
    NoModel,
    /// The artifact raised an error while predicting
    Inference(String),
    /// The artifact returned something that is not a usable price
    InvalidOutput(String),
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::NoModel => write!(f, "no learned model loaded"),
            UnavailableReason::Inference(e) => write!(f, "inference failed: {}", e),
            UnavailableReason::InvalidOutput(e) => write!(f, "invalid model output: {}", e),
        }
    }
}

/// Outcome of asking the learned model for a price
#[derive(Debug, Clone, PartialEq)]
pub enum LearnedEstimate {
    Estimate(f64),
    Unavailable(UnavailableReason),
}

/// Training-time column name for a feature name ("yearBuilt" -> "YearBuilt")
pub fn training_column_name(feature: &str) -> String {
    let mut chars = feature.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Optional learned model plus the encoder it was trained with
///
/// Immutable once built; reload builds a new adapter.
pub struct LearnedModelAdapter {
    model: Option<Arc<dyn RegressionModel>>,
    encoder: CategoricalEncoder,
}

impl LearnedModelAdapter {
    /// Adapter without a model; every call reports `Unavailable`
    pub fn without_model() -> Self {
        Self {
            model: None,
            encoder: CategoricalEncoder::empty(),
        }
    }

    pub fn new(model: Arc<dyn RegressionModel>, encoder: CategoricalEncoder) -> Self {
        Self {
            model: Some(model),
            encoder,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn model_version(&self) -> Option<&str> {
        self.model.as_deref().map(|m| m.version())
    }

    pub fn encoder(&self) -> &CategoricalEncoder {
        &self.encoder
    }

    /// Encode a record into one input row
    ///
    /// Values are keyed by training column name and then laid out in
    /// `TRAINING_COLUMNS` order; any column without a value is 0.
    pub fn encode_row(&self, record: &FeatureRecord) -> FeatureRow {
        let year_built = record
            .year_built
            .unwrap_or_else(|| current_year() - record.age_years);
        let garage = if record.has_garage() { "Yes" } else { "No" };

        let mut values: HashMap<String, f32> = HashMap::new();
        values.insert(training_column_name("area"), record.area as f32);
        values.insert(training_column_name("bedrooms"), record.bedrooms as f32);
        values.insert(training_column_name("bathrooms"), record.bathrooms as f32);
        values.insert(training_column_name("floors"), record.floors as f32);
        values.insert(training_column_name("yearBuilt"), year_built as f32);
        values.insert(
            training_column_name("location"),
            self.encode_optional(CategoricalColumn::Location, record.location.as_deref()),
        );
        values.insert(
            training_column_name("condition"),
            self.encode_optional(CategoricalColumn::Condition, record.condition.as_deref()),
        );
        values.insert(
            training_column_name("garage"),
            self.encoder.encode(CategoricalColumn::Garage, garage) as f32,
        );

        TRAINING_COLUMNS.map(|column| values.get(column).copied().unwrap_or(0.0))
    }

    fn encode_optional(&self, column: CategoricalColumn, value: Option<&str>) -> f32 {
        match value {
            Some(v) => self.encoder.encode(column, v) as f32,
            None => self.encoder.default_code(column) as f32,
        }
    }

    /// Single-row estimate
    pub fn try_estimate(&self, record: &FeatureRecord) -> LearnedEstimate {
        match self.try_estimate_batch(std::slice::from_ref(record)) {
            Ok(values) => match values.first() {
                Some(value) => LearnedEstimate::Estimate(*value),
                None => LearnedEstimate::Unavailable(UnavailableReason::InvalidOutput(
                    "no value returned".to_string(),
                )),
            },
            Err(reason) => LearnedEstimate::Unavailable(reason),
        }
    }

    /// One pass over all records; any failure makes the whole pass unavailable
    pub fn try_estimate_batch(&self, records: &[FeatureRecord]) -> Result<Vec<f64>, UnavailableReason> {
        let model = self.model.as_ref().ok_or(UnavailableReason::NoModel)?;
        let rows: Vec<FeatureRow> = records.iter().map(|r| self.encode_row(r)).collect();

        let outputs = model
            .predict_rows(&rows)
            .map_err(|e| UnavailableReason::Inference(format!("{:#}", e)))?;

        if outputs.len() != rows.len() {
            return Err(UnavailableReason::InvalidOutput(format!(
                "model returned {} values for {} rows",
                outputs.len(),
                rows.len()
            )));
        }

        outputs
            .into_iter()
            .map(|value| {
                if value.is_finite() {
                    Ok(f64::from(value))
                } else {
                    Err(UnavailableReason::InvalidOutput(format!("non-finite value {}", value)))
                }
            })
            .collect()
    }
}
