//! Core data models for the price prediction engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Currency every price is reported in
pub const CURRENCY: &str = "INR";

/// Garage flag as supplied by callers: either a JSON boolean or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GarageFlag {
    Bool(bool),
    Text(String),
}

impl GarageFlag {
    /// Boolean true, or one of "yes" / "true" / "1" in any case
    pub fn is_truthy(&self) -> bool {
        match self {
            GarageFlag::Bool(value) => *value,
            GarageFlag::Text(text) => {
                matches!(text.to_lowercase().as_str(), "yes" | "true" | "1")
            }
        }
    }
}

impl From<bool> for GarageFlag {
    fn from(value: bool) -> Self {
        GarageFlag::Bool(value)
    }
}

impl From<&str> for GarageFlag {
    fn from(value: &str) -> Self {
        GarageFlag::Text(value.to_string())
    }
}

/// Property features exactly as received from a caller
///
/// Every field is optional at this level so that all missing required
/// fields can be reported in one validation error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFeatures {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floors: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub garage: Option<GarageFlag>,
    #[serde(default)]
    pub amenities: Vec<String>,
}

/// Normalized, validated view of a property
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub area: f64,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub floors: u32,
    /// Age in years; negative for properties scheduled to complete in the future
    pub age_years: i32,
    pub year_built: Option<i32>,
    pub location: Option<String>,
    pub condition: Option<String>,
    pub garage: Option<GarageFlag>,
    pub amenities: Vec<String>,
}

impl FeatureRecord {
    /// Garage flag is truthy, or "garage" appears among the amenities
    pub fn has_garage(&self) -> bool {
        self.garage.as_ref().map(GarageFlag::is_truthy).unwrap_or(false)
            || self
                .amenities
                .iter()
                .any(|amenity| amenity.eq_ignore_ascii_case("garage"))
    }
}

/// Which estimator produced a prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelUsed {
    MlModel,
    Heuristic,
}

impl ModelUsed {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelUsed::MlModel => "ml_model",
            ModelUsed::Heuristic => "heuristic",
        }
    }
}

impl std::fmt::Display for ModelUsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: i64,
    pub max: i64,
}

/// Named contribution -> signed delta, in currency units
pub type Breakdown = BTreeMap<String, i64>;

/// Price estimate with its range, confidence and attribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub estimated_price: i64,
    pub price_range: PriceRange,
    pub confidence: f64,
    #[serde(default)]
    pub breakdown: Breakdown,
}

/// A prediction together with the estimator that served it
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub result: PredictionResult,
    pub model_used: ModelUsed,
}

/// One entry of a batch prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    /// 1-based position in the submitted list
    pub property_id: usize,
    pub features: PropertyFeatures,
    pub prediction: PredictionResult,
}

/// Result of a whole batch; every item was served by `model_used`
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    pub items: Vec<BatchItem>,
    pub model_used: ModelUsed,
}
