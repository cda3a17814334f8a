//! Request and response bodies of the prediction HTTP API

use crate::models::{BatchItem, BatchOutcome, ModelUsed, Prediction, PredictionResult, PropertyFeatures, CURRENCY};
use crate::predictor::{MarketTrends, MarketTrendsReport, ModelStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SINGLE_DISCLAIMER: &str = "This is an estimated price based on general market trends. \
Actual prices may vary based on specific location and market conditions.";

pub const BATCH_DISCLAIMER: &str = "These are estimated prices based on general market trends. \
Actual prices may vary based on specific location and market conditions.";

pub const TRENDS_MESSAGE: &str = "Market trends based on current pricing model";

fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub features: PropertyFeatures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub success: bool,
    pub prediction: PredictionResult,
    pub input_features: PropertyFeatures,
    pub model_used: ModelUsed,
    pub currency: String,
    pub timestamp: String,
    pub disclaimer: String,
}

impl PredictionResponse {
    pub fn new(input_features: PropertyFeatures, prediction: Prediction) -> Self {
        Self {
            success: true,
            prediction: prediction.result,
            input_features,
            model_used: prediction.model_used,
            currency: CURRENCY.to_string(),
            timestamp: iso_timestamp(Utc::now()),
            disclaimer: SINGLE_DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPredictionRequest {
    pub properties: Vec<PropertyFeatures>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchPredictionResponse {
    pub success: bool,
    pub model_used: ModelUsed,
    pub predictions: Vec<BatchItem>,
    pub currency: String,
    pub timestamp: String,
    pub disclaimer: String,
}

impl From<BatchOutcome> for BatchPredictionResponse {
    fn from(outcome: BatchOutcome) -> Self {
        Self {
            success: true,
            model_used: outcome.model_used,
            predictions: outcome.items,
            currency: CURRENCY.to_string(),
            timestamp: iso_timestamp(Utc::now()),
            disclaimer: BATCH_DISCLAIMER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrendsResponse {
    pub success: bool,
    pub trends: MarketTrends,
    pub last_updated: String,
    pub message: String,
}

impl From<MarketTrendsReport> for MarketTrendsResponse {
    fn from(report: MarketTrendsReport) -> Self {
        Self {
            success: true,
            trends: report.trends,
            last_updated: iso_timestamp(report.last_updated),
            message: TRENDS_MESSAGE.to_string(),
        }
    }
}

/// Predictor health as reported to API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorHealth {
    pub status: String,
    pub ml_model_loaded: bool,
    pub model_path: Option<String>,
    pub message: String,
}

impl From<&ModelStatus> for PredictorHealth {
    fn from(status: &ModelStatus) -> Self {
        let (health, message) = if status.loaded {
            ("healthy", "ML model loaded")
        } else {
            ("degraded", "Using fallback heuristic model")
        };
        Self {
            status: health.to_string(),
            ml_model_loaded: status.loaded,
            model_path: status.model_path.clone(),
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadResponse {
    pub success: bool,
    pub ml_model_loaded: bool,
    pub model_version: Option<String>,
    pub message: String,
}

/// Body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<BTreeMap<String, String>>,
}

/// Accepted feature fields and their constraints, sent back with missing-field errors
pub const FIELD_REQUIREMENTS: &[(&str, &str)] = &[
    ("area", "number (square feet, > 0)"),
    ("bedrooms", "number (>= 0)"),
    ("bathrooms", "number (>= 0)"),
    ("floors", "number (>= 1, default: 1)"),
    ("yearBuilt", "number (year) OR age: number (years)"),
    ("location", "string (optional: Urban, Suburban, Rural)"),
    ("condition", "string (optional: Excellent, Good, Fair, Poor)"),
    ("garage", "boolean (optional)"),
    ("amenities", "array of strings (optional)"),
];

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                message: message.into(),
                missing: None,
                required: None,
            },
        }
    }

    /// Missing-field error listing what is absent and what is accepted
    pub fn missing_fields(fields: &[String]) -> Self {
        Self {
            success: false,
            error: ErrorDetail {
                message: "Required fields missing".to_string(),
                missing: Some(fields.to_vec()),
                required: Some(
                    FIELD_REQUIREMENTS
                        .iter()
                        .map(|(field, rule)| (field.to_string(), rule.to_string()))
                        .collect(),
                ),
            },
        }
    }
}
