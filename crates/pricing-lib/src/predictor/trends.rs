//! Market trends derived from the heuristic coefficient table

use super::heuristic::{AMENITY_VALUES, CONDITION_ADJUSTMENTS, LOCATION_PREMIUMS, PRICE_PER_SQ_FT};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Pricing factors the engine currently applies
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketTrends {
    pub average_price_per_sq_ft: f64,
    pub location_premiums: BTreeMap<String, i64>,
    pub condition_adjustments: BTreeMap<String, i64>,
    pub amenity_values: BTreeMap<String, i64>,
}

/// Trends plus the moment they were read
#[derive(Debug, Clone, PartialEq)]
pub struct MarketTrendsReport {
    pub trends: MarketTrends,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarketTrendsReporter;

impl MarketTrendsReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn trends(&self) -> MarketTrendsReport {
        MarketTrendsReport {
            trends: MarketTrends {
                average_price_per_sq_ft: PRICE_PER_SQ_FT,
                location_premiums: to_map(LOCATION_PREMIUMS),
                condition_adjustments: to_map(CONDITION_ADJUSTMENTS),
                amenity_values: to_map(AMENITY_VALUES),
            },
            last_updated: Utc::now(),
        }
    }
}

fn to_map(table: &[(&str, i64)]) -> BTreeMap<String, i64> {
    table
        .iter()
        .map(|(name, value)| (name.to_string(), *value))
        .collect()
}
