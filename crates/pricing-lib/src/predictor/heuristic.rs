//! Heuristic pricing model
//!
//! Closed-form additive formula over a fixed coefficient table. Always
//! available and needs no artifact. Every contribution is reported in the
//! breakdown so the estimate can be explained factor by factor.

use crate::error::PredictError;
use crate::models::{Breakdown, FeatureRecord, PredictionResult, PriceRange};

/// Constant offset every estimate starts from
pub const BASE_PRICE: i64 = 50_000;

pub const PRICE_PER_SQ_FT: f64 = 100.0;
pub const PRICE_PER_BEDROOM: f64 = 15_000.0;
pub const PRICE_PER_BATHROOM: f64 = 10_000.0;

/// Each year of age lowers the price
pub const PRICE_PER_YEAR_OF_AGE: f64 = -2_000.0;

/// Floors beyond the first are worth this fraction of a bedroom
pub const EXTRA_FLOOR_BEDROOM_FACTOR: f64 = 0.5;

pub const LOCATION_PREMIUMS: &[(&str, i64)] =
    &[("urban", 50_000), ("suburban", 30_000), ("rural", 10_000)];

pub const CONDITION_ADJUSTMENTS: &[(&str, i64)] = &[
    ("excellent", 40_000),
    ("good", 20_000),
    ("fair", 0),
    ("poor", -20_000),
];

pub const AMENITY_VALUES: &[(&str, i64)] = &[
    ("garage", 15_000),
    ("garden", 10_000),
    ("pool", 25_000),
    ("basement", 20_000),
    ("balcony", 8_000),
];

/// Market variance applied around heuristic estimates
pub const HEURISTIC_RANGE_FRACTION: f64 = 0.10;

pub const HEURISTIC_CONFIDENCE: f64 = 0.85;

/// Breakdown keys
pub mod contributions {
    pub const AREA: &str = "areaContribution";
    pub const BEDROOMS: &str = "bedroomContribution";
    pub const BATHROOMS: &str = "bathroomContribution";
    pub const FLOORS: &str = "floorsContribution";
    pub const AGE: &str = "ageAdjustment";
    pub const LOCATION: &str = "locationPremium";
    pub const CONDITION: &str = "conditionAdjustment";
    pub const GARAGE: &str = "garageContribution";
    pub const OTHER_AMENITIES: &str = "otherAmenitiesContribution";

    pub const ALL: [&str; 9] = [
        AREA, BEDROOMS, BATHROOMS, FLOORS, AGE, LOCATION, CONDITION, GARAGE, OTHER_AMENITIES,
    ];
}

const GARAGE_AMENITY: &str = "garage";

fn table_lookup(table: &[(&str, i64)], key: &str) -> Option<i64> {
    table
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, value)| *value)
}

/// Premium for a location; unknown or absent locations earn nothing
pub fn location_premium(location: Option<&str>) -> i64 {
    location
        .and_then(|l| table_lookup(LOCATION_PREMIUMS, &l.to_lowercase()))
        .unwrap_or(0)
}

/// Adjustment for a condition; unknown or absent conditions adjust nothing
pub fn condition_adjustment(condition: Option<&str>) -> i64 {
    condition
        .and_then(|c| table_lookup(CONDITION_ADJUSTMENTS, &c.to_lowercase()))
        .unwrap_or(0)
}

pub fn amenity_value(amenity: &str) -> i64 {
    table_lookup(AMENITY_VALUES, &amenity.to_lowercase()).unwrap_or(0)
}

/// Heuristic estimate with its per-factor attribution
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicEstimate {
    pub price: i64,
    pub breakdown: Breakdown,
}

impl HeuristicEstimate {
    /// ±10% around the estimate, lower bound floored at zero
    pub fn price_range(&self) -> PriceRange {
        let price = self.price as f64;
        PriceRange {
            min: (price * (1.0 - HEURISTIC_RANGE_FRACTION)).round().max(0.0) as i64,
            max: (price * (1.0 + HEURISTIC_RANGE_FRACTION)).round() as i64,
        }
    }

    pub fn into_result(self) -> PredictionResult {
        PredictionResult {
            estimated_price: self.price,
            price_range: self.price_range(),
            confidence: HEURISTIC_CONFIDENCE,
            breakdown: self.breakdown,
        }
    }
}

/// Deterministic additive pricing model
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicPricingModel;

impl HeuristicPricingModel {
    pub fn new() -> Self {
        Self
    }

    /// Estimate a price from a normalized record
    ///
    /// Contributions are rounded individually and the estimate is their sum
    /// plus `BASE_PRICE`, so the breakdown always reconciles exactly. Fails
    /// only when a contribution cannot be represented in currency units.
    pub fn estimate(&self, record: &FeatureRecord) -> Result<HeuristicEstimate, PredictError> {
        let area = record.area * PRICE_PER_SQ_FT;
        let bedrooms = f64::from(record.bedrooms) * PRICE_PER_BEDROOM;
        let bathrooms = f64::from(record.bathrooms) * PRICE_PER_BATHROOM;
        let floors = (f64::from(record.floors) - 1.0)
            * EXTRA_FLOOR_BEDROOM_FACTOR
            * PRICE_PER_BEDROOM;
        let age = f64::from(record.age_years) * PRICE_PER_YEAR_OF_AGE;

        let garage = if record.has_garage() {
            amenity_value(GARAGE_AMENITY)
        } else {
            0
        };

        // "garage" is priced once, above, whichever way it was supplied
        let other_amenities: i64 = record
            .amenities
            .iter()
            .filter(|amenity| !amenity.eq_ignore_ascii_case(GARAGE_AMENITY))
            .map(|amenity| amenity_value(amenity))
            .sum();

        let mut breakdown = Breakdown::new();
        breakdown.insert(contributions::AREA.to_string(), to_units(contributions::AREA, area)?);
        breakdown.insert(
            contributions::BEDROOMS.to_string(),
            to_units(contributions::BEDROOMS, bedrooms)?,
        );
        breakdown.insert(
            contributions::BATHROOMS.to_string(),
            to_units(contributions::BATHROOMS, bathrooms)?,
        );
        breakdown.insert(contributions::FLOORS.to_string(), to_units(contributions::FLOORS, floors)?);
        breakdown.insert(contributions::AGE.to_string(), to_units(contributions::AGE, age)?);
        breakdown.insert(
            contributions::LOCATION.to_string(),
            location_premium(record.location.as_deref()),
        );
        breakdown.insert(
            contributions::CONDITION.to_string(),
            condition_adjustment(record.condition.as_deref()),
        );
        breakdown.insert(contributions::GARAGE.to_string(), garage);
        breakdown.insert(contributions::OTHER_AMENITIES.to_string(), other_amenities);

        let price = breakdown
            .values()
            .try_fold(BASE_PRICE, |total, value| total.checked_add(*value))
            .ok_or_else(|| PredictError::Computation("estimated price overflows".to_string()))?;

        Ok(HeuristicEstimate { price, breakdown })
    }
}

/// Round to whole currency units, rejecting values that do not fit
fn to_units(name: &str, value: f64) -> Result<i64, PredictError> {
    // 2^63 is exactly representable; anything at or beyond it saturates
    if !value.is_finite() || value.abs() >= 9.223_372_036_854_776e18 {
        return Err(PredictError::Computation(format!("{} is out of range", name)));
    }
    Ok(value.round() as i64)
}
