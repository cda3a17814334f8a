//! Feature normalization
//!
//! Turns caller-supplied `PropertyFeatures` into a validated `FeatureRecord`.
//! Required fields are never defaulted: every missing one is reported in a
//! single `PredictError::MissingFields`.

use crate::error::PredictError;
use crate::models::{FeatureRecord, PropertyFeatures};
use chrono::{Datelike, Utc};

/// Earliest accepted construction year
pub const MIN_YEAR_BUILT: i32 = 1800;

/// How far into the future a construction year may lie
pub const MAX_YEARS_AHEAD: i32 = 5;

/// Default number of floors when the caller omits it
pub const DEFAULT_FLOORS: u32 = 1;

/// Current calendar year (UTC)
pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Validates raw features against a fixed reference year
#[derive(Debug, Clone, Copy)]
pub struct FeatureNormalizer {
    current_year: i32,
}

impl FeatureNormalizer {
    pub fn new() -> Self {
        Self::with_year(current_year())
    }

    /// Pin the reference year; used for deterministic age derivation
    pub fn with_year(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn normalize(&self, features: &PropertyFeatures) -> Result<FeatureRecord, PredictError> {
        let mut missing = Vec::new();
        if features.area.is_none() {
            missing.push("area");
        }
        if features.bedrooms.is_none() {
            missing.push("bedrooms");
        }
        if features.bathrooms.is_none() {
            missing.push("bathrooms");
        }
        if features.year_built.is_none() && features.age.is_none() {
            missing.push("yearBuilt or age");
        }
        if !missing.is_empty() {
            return Err(PredictError::MissingFields {
                fields: missing.into_iter().map(str::to_string).collect(),
            });
        }

        let area = features.area.unwrap_or_default();
        if !area.is_finite() || area <= 0.0 {
            return Err(PredictError::invalid("area", "must be a number greater than 0"));
        }

        let bedrooms = non_negative("bedrooms", features.bedrooms.unwrap_or_default())?;
        let bathrooms = non_negative("bathrooms", features.bathrooms.unwrap_or_default())?;

        let floors = match features.floors {
            None => DEFAULT_FLOORS,
            Some(f) if f >= 1 => u32::try_from(f)
                .map_err(|_| PredictError::invalid("floors", "value too large"))?,
            Some(_) => return Err(PredictError::invalid("floors", "must be at least 1")),
        };

        let age_years = self.resolve_age(features.year_built, features.age)?;

        Ok(FeatureRecord {
            area,
            bedrooms,
            bathrooms,
            floors,
            age_years,
            year_built: features.year_built,
            location: features.location.clone(),
            condition: features.condition.clone(),
            garage: features.garage.clone(),
            amenities: features.amenities.clone(),
        })
    }

    /// yearBuilt wins over an explicit age when both are present
    fn resolve_age(&self, year_built: Option<i32>, age: Option<i32>) -> Result<i32, PredictError> {
        if let Some(year) = year_built {
            let latest = self.current_year + MAX_YEARS_AHEAD;
            if !(MIN_YEAR_BUILT..=latest).contains(&year) {
                return Err(PredictError::invalid(
                    "yearBuilt",
                    format!("must be between {} and {}", MIN_YEAR_BUILT, latest),
                ));
            }
            return Ok(self.current_year - year);
        }
        match age {
            Some(age) if age >= 0 => Ok(age),
            Some(_) => Err(PredictError::invalid("age", "must be 0 or greater")),
            None => Err(PredictError::MissingFields {
                fields: vec!["yearBuilt or age".to_string()],
            }),
        }
    }
}

impl Default for FeatureNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn non_negative(field: &str, value: i64) -> Result<u32, PredictError> {
    if value < 0 {
        return Err(PredictError::invalid(field, "must be 0 or greater"));
    }
    u32::try_from(value).map_err(|_| PredictError::invalid(field, "value too large"))
}

impl FeatureRecord {
    /// Normalize raw features against the given reference year
    pub fn from_features(
        features: &PropertyFeatures,
        current_year: i32,
    ) -> Result<FeatureRecord, PredictError> {
        FeatureNormalizer::with_year(current_year).normalize(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GarageFlag;

    fn base_features() -> PropertyFeatures {
        PropertyFeatures {
            area: Some(2000.0),
            bedrooms: Some(3),
            bathrooms: Some(2),
            floors: Some(2),
            year_built: Some(2010),
            location: Some("Urban".to_string()),
            condition: Some("Good".to_string()),
            garage: Some(GarageFlag::Bool(true)),
            ..Default::default()
        }
    }

    #[test]
    fn test_age_derived_from_year_built() {
        let record = FeatureRecord::from_features(&base_features(), 2025).unwrap();
        assert_eq!(record.age_years, 15);
        assert_eq!(record.year_built, Some(2010));
        assert_eq!(record.floors, 2);
    }

    #[test]
    fn test_explicit_age_used_without_year_built() {
        let features = PropertyFeatures {
            year_built: None,
            age: Some(7),
            ..base_features()
        };
        let record = FeatureRecord::from_features(&features, 2025).unwrap();
        assert_eq!(record.age_years, 7);
        assert_eq!(record.year_built, None);
    }

    #[test]
    fn test_year_built_preferred_over_age() {
        let features = PropertyFeatures {
            age: Some(40),
            ..base_features()
        };
        let record = FeatureRecord::from_features(&features, 2025).unwrap();
        assert_eq!(record.age_years, 15);
    }

    #[test]
    fn test_floors_default_to_one() {
        let features = PropertyFeatures {
            floors: None,
            ..base_features()
        };
        let record = FeatureRecord::from_features(&features, 2025).unwrap();
        assert_eq!(record.floors, DEFAULT_FLOORS);
    }

    #[test]
    fn test_all_missing_fields_reported_together() {
        let err = FeatureRecord::from_features(&PropertyFeatures::default(), 2025).unwrap_err();
        assert_eq!(
            err,
            PredictError::MissingFields {
                fields: vec![
                    "area".to_string(),
                    "bedrooms".to_string(),
                    "bathrooms".to_string(),
                    "yearBuilt or age".to_string(),
                ]
            }
        );
    }

    #[test]
    fn test_zero_bedrooms_is_not_missing() {
        let features = PropertyFeatures {
            bedrooms: Some(0),
            bathrooms: Some(0),
            ..base_features()
        };
        assert!(FeatureRecord::from_features(&features, 2025).is_ok());
    }

    #[test]
    fn test_non_positive_area_rejected() {
        for area in [0.0, -10.0, f64::NAN] {
            let features = PropertyFeatures {
                area: Some(area),
                ..base_features()
            };
            let err = FeatureRecord::from_features(&features, 2025).unwrap_err();
            assert!(matches!(err, PredictError::InvalidField { ref field, .. } if field == "area"));
        }
    }

    #[test]
    fn test_year_built_bounds() {
        let normalizer = FeatureNormalizer::with_year(2025);
        for (year, ok) in [(1799, false), (1800, true), (2030, true), (2031, false)] {
            let features = PropertyFeatures {
                year_built: Some(year),
                ..base_features()
            };
            assert_eq!(normalizer.normalize(&features).is_ok(), ok, "year {}", year);
        }
    }

    #[test]
    fn test_future_year_gives_negative_age() {
        let features = PropertyFeatures {
            year_built: Some(2027),
            ..base_features()
        };
        let record = FeatureRecord::from_features(&features, 2025).unwrap();
        assert_eq!(record.age_years, -2);
    }

    #[test]
    fn test_negative_counts_rejected() {
        let features = PropertyFeatures {
            bathrooms: Some(-1),
            ..base_features()
        };
        assert!(FeatureRecord::from_features(&features, 2025).is_err());

        let features = PropertyFeatures {
            floors: Some(0),
            ..base_features()
        };
        assert!(FeatureRecord::from_features(&features, 2025).is_err());

        let features = PropertyFeatures {
            year_built: None,
            age: Some(-3),
            ..base_features()
        };
        assert!(FeatureRecord::from_features(&features, 2025).is_err());
    }

    #[test]
    fn test_unknown_categories_pass_through() {
        let features = PropertyFeatures {
            location: Some("Mars".to_string()),
            condition: Some("Pristine".to_string()),
            ..base_features()
        };
        let record = FeatureRecord::from_features(&features, 2025).unwrap();
        assert_eq!(record.location.as_deref(), Some("Mars"));
        assert_eq!(record.condition.as_deref(), Some("Pristine"));
    }
}
