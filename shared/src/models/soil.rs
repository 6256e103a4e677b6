//! Soil sample models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::types::GeoPoint;

/// A per-field soil test snapshot
///
/// In this system the values are AI-generated for the user's approximate
/// location rather than lab-measured. Immutable once persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilSample {
    pub id: Uuid,
    /// Owning farmer
    pub farmer_id: Uuid,
    pub field_id: String,
    pub location: GeoPoint,
    pub sample_date: NaiveDate,
    /// Sample depth in centimetres
    pub depth_cm: f64,
    pub nutrients: NutrientLevels,
    pub ph: f64,
    /// Organic carbon, percent
    pub organic_carbon_pct: f64,
    /// Cation-exchange capacity, cmol(+)/kg
    pub cec: f64,
    /// Texture classification, e.g. "sandy loam"
    pub texture: String,
    /// Open-ended micronutrient levels in ppm (Zn, Fe, Mn, B, ...)
    pub micronutrients: BTreeMap<String, f64>,
    /// Optional reference to a lab report document
    pub lab_report_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Macro-nutrient levels in kg/ha
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NutrientLevels {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
}

impl NutrientLevels {
    pub fn non_negative(&self) -> bool {
        self.nitrogen >= 0.0 && self.phosphorus >= 0.0 && self.potassium >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nutrient_levels_non_negative() {
        let levels = NutrientLevels {
            nitrogen: 280.0,
            phosphorus: 23.0,
            potassium: 190.0,
        };
        assert!(levels.non_negative());

        let bad = NutrientLevels {
            nitrogen: -1.0,
            ..levels
        };
        assert!(!bad.non_negative());
    }
}
