//! Fertilizer recommendation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::NutrientLevels;

/// Guidance derived from a soil sample for a target crop
///
/// One sample may have many recommendations, one per crop queried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FertilizerRecommendation {
    pub id: Uuid,
    /// Soft reference to the originating soil sample
    pub sample_id: Uuid,
    pub crop: String,
    /// Recommended dosages in kg/ha
    pub dosage: NutrientLevels,
    /// Fertilizer product types, e.g. "Urea", "DAP", "MOP"
    pub products: Vec<String>,
    /// Ordered application-timing instructions
    pub application_schedule: Vec<String>,
    pub rationale: String,
    pub source: RecommendationSource,
    pub model_version: String,
    /// Confidence in [0,1]; clamped on ingest
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

/// Provenance of a recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Rule,
    Ml,
}

impl RecommendationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationSource::Rule => "rule",
            RecommendationSource::Ml => "ml",
        }
    }
}
