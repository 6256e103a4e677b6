//! Weather-risk alert models
//!
//! The `Alert` record is declared in the model layer but not yet written by
//! any handler; the delivery pipeline composes messages directly. The shape
//! is preserved pending clarified requirements.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Severity;

/// A weather-risk notification record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub field_id: String,
    pub alert_type: AlertType,
    pub severity: Severity,
    /// Probability of the risk materializing, in [0,1]
    pub probability: f64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub recommended_action: String,
    pub model_version: String,
    pub created_at: DateTime<Utc>,
}

/// Categories of weather risk
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    HighTemperature,
    HeavyRainfall,
    LowSoilMoisture,
    Frost,
    Wind,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::HighTemperature => "high_temperature",
            AlertType::HeavyRainfall => "heavy_rainfall",
            AlertType::LowSoilMoisture => "low_soil_moisture",
            AlertType::Frost => "frost",
            AlertType::Wind => "wind",
        }
    }
}
