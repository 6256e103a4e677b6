//! Weather reading models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::GeoPoint;

/// A point-in-time weather observation persisted for a coordinate
///
/// Append-only log; readings are never updated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    pub id: Uuid,
    /// Upstream source tag, e.g. "openweathermap"
    pub source: String,
    pub temperature: TemperatureReading,
    pub rain_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    /// Solar irradiance in W/m²; 0 when the source does not report it
    pub solar_irradiance: f64,
    /// Soil moisture percentage; 0 when the source does not report it
    pub soil_moisture_pct: f64,
    pub location: GeoPoint,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Temperature values in Celsius
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TemperatureReading {
    pub current_c: f64,
    pub min_c: f64,
    pub max_c: f64,
}

/// Convert a Kelvin value as reported by the forecast API to Celsius
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - 273.15
}
