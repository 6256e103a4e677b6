//! Weather API client
//!
//! Fetches the forecast for a coordinate and reduces it to a single
//! observation: the first forecast entry, with temperatures converted from
//! Kelvin to Celsius and unreported fields (solar irradiance, soil
//! moisture) defaulted to zero.

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use shared::models::{kelvin_to_celsius, TemperatureReading};
use shared::types::GeoPoint;

/// Weather API client
#[derive(Clone)]
pub struct WeatherClient {
    client: Client,
    api_key: String,
    base_url: String,
}

/// A single observation extracted from the upstream forecast
#[derive(Debug, Clone)]
pub struct ForecastObservation {
    pub observed_at: DateTime<Utc>,
    pub temperature: TemperatureReading,
    pub rain_mm: f64,
    pub humidity_pct: f64,
    pub wind_speed_mps: f64,
    pub solar_irradiance: f64,
    pub soil_moisture_pct: f64,
}

/// Upstream forecast response (fields in Kelvin; no units parameter is sent)
#[derive(Debug, Deserialize)]
struct UpstreamForecastResponse {
    list: Vec<UpstreamForecastItem>,
}

#[derive(Debug, Deserialize)]
struct UpstreamForecastItem {
    dt: i64,
    main: UpstreamMain,
    wind: UpstreamWind,
    rain: Option<UpstreamRain>,
    /// Not part of the standard forecast payload; defaulted when absent
    solar_irradiance: Option<f64>,
    soil_moisture: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UpstreamMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct UpstreamWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct UpstreamRain {
    #[serde(rename = "3h")]
    three_hour: Option<f64>,
}

impl WeatherClient {
    /// Create a new WeatherClient
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    /// Fetch the forecast for a coordinate and extract the first entry
    pub async fn fetch_observation(&self, location: GeoPoint) -> AppResult<ForecastObservation> {
        let url = format!(
            "{}/forecast?lat={}&lon={}&appid={}",
            self.base_url, location.latitude, location.longitude, self.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::WeatherService(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::WeatherService(format!(
                "API returned {}: {}",
                status, body
            )));
        }

        let data: UpstreamForecastResponse = response
            .json()
            .await
            .map_err(|e| AppError::WeatherService(format!("Failed to parse response: {}", e)))?;

        let first = data
            .list
            .into_iter()
            .next()
            .ok_or_else(|| AppError::WeatherService("Forecast contained no entries".to_string()))?;

        Ok(convert_item(first))
    }
}

fn convert_item(item: UpstreamForecastItem) -> ForecastObservation {
    ForecastObservation {
        observed_at: DateTime::from_timestamp(item.dt, 0).unwrap_or_else(Utc::now),
        temperature: TemperatureReading {
            current_c: kelvin_to_celsius(item.main.temp),
            min_c: kelvin_to_celsius(item.main.temp_min),
            max_c: kelvin_to_celsius(item.main.temp_max),
        },
        rain_mm: item.rain.and_then(|r| r.three_hour).unwrap_or(0.0),
        humidity_pct: item.main.humidity,
        wind_speed_mps: item.wind.speed,
        solar_irradiance: item.solar_irradiance.unwrap_or(0.0),
        soil_moisture_pct: item.soil_moisture.unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_item(json: serde_json::Value) -> UpstreamForecastItem {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_kelvin_conversion_and_defaults() {
        let item = sample_item(serde_json::json!({
            "dt": 1717200000,
            "main": {"temp": 314.15, "temp_min": 300.15, "temp_max": 315.15, "humidity": 55.0},
            "wind": {"speed": 3.2},
            "rain": {"3h": 1.4}
        }));

        let obs = convert_item(item);
        assert!((obs.temperature.current_c - 41.0).abs() < 1e-9);
        assert!((obs.temperature.min_c - 27.0).abs() < 1e-9);
        assert!((obs.rain_mm - 1.4).abs() < f64::EPSILON);
        assert_eq!(obs.solar_irradiance, 0.0);
        assert_eq!(obs.soil_moisture_pct, 0.0);
    }

    #[test]
    fn test_missing_rain_defaults_to_zero() {
        let item = sample_item(serde_json::json!({
            "dt": 1717200000,
            "main": {"temp": 298.15, "temp_min": 295.15, "temp_max": 299.15, "humidity": 70.0},
            "wind": {"speed": 1.0}
        }));

        let obs = convert_item(item);
        assert_eq!(obs.rain_mm, 0.0);
    }
}
