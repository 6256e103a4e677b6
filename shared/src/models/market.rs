//! Market price models
//!
//! `MarketForecast` is declared but not produced by any handler; the
//! market-price endpoint proxies live trade data instead. The shape is
//! preserved pending clarified requirements.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Commodity price projection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketForecast {
    pub id: Uuid,
    pub commodity: String,
    pub market: String,
    pub generated_at: DateTime<Utc>,
    pub horizon_days: u32,
    /// Ordered sequence of forecast points
    pub points: Vec<ForecastPoint>,
    pub model_version: String,
}

/// A single price prediction with its interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_price: Decimal,
    pub lower_bound: Decimal,
    pub upper_bound: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_point_interval_serializes() {
        let point = ForecastPoint {
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            predicted_price: Decimal::from_str_exact("2450.50").unwrap(),
            lower_bound: Decimal::from_str_exact("2300.00").unwrap(),
            upper_bound: Decimal::from_str_exact("2600.00").unwrap(),
        };
        let json = serde_json::to_value(&point).unwrap();
        assert_eq!(json["predicted_price"], "2450.50");
    }
}
