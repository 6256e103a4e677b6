//! Tests for market price models
//!
//! Prices are exact decimals; float drift in mandi prices is not
//! acceptable, so serialization must round-trip without loss.

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{ForecastPoint, MarketForecast};
use std::str::FromStr;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn point(date: NaiveDate, price: &str) -> ForecastPoint {
    ForecastPoint {
        date,
        predicted_price: dec(price),
        lower_bound: dec(price) - dec("100.00"),
        upper_bound: dec(price) + dec("100.00"),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn decimal_prices_round_trip_exactly() {
        let original = point(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), "2450.50");
        let json = serde_json::to_string(&original).unwrap();
        let parsed: ForecastPoint = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.predicted_price, original.predicted_price);
        assert_eq!(parsed.lower_bound, original.lower_bound);
        assert_eq!(parsed.upper_bound, original.upper_bound);
    }

    #[test]
    fn prices_serialize_as_strings() {
        let p = point(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(), "1825.25");
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["predicted_price"], "1825.25");
    }

    #[test]
    fn forecast_preserves_point_order() {
        let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let forecast = MarketForecast {
            id: Uuid::new_v4(),
            commodity: "Soybean".to_string(),
            market: "Indore".to_string(),
            generated_at: Utc::now(),
            horizon_days: 3,
            points: (0..3)
                .map(|i| point(start + chrono::Duration::days(i), "4200.00"))
                .collect(),
            model_version: "price-v1".to_string(),
        };

        let json = serde_json::to_string(&forecast).unwrap();
        let parsed: MarketForecast = serde_json::from_str(&json).unwrap();

        let dates: Vec<NaiveDate> = parsed.points.iter().map(|p| p.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Decimal survives a JSON round trip for any paise-denominated price
    #[test]
    fn any_price_round_trips(rupees in 0i64..100_000, paise in 0u32..100) {
        let price = Decimal::new(rupees * 100 + paise as i64, 2);
        let json = serde_json::to_string(&price).unwrap();
        let parsed: Decimal = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, price);
    }
}
