//! Weather alerting service
//!
//! Fetches a forecast observation for a coordinate, persists it as a
//! weather reading, evaluates threshold rules, and pushes a composed alert
//! to the selected recipients. Individual delivery failures are logged and
//! do not abort the remaining deliveries or the HTTP response.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::AlertConfig;
use crate::error::{AppError, AppResult};
use crate::external::fcm::{FcmClient, PushNotification};
use crate::external::weather::{ForecastObservation, WeatherClient};
use shared::models::{AlertType, WeatherReading};
use shared::types::GeoPoint;
use shared::validation::validate_location;

/// Weather alerting service
#[derive(Clone)]
pub struct WeatherAlertService {
    db: PgPool,
    weather: WeatherClient,
    fcm: FcmClient,
    thresholds: AlertThresholds,
    scope: DeliveryScope,
}

/// Threshold rules evaluated against each new reading
#[derive(Debug, Clone, Copy)]
pub struct AlertThresholds {
    pub high_temp_c: f64,
    pub heavy_rain_mm: f64,
    pub low_soil_moisture_pct: f64,
}

/// Who receives alert pushes
///
/// `Broadcast` reproduces the legacy behavior of notifying every user with
/// a device token regardless of field or geography; see DESIGN.md for why
/// this is a flagged open question rather than a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryScope {
    Broadcast,
    FieldSubscribers,
}

impl DeliveryScope {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "broadcast" => Ok(DeliveryScope::Broadcast),
            "field_subscribers" => Ok(DeliveryScope::FieldSubscribers),
            other => Err(format!("unknown delivery scope: {}", other)),
        }
    }
}

/// A threshold rule that fired for a reading
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TriggeredRule {
    pub alert_type: AlertType,
    pub detail: String,
}

/// A candidate alert recipient
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Recipient {
    pub id: Uuid,
    pub device_token: Option<String>,
    pub subscribed_fields: Vec<String>,
}

/// Input for the send-alert operation
#[derive(Debug, Deserialize)]
pub struct SendAlertInput {
    pub latitude: f64,
    pub longitude: f64,
}

/// Outcome of the send-alert operation
#[derive(Debug, Serialize)]
pub struct AlertOutcome {
    pub reading: WeatherReading,
    pub triggered: Vec<TriggeredRule>,
    pub recipients_notified: usize,
    pub deliveries_failed: usize,
}

impl WeatherAlertService {
    /// Create a new WeatherAlertService instance
    pub fn new(
        db: PgPool,
        weather: WeatherClient,
        fcm: FcmClient,
        config: &AlertConfig,
    ) -> AppResult<Self> {
        let scope = DeliveryScope::parse(&config.delivery_scope)
            .map_err(AppError::Configuration)?;

        Ok(Self {
            db,
            weather,
            fcm,
            thresholds: AlertThresholds {
                high_temp_c: config.high_temp_c,
                heavy_rain_mm: config.heavy_rain_mm,
                low_soil_moisture_pct: config.low_soil_moisture_pct,
            },
            scope,
        })
    }

    /// Fetch, persist, and evaluate a weather reading; push alerts if any
    /// rule trips
    pub async fn send_alert(&self, input: SendAlertInput) -> AppResult<AlertOutcome> {
        let location = GeoPoint::new(input.longitude, input.latitude);
        validate_location(&location).map_err(|msg| AppError::Validation {
            field: "location".to_string(),
            message: msg.to_string(),
        })?;

        let observation = self.weather.fetch_observation(location).await?;
        let reading = self.store_reading(location, &observation).await?;

        let triggered = evaluate_thresholds(&reading, &self.thresholds);
        if triggered.is_empty() {
            return Ok(AlertOutcome {
                reading,
                triggered,
                recipients_notified: 0,
                deliveries_failed: 0,
            });
        }

        let notification = compose_notification(&triggered);
        let recipients = self.fetch_recipients().await?;
        let tokens = eligible_tokens(&recipients, self.scope);

        let mut notified = 0;
        let mut failed = 0;
        // Sequential, not batched; a failed device never aborts the rest
        for token in &tokens {
            match self.fcm.send_to_device(token, &notification).await {
                Ok(()) => notified += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(error = %e, "Alert delivery failed for a device");
                }
            }
        }

        tracing::info!(
            triggered = triggered.len(),
            notified,
            failed,
            "Weather alert evaluated"
        );

        Ok(AlertOutcome {
            reading,
            triggered,
            recipients_notified: notified,
            deliveries_failed: failed,
        })
    }

    /// Persist a new reading (append-only log)
    async fn store_reading(
        &self,
        location: GeoPoint,
        obs: &ForecastObservation,
    ) -> AppResult<WeatherReading> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO weather_readings
                (source, temp_current_c, temp_min_c, temp_max_c, rain_mm, humidity_pct,
                 wind_speed_mps, solar_irradiance, soil_moisture_pct,
                 longitude, latitude, observed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            "#,
        )
        .bind("openweathermap")
        .bind(obs.temperature.current_c)
        .bind(obs.temperature.min_c)
        .bind(obs.temperature.max_c)
        .bind(obs.rain_mm)
        .bind(obs.humidity_pct)
        .bind(obs.wind_speed_mps)
        .bind(obs.solar_irradiance)
        .bind(obs.soil_moisture_pct)
        .bind(location.longitude)
        .bind(location.latitude)
        .bind(obs.observed_at)
        .fetch_one(&self.db)
        .await?;

        Ok(WeatherReading {
            id,
            source: "openweathermap".to_string(),
            temperature: obs.temperature,
            rain_mm: obs.rain_mm,
            humidity_pct: obs.humidity_pct,
            wind_speed_mps: obs.wind_speed_mps,
            solar_irradiance: obs.solar_irradiance,
            soil_moisture_pct: obs.soil_moisture_pct,
            location,
            observed_at: obs.observed_at,
            created_at: chrono::Utc::now(),
        })
    }

    async fn fetch_recipients(&self) -> AppResult<Vec<Recipient>> {
        let recipients = sqlx::query_as::<_, Recipient>(
            "SELECT id, device_token, subscribed_fields FROM users WHERE device_token IS NOT NULL",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(recipients)
    }
}

/// Evaluate the three independent threshold rules against a reading
pub fn evaluate_thresholds(
    reading: &WeatherReading,
    thresholds: &AlertThresholds,
) -> Vec<TriggeredRule> {
    let mut triggered = Vec::new();

    if reading.temperature.current_c > thresholds.high_temp_c {
        triggered.push(TriggeredRule {
            alert_type: AlertType::HighTemperature,
            detail: format!(
                "High temperature: {:.1}°C (threshold {:.0}°C)",
                reading.temperature.current_c, thresholds.high_temp_c
            ),
        });
    }

    if reading.rain_mm > thresholds.heavy_rain_mm {
        triggered.push(TriggeredRule {
            alert_type: AlertType::HeavyRainfall,
            detail: format!(
                "Heavy rainfall: {:.1}mm (threshold {:.0}mm)",
                reading.rain_mm, thresholds.heavy_rain_mm
            ),
        });
    }

    if reading.soil_moisture_pct < thresholds.low_soil_moisture_pct {
        triggered.push(TriggeredRule {
            alert_type: AlertType::LowSoilMoisture,
            detail: format!(
                "Low soil moisture: {:.1}% (threshold {:.0}%)",
                reading.soil_moisture_pct, thresholds.low_soil_moisture_pct
            ),
        });
    }

    triggered
}

/// Compose the multi-line push notification for the tripped rules
pub fn compose_notification(triggered: &[TriggeredRule]) -> PushNotification {
    let body = triggered
        .iter()
        .map(|rule| rule.detail.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    PushNotification {
        title: "Weather alert for your fields".to_string(),
        body,
    }
}

/// Select the device tokens to deliver to under the given scope
pub fn eligible_tokens(recipients: &[Recipient], scope: DeliveryScope) -> Vec<String> {
    recipients
        .iter()
        .filter(|r| match scope {
            DeliveryScope::Broadcast => true,
            DeliveryScope::FieldSubscribers => !r.subscribed_fields.is_empty(),
        })
        .filter_map(|r| r.device_token.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::models::TemperatureReading;

    fn thresholds() -> AlertThresholds {
        AlertThresholds {
            high_temp_c: 40.0,
            heavy_rain_mm: 50.0,
            low_soil_moisture_pct: 20.0,
        }
    }

    fn reading(temp_c: f64, rain_mm: f64, soil_moisture_pct: f64) -> WeatherReading {
        WeatherReading {
            id: Uuid::new_v4(),
            source: "test".to_string(),
            temperature: TemperatureReading {
                current_c: temp_c,
                min_c: temp_c - 5.0,
                max_c: temp_c + 2.0,
            },
            rain_mm,
            humidity_pct: 50.0,
            wind_speed_mps: 2.0,
            solar_irradiance: 0.0,
            soil_moisture_pct,
            location: GeoPoint::new(77.59, 12.97),
            observed_at: Utc::now(),
            created_at: Utc::now(),
        }
    }

    fn recipient(token: Option<&str>, fields: &[&str]) -> Recipient {
        Recipient {
            id: Uuid::new_v4(),
            device_token: token.map(str::to_string),
            subscribed_fields: fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_high_temperature_trips() {
        let triggered = evaluate_thresholds(&reading(41.0, 0.0, 50.0), &thresholds());
        assert_eq!(triggered.len(), 1);
        assert_eq!(triggered[0].alert_type, AlertType::HighTemperature);
        assert!(triggered[0].detail.contains("High temperature"));
    }

    #[test]
    fn test_no_rule_trips() {
        let triggered = evaluate_thresholds(&reading(25.0, 5.0, 40.0), &thresholds());
        assert!(triggered.is_empty());
    }

    #[test]
    fn test_all_rules_trip() {
        let triggered = evaluate_thresholds(&reading(45.0, 80.0, 5.0), &thresholds());
        let types: Vec<_> = triggered.iter().map(|t| t.alert_type).collect();
        assert_eq!(
            types,
            vec![
                AlertType::HighTemperature,
                AlertType::HeavyRainfall,
                AlertType::LowSoilMoisture
            ]
        );
    }

    #[test]
    fn test_thresholds_are_exclusive() {
        // Exactly at the threshold does not trip
        let triggered = evaluate_thresholds(&reading(40.0, 50.0, 20.0), &thresholds());
        assert!(triggered.is_empty());
    }

    #[test]
    fn test_notification_is_multi_line() {
        let triggered = evaluate_thresholds(&reading(45.0, 80.0, 5.0), &thresholds());
        let notification = compose_notification(&triggered);
        assert_eq!(notification.body.lines().count(), 3);
        assert!(notification.body.contains("High temperature"));
    }

    #[test]
    fn test_broadcast_targets_every_token_bearer() {
        let recipients = vec![
            recipient(Some("token-a"), &[]),
            recipient(None, &["field-1"]),
            recipient(Some("token-b"), &["field-2"]),
        ];
        let tokens = eligible_tokens(&recipients, DeliveryScope::Broadcast);
        assert_eq!(tokens, vec!["token-a", "token-b"]);
    }

    #[test]
    fn test_field_subscribers_scope_filters_unsubscribed() {
        let recipients = vec![
            recipient(Some("token-a"), &[]),
            recipient(Some("token-b"), &["field-2"]),
        ];
        let tokens = eligible_tokens(&recipients, DeliveryScope::FieldSubscribers);
        assert_eq!(tokens, vec!["token-b"]);
    }

    #[test]
    fn test_scope_parsing() {
        assert_eq!(
            DeliveryScope::parse("broadcast").unwrap(),
            DeliveryScope::Broadcast
        );
        assert_eq!(
            DeliveryScope::parse("field_subscribers").unwrap(),
            DeliveryScope::FieldSubscribers
        );
        assert!(DeliveryScope::parse("everyone").is_err());
    }
}
