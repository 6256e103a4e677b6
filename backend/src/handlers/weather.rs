//! HTTP handlers for weather alerting endpoints

use axum::{extract::State, Json};

use crate::error::{AppError, AppResult};
use crate::services::weather_alert::{AlertOutcome, SendAlertInput};
use crate::services::WeatherAlertService;
use crate::AppState;

/// Fetch and persist a weather reading for a coordinate and push alerts for
/// any tripped threshold rules
pub async fn send_alert(
    State(state): State<AppState>,
    Json(input): Json<SendAlertInput>,
) -> AppResult<Json<AlertOutcome>> {
    if state.config.weather.api_key.is_empty() {
        return Err(AppError::Configuration(
            "Weather API key not configured".to_string(),
        ));
    }

    let service = WeatherAlertService::new(
        state.db.clone(),
        state.weather.clone(),
        state.fcm.clone(),
        &state.config.alerts,
    )?;
    let outcome = service.send_alert(input).await?;
    Ok(Json(outcome))
}
