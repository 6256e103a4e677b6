//! HTTP handlers for soil health and fertilizer endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::soil::{GenerateSampleInput, RecommendFertilizerInput};
use crate::services::SoilService;
use crate::AppState;
use shared::models::{FertilizerRecommendation, SoilSample};

/// Generate and persist a soil sample for the requesting user's location
pub async fn get_soil_info(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<GenerateSampleInput>,
) -> AppResult<(StatusCode, Json<SoilSample>)> {
    let service = SoilService::new(state.db.clone(), state.genai.clone(), &state.config);
    let sample = service
        .generate_sample(current_user.0.user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(sample)))
}

/// Generate fertilizer guidance for a persisted sample and target crop
pub async fn recommend_fertilizer_guidelines(
    State(state): State<AppState>,
    Json(input): Json<RecommendFertilizerInput>,
) -> AppResult<(StatusCode, Json<FertilizerRecommendation>)> {
    let service = SoilService::new(state.db.clone(), state.genai.clone(), &state.config);
    let recommendation = service.recommend_fertilizer(input).await?;
    Ok((StatusCode::CREATED, Json(recommendation)))
}
