//! HTTP handlers for the chatbot endpoints

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::services::chatbot::{
    AskInput, AskResponse, InterpretInput, InterpretResponse, SpeechInput, SpeechResponse,
};
use crate::services::ChatbotService;
use crate::AppState;

/// Answer a free-text farming question
pub async fn bot(
    State(state): State<AppState>,
    Json(input): Json<AskInput>,
) -> AppResult<Json<AskResponse>> {
    let service = ChatbotService::new(state.genai.clone());
    let response = service.ask(input).await?;
    Ok(Json(response))
}

/// Synthesize speech for a text, returned as a base64 WAV data URI
pub async fn text_to_speech(
    State(state): State<AppState>,
    Json(input): Json<SpeechInput>,
) -> AppResult<Json<SpeechResponse>> {
    let service = ChatbotService::new(state.genai.clone());
    let response = service.text_to_speech(input).await?;
    Ok(Json(response))
}

/// Interpret a disease-detection result for the farmer
pub async fn generate_result(
    State(state): State<AppState>,
    Json(input): Json<InterpretInput>,
) -> AppResult<Json<InterpretResponse>> {
    let service = ChatbotService::new(state.genai.clone());
    let response = service.interpret_detection(input).await?;
    Ok(Json(response))
}
