//! Authentication handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::services::auth::{AuthResponse, RegisterInput};
use crate::services::{idp, AuthService, IdpService};
use crate::AppState;
use shared::models::UserProfile;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct DeviceTokenRequest {
    pub device_token: String,
}

#[derive(Deserialize)]
pub struct ExternalCallbackQuery {
    pub code: String,
    pub state: Option<String>,
}

/// Register a local account
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterInput>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.register(body).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Login with email and password
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.login(&body.email, &body.password).await?;
    Ok(Json(response))
}

/// Redirect to the external identity provider's login page
pub async fn external_login_redirect(
    State(state): State<AppState>,
) -> Result<Redirect, AppError> {
    let idp = IdpService::new(&state.config.idp);
    let login_state = idp::issue_login_state(&state.config.jwt.secret)?;
    Ok(Redirect::temporary(&idp.authorization_url(&login_state)))
}

/// Handle the identity provider callback: check the state parameter issued
/// at redirect time, resolve the session's claims, look up or create the
/// user, and issue a platform token
pub async fn external_login_callback(
    State(state): State<AppState>,
    Query(query): Query<ExternalCallbackQuery>,
) -> Result<Json<AuthResponse>, AppError> {
    let login_state = query
        .state
        .as_deref()
        .ok_or_else(|| AppError::Unauthorized("Missing login state".to_string()))?;
    idp::verify_login_state(&state.config.jwt.secret, login_state)?;

    let idp = IdpService::new(&state.config.idp);
    let identity = idp.resolve_identity(&query.code).await?;

    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let response = auth_service.external_login(identity).await?;
    Ok(Json(response))
}

/// Return the authenticated user's profile
pub async fn profile(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    let profile = auth_service.profile(current_user.0.user_id).await?;
    Ok(Json(profile))
}

/// Store or replace the authenticated user's FCM device token
pub async fn register_device_token(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<DeviceTokenRequest>,
) -> Result<StatusCode, AppError> {
    let auth_service = AuthService::new(state.db.clone(), &state.config);
    auth_service
        .register_device_token(current_user.0.user_id, &body.device_token)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
