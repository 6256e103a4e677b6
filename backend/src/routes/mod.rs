//! Route definitions for the Agri Advisory Platform

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (mixed public/protected)
        .nest("/auth", auth_routes(state.clone()))
        // Soil health routes
        .nest("/soilHealth", soil_health_routes(state))
        // Weather alerting (public)
        .route("/weather/send-alert", post(handlers::send_alert))
        // Market price proxy (public)
        .route(
            "/marketPrice/enam/trade-data",
            post(handlers::enam_trade_data),
        )
        // Chatbot routes (public)
        .nest("/chatBot", chatbot_routes())
}

/// Authentication routes
fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        // External identity provider flow (public)
        .route("/external", get(handlers::external_login_redirect))
        .route("/external/callback", get(handlers::external_login_callback))
        // Protected profile routes
        .merge(protected_auth_routes(state))
}

/// Protected auth routes (profile and device registration)
fn protected_auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/profile", get(handlers::profile))
        .route("/device-token", post(handlers::register_device_token))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Soil health routes
fn soil_health_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Sample generation requires an authenticated farmer
        .route(
            "/getSoilInfo",
            post(handlers::get_soil_info)
                .route_layer(middleware::from_fn_with_state(state, auth_middleware)),
        )
        .route(
            "/recommendFertilizerGuidelines",
            post(handlers::recommend_fertilizer_guidelines),
        )
}

/// Chatbot routes
fn chatbot_routes() -> Router<AppState> {
    Router::new()
        .route("/bot", post(handlers::bot))
        .route("/text-to-speech", post(handlers::text_to_speech))
        .route("/generateResult", post(handlers::generate_result))
}
