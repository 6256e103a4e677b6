//! Configuration management for the Agri Advisory Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with AGRI_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// External identity provider (OIDC) configuration
    pub idp: IdpConfig,

    /// Generative AI provider configuration
    pub genai: GenAiConfig,

    /// Weather API configuration
    pub weather: WeatherConfig,

    /// Push notification (FCM) configuration
    pub fcm: FcmConfig,

    /// Government market data (eNAM) configuration
    pub market: MarketConfig,

    /// Weather alert thresholds and delivery scope
    pub alerts: AlertConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Token expiration in seconds (default 7 days)
    pub token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdpConfig {
    /// OIDC issuer base URL, e.g. https://tenant.auth0.com
    pub issuer_url: String,

    /// OAuth client ID
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Redirect URI registered with the provider
    pub redirect_uri: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenAiConfig {
    /// Generative AI API base URL
    pub api_endpoint: String,

    /// API key
    pub api_key: String,

    /// Text generation model name
    pub text_model: String,

    /// Text-to-speech model name
    pub tts_model: String,

    /// Maximum repair attempts when model output fails schema validation
    pub max_repair_attempts: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeatherConfig {
    /// Weather API endpoint
    pub api_endpoint: String,

    /// Weather API key
    pub api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FcmConfig {
    /// FCM send endpoint
    pub api_endpoint: String,

    /// FCM server key
    pub server_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MarketConfig {
    /// eNAM trade-data endpoint
    pub api_endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AlertConfig {
    /// Temperature threshold in Celsius above which an alert fires
    pub high_temp_c: f64,

    /// Rainfall threshold in mm above which an alert fires
    pub heavy_rain_mm: f64,

    /// Soil moisture percentage below which an alert fires
    pub low_soil_moisture_pct: f64,

    /// Who receives alert pushes: "broadcast" sends to every user with a
    /// device token (the legacy behavior, likely over-broad);
    /// "field_subscribers" restricts to users subscribed to at least one
    /// field. See DESIGN.md for the open stakeholder question.
    pub delivery_scope: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            std::env::var("AGRI_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            // 7 days
            .set_default("jwt.token_expiry", 604800)?
            .set_default(
                "genai.api_endpoint",
                "https://generativelanguage.googleapis.com/v1beta",
            )?
            .set_default("genai.text_model", "gemini-2.0-flash")?
            .set_default("genai.tts_model", "gemini-2.5-flash-preview-tts")?
            .set_default("genai.max_repair_attempts", 2)?
            .set_default(
                "weather.api_endpoint",
                "https://api.openweathermap.org/data/2.5",
            )?
            .set_default("fcm.api_endpoint", "https://fcm.googleapis.com/fcm/send")?
            .set_default(
                "market.api_endpoint",
                "https://enam.gov.in/web/Ajax_ctrl/trade_data_list",
            )?
            .set_default("alerts.high_temp_c", 40.0)?
            .set_default("alerts.heavy_rain_mm", 50.0)?
            .set_default("alerts.low_soil_moisture_pct", 20.0)?
            .set_default("alerts.delivery_scope", "broadcast")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (AGRI_ prefix)
            .add_source(
                Environment::with_prefix("AGRI")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}
