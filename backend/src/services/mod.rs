//! Business logic services for the Agri Advisory Platform

pub mod auth;
pub mod chatbot;
pub mod idp;
pub mod market;
pub mod soil;
pub mod weather_alert;

pub use auth::AuthService;
pub use chatbot::ChatbotService;
pub use idp::IdpService;
pub use market::MarketService;
pub use soil::SoilService;
pub use weather_alert::WeatherAlertService;
