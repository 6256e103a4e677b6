//! HTTP handlers for the Agri Advisory Platform

pub mod auth;
pub mod chatbot;
pub mod health;
pub mod market;
pub mod soil_health;
pub mod weather;

pub use auth::*;
pub use chatbot::*;
pub use health::*;
pub use market::*;
pub use soil_health::*;
pub use weather::*;
