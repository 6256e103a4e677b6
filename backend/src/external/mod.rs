//! External service adapters

pub mod enam;
pub mod fcm;
pub mod genai;
pub mod weather;
