//! Database models for the Agri Advisory Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;
