//! Domain models for the Agri Advisory Platform

mod alert;
mod fertilizer;
mod market;
mod soil;
mod user;
mod weather;

pub use alert::*;
pub use fertilizer::*;
pub use market::*;
pub use soil::*;
pub use user::*;
pub use weather::*;
