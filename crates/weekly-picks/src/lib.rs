//! Weekly match predictions: outcome resolution, entry scoring, and weighted prize draws.

pub mod config;
pub mod error;
pub mod predictions;
pub mod telemetry;
pub mod week;
