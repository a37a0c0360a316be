//! Workout Music Shared Library
//!
//! This crate contains the domain model, wire types and validation used by
//! the session client and the WASM module.

pub mod errors;
pub mod health_metrics;
pub mod models;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use errors::*;
pub use health_metrics::*;
pub use models::*;
pub use validation::ValidationError;
