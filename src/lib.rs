//! Residential home price estimation service.
//!
//! A trained regressor and its column schema are loaded once at startup. Each
//! request is turned into a feature vector laid out by the schema:
//!
//! ```text
//! columns: total_sqft  bath  bhk  location_1st phase jp nagar  location_whitefield
//! request: 1000        2     2    0                            1
//! ```
//!
//! The first three columns carry the numeric inputs, the rest are one-hot
//! location indicators. An unknown location leaves the whole location block at
//! zero and the model answers with its baseline.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`artifacts`]: Schema and model loading
//! - [`predict`]: Feature encoding and price estimation
//! - [`api`]: HTTP API
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod artifacts;
pub mod config;
pub mod error;
pub mod metrics;
pub mod predict;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
