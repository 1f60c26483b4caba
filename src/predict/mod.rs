//! Prediction module: feature encoding and price estimation.

pub mod features;
pub mod service;

pub use features::{FeatureVector, PriceQuery};
pub use service::{round2, PredictionService};
