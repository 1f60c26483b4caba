//! Price estimation on top of the loaded artifacts.

use std::sync::Arc;

use tracing::{debug, instrument};

use super::features::{FeatureVector, PriceQuery};
use crate::artifacts::ArtifactStore;
use crate::error::PredictError;
use crate::metrics;

/// Answers location and price queries from an [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct PredictionService {
    store: Arc<ArtifactStore>,
}

impl PredictionService {
    /// Create a service reading from `store`.
    pub fn new(store: Arc<ArtifactStore>) -> Self {
        Self { store }
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<ArtifactStore> {
        &self.store
    }

    /// Known location columns, verbatim.
    pub fn list_locations(&self) -> Result<Vec<String>, PredictError> {
        self.store.location_names()
    }

    /// Encode `query` against the current schema without predicting.
    pub fn encode(&self, query: &PriceQuery) -> Result<FeatureVector, PredictError> {
        validate(query)?;
        let artifacts = self.store.snapshot()?;
        Ok(FeatureVector::encode(artifacts.schema(), query))
    }

    /// Estimate a price, rounded to two decimals.
    #[instrument(skip(self), fields(location = %query.location))]
    pub fn estimate_price(&self, query: &PriceQuery) -> Result<f64, PredictError> {
        validate(query)?;
        let artifacts = self.store.snapshot()?;

        let _timer = metrics::timer_prediction();
        let features = FeatureVector::encode(artifacts.schema(), query);
        if features.is_baseline() {
            debug!("Unknown location, using baseline");
            metrics::inc_unknown_locations();
        }

        let raw = artifacts.model().predict(features.as_slice());
        if !raw.is_finite() {
            return Err(PredictError::NonFiniteOutput(raw));
        }

        let price = round2(raw);
        if !price.is_finite() {
            return Err(PredictError::NonFiniteOutput(price));
        }
        metrics::inc_predictions();
        debug!(raw, price, "Estimated price");
        Ok(price)
    }
}

fn validate(query: &PriceQuery) -> Result<(), PredictError> {
    if !query.total_sqft.is_finite() {
        return Err(PredictError::invalid("total_sqft", "must be a finite number"));
    }
    if query.total_sqft < 0.0 {
        return Err(PredictError::invalid("total_sqft", "must not be negative"));
    }
    Ok(())
}

/// Round to two decimal places, ties to even.
///
/// At or above 1e15 an `f64` has no hundredths left to round, and scaling
/// by 100 could overflow.
pub fn round2(value: f64) -> f64 {
    if value.abs() >= 1e15 {
        return value;
    }
    (value * 100.0).round_ties_even() / 100.0
}
