//! HTTP API handlers.

use std::fmt;
use std::time::Instant;

use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use utoipa::ToSchema;

use super::error::{ApiError, ErrorBody};
use crate::error::PredictError;
use crate::metrics;
use crate::predict::{PredictionService, PriceQuery};

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Prediction service over the loaded artifacts.
    pub service: PredictionService,
    /// Prometheus handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(service: PredictionService) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Check if artifacts are loaded.
    pub fn is_ready(&self) -> bool {
        self.service.store().is_loaded()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.service)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

/// A JSON number, or a string holding one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    /// JSON number.
    Number(serde_json::Number),
    /// Numeric string such as `"1200"`.
    Text(String),
}

/// Body of `POST /predict_home_price`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PredictRequest {
    /// Built-up area in square feet.
    #[schema(value_type = f64, example = 1000.0)]
    pub total_sqft: Option<Numeric>,
    /// Location name or column key.
    #[schema(value_type = String, example = "Whitefield")]
    pub location: Option<String>,
    /// Bathroom count.
    #[schema(value_type = u64, example = 2)]
    pub bath: Option<Numeric>,
    /// Bedroom count.
    #[schema(value_type = u64, example = 2)]
    pub bhk: Option<Numeric>,
}

impl TryFrom<PredictRequest> for PriceQuery {
    type Error = PredictError;

    fn try_from(req: PredictRequest) -> Result<Self, Self::Error> {
        let total_sqft = coerce_real("total_sqft", req.total_sqft)?;
        let location = req.location.ok_or_else(|| missing("location"))?;
        let bath = coerce_count("bath", req.bath)?;
        let bhk = coerce_count("bhk", req.bhk)?;

        Ok(PriceQuery {
            location,
            total_sqft,
            bath,
            bhk,
        })
    }
}

fn missing(field: &'static str) -> PredictError {
    PredictError::invalid(field, "field is missing")
}

fn coerce_real(field: &'static str, value: Option<Numeric>) -> Result<f64, PredictError> {
    let parsed = match value.ok_or_else(|| missing(field))? {
        Numeric::Number(n) => n.as_f64(),
        Numeric::Text(s) => s.trim().parse::<f64>().ok(),
    };

    match parsed {
        Some(v) if !v.is_finite() => Err(PredictError::invalid(field, "must be a finite number")),
        Some(v) if v < 0.0 => Err(PredictError::invalid(field, "must not be negative")),
        Some(v) => Ok(v),
        None => Err(PredictError::invalid(field, "must be a number")),
    }
}

fn coerce_count(field: &'static str, value: Option<Numeric>) -> Result<u64, PredictError> {
    let not_count = || PredictError::invalid(field, "must be a non-negative integer");

    match value.ok_or_else(|| missing(field))? {
        Numeric::Number(n) => {
            if let Some(v) = n.as_u64() {
                return Ok(v);
            }
            match n.as_f64() {
                Some(v) if v >= 0.0 && v.fract() == 0.0 && v < u64::MAX as f64 => Ok(v as u64),
                _ => Err(not_count()),
            }
        }
        Numeric::Text(s) => s.trim().parse::<u64>().map_err(|_| not_count()),
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status: "ok".
    pub status: &'static str,
}

/// Readiness check response.
#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    /// Whether artifacts are loaded.
    pub ready: bool,
    /// Number of known locations.
    pub locations: Option<usize>,
    /// RFC 3339 time of the last successful load.
    pub loaded_at: Option<String>,
}

/// Response of `GET /get_location_names`.
#[derive(Debug, Serialize, ToSchema)]
pub struct LocationsResponse {
    /// Location column names in schema order.
    pub locations: Vec<String>,
}

/// Response of `POST /predict_home_price`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PriceResponse {
    /// Estimate rounded to two decimals.
    pub estimated_price: f64,
}

/// Health check handler - always returns 200.
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

/// Readiness check handler - returns 200 if artifacts are loaded, 503 otherwise.
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    let response = match state.service.store().snapshot() {
        Ok(artifacts) => ReadyResponse {
            ready: true,
            locations: Some(artifacts.schema().locations().len()),
            loaded_at: artifacts.loaded_at().format(&Rfc3339).ok(),
        },
        Err(_) => ReadyResponse {
            ready: false,
            locations: None,
            loaded_at: None,
        },
    };

    if response.ready {
        (StatusCode::OK, Json(response))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(response))
    }
}

/// List the location keys the model knows.
#[utoipa::path(
    get,
    path = "/get_location_names",
    responses(
        (status = 200, description = "Known locations", body = LocationsResponse),
        (status = 503, description = "Artifacts not loaded", body = ErrorBody)
    )
)]
pub async fn get_location_names(
    State(state): State<AppState>,
) -> Result<Json<LocationsResponse>, ApiError> {
    let start = Instant::now();
    let locations = state.service.list_locations()?;
    metrics::record_http_latency(start, "/get_location_names");
    Ok(Json(LocationsResponse { locations }))
}

/// Estimate a home price.
///
/// The body is parsed as JSON whatever the declared content type.
#[utoipa::path(
    post,
    path = "/predict_home_price",
    request_body = PredictRequest,
    responses(
        (status = 200, description = "Estimated price", body = PriceResponse),
        (status = 400, description = "Missing or malformed field", body = ErrorBody),
        (status = 503, description = "Artifacts not loaded", body = ErrorBody)
    )
)]
pub async fn predict_home_price(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PriceResponse>, ApiError> {
    let start = Instant::now();
    let request: PredictRequest = serde_json::from_slice(&body)?;
    let query = PriceQuery::try_from(request)?;
    let estimated_price = state.service.estimate_price(&query)?;
    metrics::record_http_latency(start, "/predict_home_price");
    Ok(Json(PriceResponse { estimated_price }))
}

/// Prometheus scrape endpoint.
pub async fn metrics_text(State(state): State<AppState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, String::new()),
    }
}
