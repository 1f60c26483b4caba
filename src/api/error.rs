//! Mapping of service errors onto HTTP responses.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::error::PredictError;
use crate::metrics;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human readable message.
    pub error: String,
}

/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body is not a JSON object of the expected shape.
    #[error("malformed request body: {0}")]
    MalformedBody(#[from] serde_json::Error),

    /// Service-level failure.
    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Predict(PredictError::InvalidInput { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Predict(PredictError::NotLoaded) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Predict(PredictError::NonFiniteOutput(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            ApiError::MalformedBody(_) => "malformed_body",
            ApiError::Predict(PredictError::InvalidInput { .. }) => "invalid_input",
            ApiError::Predict(PredictError::NotLoaded) => "not_loaded",
            ApiError::Predict(PredictError::NonFiniteOutput(_)) => "non_finite_output",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(error = %self, "Request rejected");
        }
        metrics::inc_rejected_requests(self.reason());

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
