//! HTTP API route definitions.

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::error::ErrorBody;
use super::handlers::{
    self, get_location_names, health, metrics_text, predict_home_price, ready, AppState,
    LocationsResponse, PredictRequest, PriceResponse,
};

/// OpenAPI document for the public endpoints.
#[derive(OpenApi)]
#[openapi(
    info(title = "Home Price API", description = "Residential price estimates from a trained regressor"),
    paths(handlers::get_location_names, handlers::predict_home_price),
    components(schemas(LocationsResponse, PredictRequest, PriceResponse, ErrorBody))
)]
pub struct ApiDoc;

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Prediction endpoints
        .route("/get_location_names", get(get_location_names))
        .route("/predict_home_price", post(predict_home_price))
        // Health endpoints
        .route("/health", get(health))
        .route("/ready", get(ready))
        // Observability
        .route("/metrics", get(metrics_text))
        .route("/api-docs/openapi.json", get(openapi))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
