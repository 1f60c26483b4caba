//! HTTP API module for prediction, health, and metrics endpoints.

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ApiError;
pub use handlers::AppState;
pub use routes::{create_router, ApiDoc};
