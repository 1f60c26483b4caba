//! Integration tests for the home price service.
//!
//! These tests write real artifact files to a scratch directory, load them
//! through the artifact store and drive the HTTP router end to end.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::ServiceExt;

use home_price_api::api::{create_router, AppState};
use home_price_api::artifacts::{ArtifactPaths, ArtifactStore};
use home_price_api::config::Config;
use home_price_api::error::ArtifactError;
use home_price_api::predict::{PredictionService, PriceQuery};

const COLUMNS: &str = r#"{
    "data_columns": [
        "total_sqft", "bath", "bhk",
        "location_1st phase jp nagar", "location_whitefield", "location_hsr layout"
    ]
}"#;

const MODEL: &str = r#"{
    "kind": "tree_ensemble",
    "base_score": 20.0,
    "num_features": 6,
    "trees": [
        {"nodes": [
            {"feature": 0, "threshold": 1500.0, "left": 1, "right": 2},
            {"leaf": 35.5},
            {"leaf": 80.25}
        ]},
        {"nodes": [
            {"feature": 4, "threshold": 0.5, "left": 1, "right": 2},
            {"feature": 5, "threshold": 0.5, "left": 3, "right": 4},
            {"leaf": 12.125},
            {"leaf": 0.0},
            {"leaf": 30.0}
        ]}
    ]
}"#;

/// Scratch directory unique to each test, removed on drop.
struct ScratchDir(PathBuf);

impl ScratchDir {
    fn new() -> Self {
        static COUNTER: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "home_price_api_it_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::SeqCst)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for ScratchDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}

fn write_artifacts(dir: &Path, columns: &str, model: &str) -> Config {
    std::fs::write(dir.join("columns.json"), columns).unwrap();
    std::fs::write(dir.join("home_price_model.json"), model).unwrap();
    Config {
        artifacts_dir: dir.to_path_buf(),
        ..Config::default()
    }
}

/// Artifacts are read eagerly, so the scratch directory can go once loaded.
fn loaded_service() -> PredictionService {
    let dir = ScratchDir::new();
    let config = write_artifacts(dir.path(), COLUMNS, MODEL);
    let store = Arc::new(ArtifactStore::new(ArtifactPaths::from(&config)));
    store.load().unwrap();
    PredictionService::new(store)
}

fn query(location: &str, total_sqft: f64) -> PriceQuery {
    PriceQuery {
        location: location.to_string(),
        total_sqft,
        bath: 2,
        bhk: 2,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[test]
fn loads_artifacts_from_disk() {
    let service = loaded_service();
    assert_eq!(
        service.list_locations().unwrap(),
        vec![
            "location_1st phase jp nagar",
            "location_whitefield",
            "location_hsr layout"
        ]
    );
}

#[test]
fn estimates_follow_the_tree_ensemble() {
    let service = loaded_service();

    // 20 + 35.5 + 12.125
    assert_eq!(
        service.estimate_price(&query("Whitefield", 1000.0)).unwrap(),
        67.63
    );
    // 20 + 80.25 + 30
    assert_eq!(
        service.estimate_price(&query("HSR Layout", 2000.0)).unwrap(),
        130.25
    );
    // baseline: 20 + 35.5 + 0
    assert_eq!(
        service.estimate_price(&query("nonexistent area", 1000.0)).unwrap(),
        55.5
    );
}

#[test]
fn reload_replaces_previous_state() {
    let dir = ScratchDir::new();
    let config = write_artifacts(dir.path(), COLUMNS, MODEL);
    let store = ArtifactStore::new(ArtifactPaths::from(&config));
    store.load().unwrap();

    let smaller = r#"{"data_columns": ["total_sqft", "bath", "bhk", "location_whitefield"]}"#;
    let linear = r#"{"kind": "linear", "intercept": 0.0, "coefficients": [0.1, 0.0, 0.0, 5.0]}"#;
    write_artifacts(dir.path(), smaller, linear);
    store.load().unwrap();

    assert_eq!(store.location_names().unwrap(), vec!["location_whitefield"]);
}

#[test]
fn missing_model_file_is_a_startup_failure() {
    let dir = ScratchDir::new();
    std::fs::write(dir.path().join("columns.json"), COLUMNS).unwrap();
    let config = Config {
        artifacts_dir: dir.path().to_path_buf(),
        ..Config::default()
    };

    let store = ArtifactStore::new(ArtifactPaths::from(&config));
    assert!(matches!(store.load(), Err(ArtifactError::Read { .. })));
}

#[test]
fn malformed_schema_is_a_startup_failure() {
    let dir = ScratchDir::new();
    let config = write_artifacts(dir.path(), r#"{"columns": []}"#, MODEL);
    let store = ArtifactStore::new(ArtifactPaths::from(&config));
    assert!(matches!(
        store.load(),
        Err(ArtifactError::SchemaFormat { .. })
    ));
}

#[test]
fn model_schema_mismatch_is_a_startup_failure() {
    let linear = r#"{"kind": "linear", "intercept": 1.0, "coefficients": [1.0, 2.0, 3.0]}"#;
    let dir = ScratchDir::new();
    let config = write_artifacts(dir.path(), COLUMNS, linear);
    let store = ArtifactStore::new(ArtifactPaths::from(&config));
    assert!(matches!(
        store.load(),
        Err(ArtifactError::FeatureMismatch { model: 3, schema: 6 })
    ));
}

#[test]
fn scratch_dir_is_removed_on_drop() {
    let dir = ScratchDir::new();
    write_artifacts(dir.path(), COLUMNS, MODEL);
    let path = dir.path().to_path_buf();
    assert!(path.join("columns.json").exists());

    drop(dir);
    assert!(!path.exists());
}

#[tokio::test]
async fn listed_locations_round_trip_through_predict() {
    let service = loaded_service();
    let locations = service.list_locations().unwrap();
    let app = create_router(AppState::new(service.clone()));

    for location in locations {
        let features = service.encode(&query(&location, 1000.0)).unwrap();
        assert!(!features.is_baseline(), "{location} should resolve");

        let body = json!({"total_sqft": 1000, "location": location, "bath": 2, "bhk": 2});
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/predict_home_price")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["estimated_price"].is_f64());
    }
}

#[tokio::test]
async fn get_location_names_over_http() {
    let app = create_router(AppState::new(loaded_service()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/get_location_names")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await["locations"].as_array().unwrap().len(),
        3
    );
}
