//! Process-wide holder for the loaded schema and model.

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

use time::OffsetDateTime;
use tracing::{info, instrument, warn};

use super::model::{Regressor, SavedModel};
use super::schema::Schema;
use crate::config::Config;
use crate::error::{ArtifactError, PredictError};
use crate::metrics;

/// One consistent schema + model pair.
#[derive(Debug)]
pub struct Artifacts {
    schema: Schema,
    model: Arc<dyn Regressor>,
    loaded_at: OffsetDateTime,
}

impl Artifacts {
    /// Pair a schema with a model, checking that their feature counts agree.
    pub fn from_parts(schema: Schema, model: Arc<dyn Regressor>) -> Result<Self, ArtifactError> {
        if let Some(expected) = model.num_features() {
            if expected != schema.len() {
                return Err(ArtifactError::FeatureMismatch {
                    model: expected,
                    schema: schema.len(),
                });
            }
        }
        if let Some(feature) = model.max_feature_index() {
            if feature >= schema.len() {
                return Err(ArtifactError::FeatureOutOfRange {
                    feature,
                    schema: schema.len(),
                });
            }
        }

        Ok(Self {
            schema,
            model,
            loaded_at: OffsetDateTime::now_utc(),
        })
    }

    /// Column schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Model handle.
    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// When this snapshot was created.
    pub fn loaded_at(&self) -> OffsetDateTime {
        self.loaded_at
    }
}

/// Where the artifacts live on disk.
#[derive(Debug, Clone)]
pub struct ArtifactPaths {
    /// Schema document.
    pub schema: PathBuf,
    /// Serialized model.
    pub model: PathBuf,
}

impl From<&Config> for ArtifactPaths {
    fn from(config: &Config) -> Self {
        Self {
            schema: config.schema_path(),
            model: config.model_path(),
        }
    }
}

/// Holds the current [`Artifacts`] snapshot.
///
/// Readers take an `Arc` to the snapshot and drop the lock immediately, so a
/// reload swaps schema and model together.
#[derive(Debug)]
pub struct ArtifactStore {
    paths: ArtifactPaths,
    current: RwLock<Option<Arc<Artifacts>>>,
}

impl ArtifactStore {
    /// Create an empty store reading from `paths`.
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            current: RwLock::new(None),
        }
    }

    /// Create a store already holding `artifacts`.
    pub fn with_artifacts(paths: ArtifactPaths, artifacts: Artifacts) -> Self {
        Self {
            paths,
            current: RwLock::new(Some(Arc::new(artifacts))),
        }
    }

    /// Configured artifact locations.
    pub fn paths(&self) -> &ArtifactPaths {
        &self.paths
    }

    /// Read both artifacts from disk and replace the current snapshot.
    ///
    /// On failure the previous snapshot, if any, is kept.
    #[instrument(skip(self), fields(schema = %self.paths.schema.display(), model = %self.paths.model.display()))]
    pub fn load(&self) -> Result<Arc<Artifacts>, ArtifactError> {
        let start = Instant::now();

        let schema = Schema::from_file(&self.paths.schema)?;
        let model = SavedModel::from_file(&self.paths.model)?;
        let kind = model.kind();
        let artifacts = Arc::new(Artifacts::from_parts(schema, Arc::new(model))?);

        if artifacts.schema().locations().is_empty() {
            warn!("Schema has no location columns; every request will use the baseline");
        }

        let previous = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Arc::clone(&artifacts));

        metrics::inc_artifact_loads();
        info!(
            columns = artifacts.schema().len(),
            locations = artifacts.schema().locations().len(),
            model_kind = %kind,
            reloaded = previous.is_some(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Artifacts loaded"
        );

        Ok(artifacts)
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Result<Arc<Artifacts>, PredictError> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(PredictError::NotLoaded)
    }

    /// Whether a snapshot is available.
    pub fn is_loaded(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Location columns of the current snapshot.
    pub fn location_names(&self) -> Result<Vec<String>, PredictError> {
        Ok(self.snapshot()?.schema().locations().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::model::LinearModel;
    use pretty_assertions::assert_eq;

    fn paths() -> ArtifactPaths {
        ArtifactPaths {
            schema: PathBuf::from("does/not/exist/columns.json"),
            model: PathBuf::from("does/not/exist/model.json"),
        }
    }

    fn schema() -> Schema {
        Schema::new(
            ["total_sqft", "bath", "bhk", "location_whitefield"]
                .map(String::from)
                .to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn empty_store_is_not_loaded() {
        let store = ArtifactStore::new(paths());
        assert!(!store.is_loaded());
        assert_eq!(store.location_names(), Err(PredictError::NotLoaded));
    }

    #[test]
    fn missing_files_fail_to_load() {
        let store = ArtifactStore::new(paths());
        assert!(matches!(store.load(), Err(ArtifactError::Read { .. })));
        assert!(!store.is_loaded());
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let model = Arc::new(LinearModel {
            intercept: 0.0,
            coefficients: vec![1.0; 4],
        });
        let artifacts = Artifacts::from_parts(schema(), model).unwrap();
        let store = ArtifactStore::with_artifacts(paths(), artifacts);

        assert!(store.load().is_err());
        assert_eq!(store.location_names().unwrap(), vec!["location_whitefield"]);
    }

    #[test]
    fn from_parts_rejects_split_beyond_schema() {
        let model: SavedModel = serde_json::from_str(
            r#"{
                "kind": "tree_ensemble",
                "trees": [{"nodes": [
                    {"feature": 9, "threshold": 1.0, "left": 1, "right": 2},
                    {"leaf": 1.0},
                    {"leaf": 2.0}
                ]}]
            }"#,
        )
        .unwrap();
        assert!(model.validate().is_ok());

        let err = Artifacts::from_parts(schema(), Arc::new(model)).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::FeatureOutOfRange { feature: 9, schema: 4 }
        ));
    }

    #[test]
    fn from_parts_rejects_feature_mismatch() {
        let model = Arc::new(LinearModel {
            intercept: 0.0,
            coefficients: vec![1.0; 3],
        });
        let err = Artifacts::from_parts(schema(), model).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::FeatureMismatch { model: 3, schema: 4 }
        ));
    }
}
