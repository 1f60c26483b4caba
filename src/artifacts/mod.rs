//! Artifact module: the column schema and serialized model loaded at startup.
//!
//! This module handles:
//! - Schema parsing and location lookup
//! - Model deserialization and the [`Regressor`] capability
//! - The reloadable [`ArtifactStore`] snapshot holder

pub mod model;
pub mod schema;
pub mod store;

pub use model::{ModelKind, Regressor, SavedModel};
pub use schema::Schema;
pub use store::{ArtifactPaths, ArtifactStore, Artifacts};
