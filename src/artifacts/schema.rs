//! Column schema: fixed numeric features followed by one-hot location columns.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ArtifactError;

/// Number of leading numeric columns (sqft, bath, bhk).
pub const FIXED_FEATURES: usize = 3;

/// Prefix the training pipeline puts on one-hot location columns.
const LOCATION_PREFIX: &str = "location_";

/// On-disk schema document.
#[derive(Debug, Deserialize)]
struct SchemaFile {
    data_columns: Vec<String>,
}

/// Ordered feature names defining the feature vector layout.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<String>,
    /// Normalized location name -> column index.
    location_index: HashMap<String, usize>,
}

impl Schema {
    /// Build a schema from an ordered column list.
    pub fn new(columns: Vec<String>) -> Result<Self, ArtifactError> {
        if columns.len() < FIXED_FEATURES {
            return Err(ArtifactError::SchemaTooShort {
                len: columns.len(),
                required: FIXED_FEATURES,
            });
        }

        let mut location_index = HashMap::new();
        for (idx, column) in columns.iter().enumerate().skip(FIXED_FEATURES) {
            let key = normalize(column);
            if let Some(bare) = key.strip_prefix(LOCATION_PREFIX) {
                location_index.entry(bare.to_string()).or_insert(idx);
            }
            location_index.entry(key).or_insert(idx);
        }

        Ok(Self {
            columns,
            location_index,
        })
    }

    /// Parse the schema document at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: SchemaFile =
            serde_json::from_str(&raw).map_err(|source| ArtifactError::SchemaFormat {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(file.data_columns)
    }

    /// Total feature count.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Always false; a valid schema holds the fixed features.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// All column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Location columns, verbatim and in loaded order.
    pub fn locations(&self) -> &[String] {
        &self.columns[FIXED_FEATURES..]
    }

    /// Resolve a requested location to its column index.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace. Both the
    /// raw column key (`location_whitefield`) and the bare area name
    /// (`whitefield`) resolve.
    pub fn location_index(&self, location: &str) -> Option<usize> {
        self.location_index.get(&normalize(location)).copied()
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}
