//! Serialized regressors and the prediction capability they expose.
//!
//! The model file is a JSON document tagged by `kind`:
//!
//! ```text
//! {"kind": "linear", "intercept": 12.5, "coefficients": [0.08, 4.1, 2.3, ...]}
//! {"kind": "tree_ensemble", "base_score": 0.5, "trees": [{"nodes": [...]}]}
//! ```
//!
//! Tree nodes are stored flat with the root at index 0. A split sends a sample
//! left when `x[feature] < threshold`.

use std::fmt::Debug;
use std::path::Path;

use serde::Deserialize;
use strum::Display;

use crate::error::ArtifactError;

/// Prediction capability of a trained regressor.
pub trait Regressor: Send + Sync + Debug {
    /// Predict a single row.
    fn predict(&self, features: &[f64]) -> f64;

    /// Predict several rows.
    fn predict_batch(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict(row)).collect()
    }

    /// Feature count the model was trained on, if it records one.
    fn num_features(&self) -> Option<usize> {
        None
    }

    /// Highest feature index the model reads, when it reads a sparse subset.
    fn max_feature_index(&self) -> Option<usize> {
        None
    }
}

/// Model family, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ModelKind {
    /// Ordinary linear regression.
    Linear,
    /// Additive ensemble of regression trees.
    TreeEnsemble,
}

/// A regressor deserialized from the model artifact.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavedModel {
    /// `intercept + coefficients · x`.
    Linear(LinearModel),
    /// `base_score + Σ leaf(tree, x)`.
    TreeEnsemble(TreeEnsemble),
}

impl SavedModel {
    /// Deserialize and validate the model file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let raw = std::fs::read(path).map_err(|source| ArtifactError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model: SavedModel =
            serde_json::from_slice(&raw).map_err(|source| ArtifactError::ModelFormat {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate()?;
        Ok(model)
    }

    /// Model family.
    pub fn kind(&self) -> ModelKind {
        match self {
            SavedModel::Linear(_) => ModelKind::Linear,
            SavedModel::TreeEnsemble(_) => ModelKind::TreeEnsemble,
        }
    }

    /// Check structural consistency.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        match self {
            SavedModel::Linear(m) => m.validate(),
            SavedModel::TreeEnsemble(m) => m.validate(),
        }
    }
}

impl Regressor for SavedModel {
    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            SavedModel::Linear(m) => m.predict(features),
            SavedModel::TreeEnsemble(m) => m.predict(features),
        }
    }

    fn num_features(&self) -> Option<usize> {
        match self {
            SavedModel::Linear(m) => m.num_features(),
            SavedModel::TreeEnsemble(m) => m.num_features(),
        }
    }

    fn max_feature_index(&self) -> Option<usize> {
        match self {
            SavedModel::Linear(m) => m.max_feature_index(),
            SavedModel::TreeEnsemble(m) => m.max_feature_index(),
        }
    }
}

/// Linear regression weights.
#[derive(Debug, Clone, Deserialize)]
pub struct LinearModel {
    /// Bias term.
    pub intercept: f64,
    /// One weight per feature, in schema order.
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.coefficients.is_empty() {
            return Err(ArtifactError::InvalidModel(
                "linear model has no coefficients".to_string(),
            ));
        }
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::InvalidModel(
                "linear model has non-finite weights".to_string(),
            ));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn predict(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    fn num_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}

/// Gradient-boosted tree ensemble.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    /// Global offset added to every prediction.
    #[serde(default)]
    pub base_score: f64,
    /// Feature count recorded at training time.
    #[serde(default)]
    pub num_features: Option<usize>,
    /// Member trees.
    pub trees: Vec<Tree>,
}

/// One regression tree stored as a flat node array.
#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    /// Nodes, root first.
    pub nodes: Vec<Node>,
}

/// Tree node.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Internal split.
    Split {
        /// Feature index tested.
        feature: usize,
        /// Samples below go left.
        threshold: f64,
        /// Left child index.
        left: usize,
        /// Right child index.
        right: usize,
    },
    /// Terminal output.
    Leaf {
        /// Leaf value.
        leaf: f64,
    },
}

impl TreeEnsemble {
    fn validate(&self) -> Result<(), ArtifactError> {
        if self.trees.is_empty() {
            return Err(ArtifactError::InvalidModel(
                "tree ensemble has no trees".to_string(),
            ));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(self.num_features)
                .map_err(|reason| ArtifactError::InvalidModel(format!("tree {t}: {reason}")))?;
        }
        Ok(())
    }
}

impl Tree {
    /// Children must point forward so evaluation always terminates.
    fn validate(&self, num_features: Option<usize>) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = *node
            {
                for child in [left, right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!("node {idx} has invalid child {child}"));
                    }
                }
                if num_features.is_some_and(|n| feature >= n) {
                    return Err(format!("node {idx} splits on unknown feature {feature}"));
                }
            }
        }
        Ok(())
    }

    fn leaf_value(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { leaf } => return leaf,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    // Missing features take the right branch.
                    let x = features.get(feature).copied().unwrap_or(f64::NAN);
                    idx = if x < threshold { left } else { right };
                }
            }
        }
    }
}

impl Regressor for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|tree| tree.leaf_value(features))
                .sum::<f64>()
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }

    fn max_feature_index(&self) -> Option<usize> {
        self.trees
            .iter()
            .flat_map(|tree| &tree.nodes)
            .filter_map(|node| match *node {
                Node::Split { feature, .. } => Some(feature),
                Node::Leaf { .. } => None,
            })
            .max()
    }
}
