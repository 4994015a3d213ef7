//! Labeled instance sets.
//!
//! An `InstanceSet` is an ordered collection of feature vectors, each paired
//! with a binary gold label. Row order is significant: hardness scores,
//! fold indices and validation filters all address instances by position.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Binary class label (0 = negative, 1 = positive).
pub type Label = u8;

/// Errors from constructing or slicing an instance set.
#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("label count {labels} does not match instance count {instances}")]
    LabelCountMismatch { instances: usize, labels: usize },

    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("index {index} out of bounds for instance set of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// Ordered feature vectors with their gold labels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InstanceSet {
    features: Vec<Vec<f64>>,
    labels: Vec<Label>,
}

impl InstanceSet {
    /// Build a set, rejecting ragged rows and mismatched label counts.
    pub fn new(features: Vec<Vec<f64>>, labels: Vec<Label>) -> Result<Self, DomainError> {
        if features.len() != labels.len() {
            return Err(DomainError::LabelCountMismatch {
                instances: features.len(),
                labels: labels.len(),
            });
        }
        if let Some(first) = features.first() {
            let expected = first.len();
            if let Some((row, found)) = features
                .iter()
                .map(Vec::len)
                .enumerate()
                .find(|(_, len)| *len != expected)
            {
                return Err(DomainError::RaggedRow {
                    row,
                    expected,
                    found,
                });
            }
        }
        Ok(Self { features, labels })
    }

    /// An empty set.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Number of features per instance (0 for an empty set).
    pub fn n_features(&self) -> usize {
        self.features.first().map_or(0, Vec::len)
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Feature vector of instance `i`.
    pub fn instance(&self, i: usize) -> Option<&[f64]> {
        self.features.get(i).map(Vec::as_slice)
    }

    /// Iterate `(features, label)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], Label)> + '_ {
        self.features
            .iter()
            .map(Vec::as_slice)
            .zip(self.labels.iter().copied())
    }

    /// Copy out the instances at `indices`, in the order given.
    pub fn subset(&self, indices: &[usize]) -> Result<Self, DomainError> {
        let mut features = Vec::with_capacity(indices.len());
        let mut labels = Vec::with_capacity(indices.len());
        for &index in indices {
            if index >= self.len() {
                return Err(DomainError::IndexOutOfBounds {
                    index,
                    len: self.len(),
                });
            }
            features.push(self.features[index].clone());
            labels.push(self.labels[index]);
        }
        Ok(Self { features, labels })
    }

    /// Replace the feature matrix, keeping labels. Used after scaling.
    pub fn with_features(&self, features: Vec<Vec<f64>>) -> Result<Self, DomainError> {
        Self::new(features, self.labels.clone())
    }
}
