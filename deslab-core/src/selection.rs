//! Hardness-filtered validation selection.
//!
//! A validation set is drawn from the training portion of a fold by keeping
//! only instances whose kDN hardness satisfies a predicate. Three named
//! buckets are used by default:
//!
//! | Bucket | Predicate            |
//! |--------|----------------------|
//! | `None` | always true          |
//! | `Hard` | hardness > threshold |
//! | `Easy` | hardness < threshold |
//!
//! Instances scoring exactly at the threshold fall in neither `Hard` nor `Easy`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::{DomainError, InstanceSet};
use crate::hardness::{kdn_hardness, HardnessError};

/// Errors from validation selection.
#[derive(Debug, Error, PartialEq)]
pub enum SelectionError {
    #[error("hardness error: {0}")]
    Hardness(#[from] HardnessError),

    #[error("{scores} hardness scores for {instances} instances")]
    ScoreCountMismatch { instances: usize, scores: usize },

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Predicate over a hardness score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HardnessPredicate {
    /// Keep everything.
    Always,
    /// Keep instances strictly harder than `threshold`.
    Above { threshold: f64 },
    /// Keep instances strictly easier than `threshold`.
    Below { threshold: f64 },
}

impl HardnessPredicate {
    pub fn accepts(&self, hardness: f64) -> bool {
        match *self {
            HardnessPredicate::Always => true,
            HardnessPredicate::Above { threshold } => hardness > threshold,
            HardnessPredicate::Below { threshold } => hardness < threshold,
        }
    }
}

impl fmt::Display for HardnessPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardnessPredicate::Always => write!(f, "always"),
            HardnessPredicate::Above { threshold } => write!(f, "> {threshold}"),
            HardnessPredicate::Below { threshold } => write!(f, "< {threshold}"),
        }
    }
}

/// A named validation-hardness bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardnessBucket {
    pub name: String,
    pub predicate: HardnessPredicate,
}

impl HardnessBucket {
    pub fn new(name: impl Into<String>, predicate: HardnessPredicate) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

/// The `None` / `Hard` / `Easy` buckets at the given threshold.
pub fn default_validation_hardnesses(threshold: f64) -> Vec<HardnessBucket> {
    vec![
        HardnessBucket::new("None", HardnessPredicate::Always),
        HardnessBucket::new("Hard", HardnessPredicate::Above { threshold }),
        HardnessBucket::new("Easy", HardnessPredicate::Below { threshold }),
    ]
}

/// Indices of instances whose precomputed score satisfies the predicate.
pub fn filter_by_hardness(hardness: &[f64], predicate: &HardnessPredicate) -> Vec<usize> {
    hardness
        .iter()
        .enumerate()
        .filter(|(_, &h)| predicate.accepts(h))
        .map(|(i, _)| i)
        .collect()
}

/// Score the set and return the indices of instances satisfying the predicate.
pub fn select_validation_indices(
    instances: &InstanceSet,
    predicate: &HardnessPredicate,
    k: usize,
) -> Result<Vec<usize>, SelectionError> {
    let hardness = kdn_hardness(instances, k)?;
    Ok(filter_by_hardness(&hardness, predicate))
}

/// Score the set and keep the instances satisfying the predicate, in order.
pub fn select_validation_set(
    instances: &InstanceSet,
    predicate: &HardnessPredicate,
    k: usize,
) -> Result<InstanceSet, SelectionError> {
    let indices = select_validation_indices(instances, predicate, k)?;
    Ok(instances.subset(&indices)?)
}

/// Like [`select_validation_set`], with scores computed by the caller.
///
/// Lets several buckets share one hardness pass.
pub fn select_with_scores(
    instances: &InstanceSet,
    hardness: &[f64],
    predicate: &HardnessPredicate,
) -> Result<InstanceSet, SelectionError> {
    if hardness.len() != instances.len() {
        return Err(SelectionError::ScoreCountMismatch {
            instances: instances.len(),
            scores: hardness.len(),
        });
    }
    let indices = filter_by_hardness(hardness, predicate);
    Ok(instances.subset(&indices)?)
}
