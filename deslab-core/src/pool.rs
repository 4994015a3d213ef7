//! Seams for the classifier pool and the selection strategies.
//!
//! Base classifiers, the bagging generator and the DES/DCS techniques are
//! supplied by the caller through these traits. The harness only trains,
//! fits and asks for predictions.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::domain::{InstanceSet, Label, StrategyKind};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool generation failed: {0}")]
    Generation(String),

    #[error("strategy '{name}' failed to fit: {reason}")]
    Fit { name: String, reason: String },

    #[error("strategy '{name}' failed to predict: {reason}")]
    Predict { name: String, reason: String },

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
}

/// A trained base classifier.
pub trait Classifier: Send + Sync {
    fn predict(&self, x: &[f64]) -> Label;

    fn predict_all(&self, instances: &InstanceSet) -> Vec<Label> {
        instances.features().iter().map(|x| self.predict(x)).collect()
    }
}

/// A trained ensemble of base classifiers, shared by every strategy of a fold.
#[derive(Clone, Default)]
pub struct ClassifierPool {
    members: Vec<Arc<dyn Classifier>>,
}

impl ClassifierPool {
    pub fn new(members: Vec<Arc<dyn Classifier>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Majority vote of the whole pool; ties go to the smaller label.
    pub fn majority_vote(&self, x: &[f64]) -> Option<Label> {
        let mut votes = [0usize; 256];
        for member in &self.members {
            votes[usize::from(member.predict(x))] += 1;
        }
        let best = votes.iter().copied().max().filter(|&v| v > 0)?;
        votes
            .iter()
            .position(|&v| v == best)
            .and_then(|l| Label::try_from(l).ok())
    }
}

impl std::fmt::Debug for ClassifierPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierPool")
            .field("len", &self.members.len())
            .finish()
    }
}

/// Size and bootstrap fraction of a bagging pool.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolParams {
    pub pool_size: usize,
    /// Fraction of the training set drawn for each member (`max_samples`).
    pub max_samples: f64,
}

impl PoolParams {
    /// Rows each member is trained on, at least one.
    pub fn samples_per_member(&self, train_len: usize) -> usize {
        ((train_len as f64 * self.max_samples).round() as usize).clamp(1, train_len.max(1))
    }
}

/// Builds a pool from training data.
pub trait PoolGenerator {
    fn generate(
        &self,
        train: &InstanceSet,
        params: &PoolParams,
        rng: &mut StdRng,
    ) -> Result<ClassifierPool, PoolError>;
}

/// A dynamic (or static) selection technique over a fitted pool.
pub trait SelectionStrategy {
    /// Fit competence estimates on the validation (DSEL) set.
    fn fit(&mut self, pool: &ClassifierPool, validation: &InstanceSet) -> Result<(), PoolError>;

    /// One label per test instance, in order.
    fn predict(&self, instances: &InstanceSet) -> Result<Vec<Label>, PoolError>;
}

/// Declarative description of one strategy in the experiment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategySpec {
    pub name: String,
    pub kind: StrategyKind,
    /// Dynamic frienemy pruning.
    #[serde(default)]
    pub dfp: bool,
}

impl StrategySpec {
    pub fn new(name: impl Into<String>, kind: StrategyKind, dfp: bool) -> Self {
        Self {
            name: name.into(),
            kind,
            dfp,
        }
    }
}

/// Instantiates strategies by spec. `k_competence` is the region-of-competence size.
pub trait StrategyFactory {
    fn build(
        &self,
        spec: &StrategySpec,
        k_competence: usize,
    ) -> Result<Box<dyn SelectionStrategy>, PoolError>;
}
