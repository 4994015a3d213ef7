//! Raw prediction store: dataset → fold → bucket → strategy predictions.
//!
//! Each bucket keeps its fold's gold labels in a dedicated field. In JSON
//! they sit beside the strategies under the reserved `gold_labels` key, so
//! the persisted shape is
//!
//! ```json
//! { "cm1": { "0": { "Hard": { "gold_labels": [0, 1], "F-KNU": { "predicted": [0, 1], "kind": "DES" } } } } }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use deslab_core::{Label, StrategyKind};

/// Key under which a bucket's gold labels are stored.
pub const GOLD_LABELS_KEY: &str = "gold_labels";

#[derive(Debug, Error, PartialEq)]
pub enum PredictionError {
    #[error("'{0}' is reserved for gold labels and cannot name a strategy")]
    ReservedName(String),

    #[error("strategy '{strategy}' predicted {predicted} labels for {gold} gold labels")]
    LengthMismatch {
        strategy: String,
        gold: usize,
        predicted: usize,
    },

    #[error("no gold labels recorded for {dataset}/fold {fold}/{bucket}")]
    MissingBucket {
        dataset: String,
        fold: usize,
        bucket: String,
    },
}

/// One strategy's output on a test fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyPrediction {
    pub predicted: Vec<Label>,
    pub kind: StrategyKind,
}

/// Gold labels of a test fold plus every strategy's predictions for it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BucketPredictions {
    gold_labels: Vec<Label>,
    #[serde(flatten)]
    strategies: BTreeMap<String, StrategyPrediction>,
}

impl BucketPredictions {
    pub fn new(gold_labels: Vec<Label>) -> Self {
        Self {
            gold_labels,
            strategies: BTreeMap::new(),
        }
    }

    /// Add a strategy's predictions. Rejects the reserved key and length mismatches.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        prediction: StrategyPrediction,
    ) -> Result<(), PredictionError> {
        let name = name.into();
        if name == GOLD_LABELS_KEY {
            return Err(PredictionError::ReservedName(name));
        }
        if prediction.predicted.len() != self.gold_labels.len() {
            return Err(PredictionError::LengthMismatch {
                strategy: name,
                gold: self.gold_labels.len(),
                predicted: prediction.predicted.len(),
            });
        }
        self.strategies.insert(name, prediction);
        Ok(())
    }

    pub fn gold_labels(&self) -> &[Label] {
        &self.gold_labels
    }

    pub fn strategies(&self) -> &BTreeMap<String, StrategyPrediction> {
        &self.strategies
    }

    /// Move the gold labels out, leaving only strategies to iterate.
    pub fn into_parts(self) -> (Vec<Label>, BTreeMap<String, StrategyPrediction>) {
        (self.gold_labels, self.strategies)
    }
}

pub type FoldPredictions = BTreeMap<String, BucketPredictions>;
pub type DatasetPredictions = BTreeMap<usize, FoldPredictions>;

/// All predictions of an experiment run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionStore {
    datasets: BTreeMap<String, DatasetPredictions>,
}

impl PredictionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a bucket for `(dataset, fold, bucket)` with the fold's gold labels.
    ///
    /// Replaces any predictions already recorded there.
    pub fn record_gold(&mut self, dataset: &str, fold: usize, bucket: &str, gold: Vec<Label>) {
        self.datasets
            .entry(dataset.to_string())
            .or_default()
            .entry(fold)
            .or_default()
            .insert(bucket.to_string(), BucketPredictions::new(gold));
    }

    /// Record one strategy's predictions into an already opened bucket.
    pub fn insert_prediction(
        &mut self,
        dataset: &str,
        fold: usize,
        bucket: &str,
        strategy: &str,
        prediction: StrategyPrediction,
    ) -> Result<(), PredictionError> {
        let slot = self
            .datasets
            .get_mut(dataset)
            .and_then(|folds| folds.get_mut(&fold))
            .and_then(|buckets| buckets.get_mut(bucket))
            .ok_or_else(|| PredictionError::MissingBucket {
                dataset: dataset.to_string(),
                fold,
                bucket: bucket.to_string(),
            })?;
        slot.insert(strategy, prediction)
    }

    pub fn bucket(&self, dataset: &str, fold: usize, bucket: &str) -> Option<&BucketPredictions> {
        self.datasets.get(dataset)?.get(&fold)?.get(bucket)
    }

    pub fn datasets(&self) -> &BTreeMap<String, DatasetPredictions> {
        &self.datasets
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Total number of strategy prediction vectors.
    pub fn n_predictions(&self) -> usize {
        self.datasets
            .values()
            .flat_map(|folds| folds.values())
            .flat_map(|buckets| buckets.values())
            .map(|b| b.strategies.len())
            .sum()
    }

    pub fn into_inner(self) -> BTreeMap<String, DatasetPredictions> {
        self.datasets
    }
}
