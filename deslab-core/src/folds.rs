//! Stratified fold generation and train/validation splitting.
//!
//! Both splitters shuffle within each class, so every fold (or split half)
//! keeps roughly the class proportions of the whole. Output index lists
//! are sorted ascending.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::domain::Label;

#[derive(Debug, Error, PartialEq)]
pub enum FoldError {
    #[error("need at least 2 folds, got {n_folds}")]
    TooFewFolds { n_folds: usize },

    #[error("class {label} has {count} members, fewer than {n_folds} folds")]
    ClassTooSmall {
        label: Label,
        count: usize,
        n_folds: usize,
    },

    #[error("split fraction must lie in (0, 1), got {fraction}")]
    InvalidFraction { fraction: f64 },

    #[error("split of {total} instances left one side empty")]
    EmptySplit { total: usize },

    #[error("index {index} out of bounds for {len} labels")]
    IndexOutOfBounds { index: usize, len: usize },
}

/// One cross-validation fold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoldSpec {
    pub fold_index: usize,
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Stratified k-fold over all indices of `labels`.
///
/// Members of each class are shuffled, then dealt round-robin across folds.
pub fn stratified_k_fold<R: Rng + ?Sized>(
    labels: &[Label],
    n_folds: usize,
    rng: &mut R,
) -> Result<Vec<FoldSpec>, FoldError> {
    if n_folds < 2 {
        return Err(FoldError::TooFewFolds { n_folds });
    }

    let by_class = group_by_class(0..labels.len(), labels);
    for (&label, members) in &by_class {
        if members.len() < n_folds {
            return Err(FoldError::ClassTooSmall {
                label,
                count: members.len(),
                n_folds,
            });
        }
    }

    let mut tests: Vec<Vec<usize>> = vec![Vec::new(); n_folds];
    for mut members in by_class.into_values() {
        members.shuffle(rng);
        for (i, idx) in members.into_iter().enumerate() {
            tests[i % n_folds].push(idx);
        }
    }

    Ok(tests
        .into_iter()
        .enumerate()
        .map(|(fold_index, mut test)| {
            test.sort_unstable();
            let mut in_test = vec![false; labels.len()];
            for &i in &test {
                in_test[i] = true;
            }
            let train = (0..labels.len()).filter(|&i| !in_test[i]).collect();
            FoldSpec {
                fold_index,
                train,
                test,
            }
        })
        .collect())
}

/// Split `indices` into `(train, validation)`, sending `fraction` of each
/// class to validation.
pub fn stratified_split<R: Rng + ?Sized>(
    indices: &[usize],
    labels: &[Label],
    fraction: f64,
    rng: &mut R,
) -> Result<(Vec<usize>, Vec<usize>), FoldError> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(FoldError::InvalidFraction { fraction });
    }
    if let Some(&index) = indices.iter().find(|&&i| i >= labels.len()) {
        return Err(FoldError::IndexOutOfBounds {
            index,
            len: labels.len(),
        });
    }

    let mut train = Vec::new();
    let mut validation = Vec::new();
    for mut members in group_by_class(indices.iter().copied(), labels).into_values() {
        members.shuffle(rng);
        let n_val = ((members.len() as f64) * fraction).round() as usize;
        let (val, rest) = members.split_at(n_val.min(members.len()));
        validation.extend_from_slice(val);
        train.extend_from_slice(rest);
    }

    if train.is_empty() || validation.is_empty() {
        return Err(FoldError::EmptySplit {
            total: indices.len(),
        });
    }
    train.sort_unstable();
    validation.sort_unstable();
    Ok((train, validation))
}

fn group_by_class(
    indices: impl Iterator<Item = usize>,
    labels: &[Label],
) -> BTreeMap<Label, Vec<usize>> {
    let mut by_class: BTreeMap<Label, Vec<usize>> = BTreeMap::new();
    for i in indices {
        by_class.entry(labels[i]).or_default().push(i);
    }
    by_class
}
