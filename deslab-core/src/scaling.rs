//! Per-feature standardisation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{DomainError, InstanceSet};

#[derive(Debug, Error, PartialEq)]
pub enum ScalingError {
    #[error("cannot fit a scaler on an empty set")]
    EmptyFit,

    #[error("scaler fitted on {expected} features, got {found}")]
    FeatureCountMismatch { expected: usize, found: usize },

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

/// Zero-mean, unit-variance scaling fitted on one set and applied to others.
///
/// Uses the population standard deviation; constant features get a scale
/// of 1 so they map to 0 instead of NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(set: &InstanceSet) -> Result<Self, ScalingError> {
        if set.is_empty() {
            return Err(ScalingError::EmptyFit);
        }
        let n = set.len() as f64;
        let d = set.n_features();

        let mut mean = vec![0.0; d];
        for x in set.features() {
            for (m, v) in mean.iter_mut().zip(x) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; d];
        for x in set.features() {
            for ((s, v), m) in var.iter_mut().zip(x).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let std = (s / n).sqrt();
                if std == 0.0 {
                    1.0
                } else {
                    std
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    pub fn transform(&self, set: &InstanceSet) -> Result<InstanceSet, ScalingError> {
        if !set.is_empty() && set.n_features() != self.mean.len() {
            return Err(ScalingError::FeatureCountMismatch {
                expected: self.mean.len(),
                found: set.n_features(),
            });
        }
        let features = set
            .features()
            .iter()
            .map(|x| {
                x.iter()
                    .zip(&self.mean)
                    .zip(&self.scale)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect();
        Ok(set.with_features(features)?)
    }
}

/// Fit on `train`, then transform all three sets.
pub fn scale_data(
    train: &InstanceSet,
    validation: &InstanceSet,
    test: &InstanceSet,
) -> Result<(InstanceSet, InstanceSet, InstanceSet), ScalingError> {
    let scaler = StandardScaler::fit(train)?;
    Ok((
        scaler.transform(train)?,
        scaler.transform(validation)?,
        scaler.transform(test)?,
    ))
}
