//! Metrics aggregation: per-fold records, then mean/std summaries.
//!
//! Both levels share the hierarchy dataset → hardness bucket → strategy.
//! The fold level sits under the strategy as an ordered list of records,
//! one per fold; the summary level replaces that list with a
//! `(mean, std)` pair per metric.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use deslab_core::metrics::{MetricName, MetricsError, MetricsRecord};

use crate::persistence;
use crate::predictions::PredictionStore;

/// dataset → bucket → strategy → `T`
pub type Nested<T> = BTreeMap<String, BTreeMap<String, BTreeMap<String, T>>>;

/// Per-fold metric records, in fold order.
pub type FoldMetrics = Nested<Vec<MetricsRecord>>;

/// Per-metric mean/std for one strategy.
pub type StrategySummary = BTreeMap<MetricName, MetricSummary>;

/// dataset → bucket → strategy → metric → (mean, std)
pub type Summary = Nested<StrategySummary>;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("metrics for {dataset}/fold {fold}/{bucket}/{strategy}: {source}")]
    Metrics {
        dataset: String,
        fold: usize,
        bucket: String,
        strategy: String,
        #[source]
        source: MetricsError,
    },
}

/// Mean and population standard deviation across folds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    pub mean: f64,
    pub std: f64,
}

impl MetricSummary {
    /// `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        Some(Self {
            mean,
            std: var.sqrt(),
        })
    }
}

/// Compute one metrics record per (dataset, fold, bucket, strategy).
///
/// Consumes the store: each bucket's gold labels are moved out before its
/// strategies are scored.
pub fn generate_metrics(store: PredictionStore) -> Result<FoldMetrics, AggregateError> {
    let mut out = FoldMetrics::new();

    for (dataset, folds) in store.into_inner() {
        for (fold, buckets) in folds {
            for (bucket, predictions) in buckets {
                let (gold, strategies) = predictions.into_parts();
                for (strategy, prediction) in strategies {
                    let record = MetricsRecord::compute(&gold, &prediction.predicted).map_err(
                        |source| AggregateError::Metrics {
                            dataset: dataset.clone(),
                            fold,
                            bucket: bucket.clone(),
                            strategy: strategy.clone(),
                            source,
                        },
                    )?;
                    debug!(%dataset, fold, %bucket, %strategy, acc = record.acc, "scored fold");
                    out.entry(dataset.clone())
                        .or_default()
                        .entry(bucket.clone())
                        .or_default()
                        .entry(strategy)
                        .or_default()
                        .push(record);
                }
            }
        }
    }

    Ok(out)
}

/// Mean and population std of every metric across each fold list.
///
/// Borrows the input; strategies with no recorded folds are left out.
pub fn summarize_metrics_folds(metrics: &FoldMetrics) -> Summary {
    let mut summary = Summary::new();
    for (dataset, buckets) in metrics {
        for (bucket, strategies) in buckets {
            for (strategy, records) in strategies {
                let per_metric: StrategySummary = MetricName::ALL
                    .into_iter()
                    .filter_map(|name| {
                        let values: Vec<f64> = records.iter().map(|r| r.get(name)).collect();
                        MetricSummary::from_values(&values).map(|s| (name, s))
                    })
                    .collect();
                if per_metric.is_empty() {
                    continue;
                }
                summary
                    .entry(dataset.clone())
                    .or_default()
                    .entry(bucket.clone())
                    .or_default()
                    .insert(strategy.clone(), per_metric);
            }
        }
    }
    summary
}

/// Summarize and write the summary to `path`.
pub fn summarize_and_persist(metrics: &FoldMetrics, path: &Path) -> Result<Summary> {
    let summary = summarize_metrics_folds(metrics);
    persistence::save_summary(path, &summary)?;
    info!(
        path = %path.display(),
        datasets = summary.len(),
        "summary persisted"
    );
    Ok(summary)
}
