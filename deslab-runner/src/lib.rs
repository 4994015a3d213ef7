//! DESLab Runner — experiment orchestration, metrics aggregation, reporting.
//!
//! This crate builds on `deslab-core` to provide:
//! - TOML experiment configuration with content-hashed run ids
//! - The fold × hardness bucket × strategy experiment runner
//! - The raw prediction store (dataset → fold → bucket → strategy)
//! - Per-fold metrics and mean/std summaries across folds
//! - Versioned JSON archives for predictions and summaries
//! - The flat 11-column summary table (CSV, Parquet, text)

pub mod aggregate;
pub mod config;
pub mod persistence;
pub mod predictions;
pub mod runner;
pub mod table;

pub use aggregate::{
    generate_metrics, summarize_and_persist, summarize_metrics_folds, AggregateError, FoldMetrics,
    MetricSummary, Summary,
};
pub use config::{ConfigError, ExperimentConfig, RunId};
pub use persistence::{load_predictions, load_summary, save_predictions, save_summary};
pub use predictions::{BucketPredictions, PredictionStore, StrategyPrediction, GOLD_LABELS_KEY};
pub use runner::{load_configured_datasets, run_experiment, ExperimentProgress, LogProgress, RunError};
pub use table::{pandanize_summary, SummaryRow, SummaryTable};
