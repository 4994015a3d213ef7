//! Experiment runner — wires folds, hardness selection, the pool and the
//! strategies together into a [`PredictionStore`].
//!
//! Two entry points:
//! - `load_configured_datasets()`: reads every dataset the config names.
//! - `run_experiment()`: runs the full fold × bucket × strategy grid over
//!   pre-loaded datasets. Used by the CLI and by tests with stub strategies.

use thiserror::Error;
use tracing::{debug, info, warn};

use deslab_core::data::{dataset_path, load_dataset, DataError, LoadedDataset};
use deslab_core::domain::DomainError;
use deslab_core::folds::{stratified_k_fold, stratified_split, FoldError};
use deslab_core::hardness::{kdn_hardness, HardnessError};
use deslab_core::pool::{PoolError, PoolGenerator, PoolParams, StrategyFactory};
use deslab_core::rng::{streams, RngHierarchy};
use deslab_core::scaling::{scale_data, ScalingError};
use deslab_core::selection::{select_with_scores, SelectionError};

use crate::config::{ConfigError, ExperimentConfig};
use crate::predictions::{PredictionError, PredictionStore, StrategyPrediction};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("fold error: {0}")]
    Fold(#[from] FoldError),
    #[error("scaling error: {0}")]
    Scaling(#[from] ScalingError),
    #[error("hardness error: {0}")]
    Hardness(#[from] HardnessError),
    #[error("selection error: {0}")]
    Selection(#[from] SelectionError),
    #[error("pool error: {0}")]
    Pool(#[from] PoolError),
    #[error("strategy '{strategy}' on {dataset}/fold {fold}/{bucket}: {source}")]
    Strategy {
        dataset: String,
        fold: usize,
        bucket: String,
        strategy: String,
        #[source]
        source: PoolError,
    },
    #[error("bucket '{bucket}' selected no validation instances for {dataset}/fold {fold}")]
    EmptyValidation {
        dataset: String,
        fold: usize,
        bucket: String,
    },
    #[error("prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

/// Progress callbacks for a running experiment.
pub trait ExperimentProgress {
    /// Called when a dataset starts.
    fn on_dataset_start(&self, dataset: &str, index: usize, total: usize);

    /// Called after every bucket and strategy of a fold has been recorded.
    fn on_fold_complete(&self, dataset: &str, fold: usize, total_folds: usize);

    /// Called once the whole grid is done.
    fn on_experiment_complete(&self, datasets: usize, predictions: usize);
}

/// Progress reporter that emits `tracing` events.
pub struct LogProgress;

impl ExperimentProgress for LogProgress {
    fn on_dataset_start(&self, dataset: &str, index: usize, total: usize) {
        info!(dataset, "[{}/{}] running dataset", index + 1, total);
    }

    fn on_fold_complete(&self, dataset: &str, fold: usize, total_folds: usize) {
        info!(dataset, "fold {}/{} complete", fold + 1, total_folds);
    }

    fn on_experiment_complete(&self, datasets: usize, predictions: usize) {
        info!(datasets, predictions, "experiment complete");
    }
}

/// Load every dataset named in the config from its data directory.
pub fn load_configured_datasets(config: &ExperimentConfig) -> Result<Vec<LoadedDataset>, RunError> {
    config
        .datasets
        .names
        .iter()
        .map(|name| {
            let path = dataset_path(&config.datasets.data_dir, name);
            let dataset = load_dataset(&path, &config.datasets.label_column)?;
            if dataset.dropped_rows > 0 {
                warn!(
                    dataset = %dataset.name,
                    dropped = dataset.dropped_rows,
                    "dropped rows with missing values"
                );
            }
            debug!(dataset = %dataset.name, hash = %dataset.dataset_hash, rows = dataset.instances.len(), "loaded");
            Ok(dataset)
        })
        .collect()
}

/// Run the fold × bucket × strategy grid.
///
/// For each dataset: stratified folds; the training part of each fold is
/// split into train and validation, all three sets are scaled on train, and
/// one pool is trained per fold. Validation hardness is scored once per fold
/// and every bucket filters it. Each strategy is fitted on the bucket's
/// validation subset and predicts the test fold.
pub fn run_experiment(
    config: &ExperimentConfig,
    datasets: &[LoadedDataset],
    pool_generator: &dyn PoolGenerator,
    factory: &dyn StrategyFactory,
    progress: Option<&dyn ExperimentProgress>,
) -> Result<PredictionStore, RunError> {
    config.validate()?;
    let rngs = RngHierarchy::new(config.seed);
    let pool_params = PoolParams {
        pool_size: config.pool_size,
        max_samples: config.bagging_percentage,
    };
    let mut store = PredictionStore::new();

    for (d_index, dataset) in datasets.iter().enumerate() {
        let name = dataset.name.as_str();
        if let Some(p) = progress {
            p.on_dataset_start(name, d_index, datasets.len());
        }

        let instances = &dataset.instances;
        let labels = instances.labels();
        let folds = stratified_k_fold(
            labels,
            config.num_folds,
            &mut rngs.rng_for(name, 0, streams::FOLDS),
        )?;

        for fold in &folds {
            let f = fold.fold_index;
            let (train_idx, val_idx) = stratified_split(
                &fold.train,
                labels,
                config.strategy_percentage,
                &mut rngs.rng_for(name, f, streams::SPLIT),
            )?;
            let (train, validation, test) = scale_data(
                &instances.subset(&train_idx)?,
                &instances.subset(&val_idx)?,
                &instances.subset(&fold.test)?,
            )?;

            let pool = pool_generator.generate(
                &train,
                &pool_params,
                &mut rngs.rng_for(name, f, streams::POOL),
            )?;
            let hardness = kdn_hardness(&validation, config.kdn)?;
            debug!(
                dataset = name,
                fold = f,
                train = train.len(),
                validation = validation.len(),
                test = test.len(),
                pool = pool.len(),
                "fold prepared"
            );

            for bucket in &config.buckets {
                let selected = select_with_scores(&validation, &hardness, &bucket.predicate)?;
                if selected.is_empty() {
                    return Err(RunError::EmptyValidation {
                        dataset: name.to_string(),
                        fold: f,
                        bucket: bucket.name.clone(),
                    });
                }
                store.record_gold(name, f, &bucket.name, test.labels().to_vec());

                for spec in &config.strategies {
                    let strategy_err = |source| RunError::Strategy {
                        dataset: name.to_string(),
                        fold: f,
                        bucket: bucket.name.clone(),
                        strategy: spec.name.clone(),
                        source,
                    };
                    let mut strategy = factory
                        .build(spec, config.k_competence)
                        .map_err(strategy_err)?;
                    strategy.fit(&pool, &selected).map_err(strategy_err)?;
                    let predicted = strategy.predict(&test).map_err(strategy_err)?;

                    store.insert_prediction(
                        name,
                        f,
                        &bucket.name,
                        &spec.name,
                        StrategyPrediction {
                            predicted,
                            kind: spec.kind,
                        },
                    )?;
                }
                debug!(
                    dataset = name,
                    fold = f,
                    bucket = %bucket.name,
                    validation = selected.len(),
                    "bucket recorded"
                );
            }

            if let Some(p) = progress {
                p.on_fold_complete(name, f, folds.len());
            }
        }
    }

    if let Some(p) = progress {
        p.on_experiment_complete(datasets.len(), store.n_predictions());
    }
    Ok(store)
}
