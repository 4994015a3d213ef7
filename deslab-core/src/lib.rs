//! DESLab Core — instance sets, kDN hardness, validation selection, metrics.
//!
//! This crate holds the numeric parts of the hardness experiment:
//! - Labeled instance sets and CSV dataset loading
//! - k-Disagreeing-Neighbours hardness scoring
//! - Hardness-filtered validation selection (None / Hard / Easy buckets)
//! - Classification metrics (ROC AUC, G-mean, macro F1, accuracy)
//! - Stratified folds, standard scaling and a deterministic RNG hierarchy
//! - Traits for the externally supplied classifier pool and strategies

pub mod data;
pub mod domain;
pub mod folds;
pub mod hardness;
pub mod metrics;
pub mod pool;
pub mod rng;
pub mod scaling;
pub mod selection;

pub use domain::{DomainError, InstanceSet, Label, StrategyKind};
pub use hardness::{kdn_hardness, HardnessError};
pub use metrics::{MetricName, MetricsError, MetricsRecord};
pub use selection::{default_validation_hardnesses, HardnessBucket, HardnessPredicate};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: public value types are Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<InstanceSet>();
        require_sync::<InstanceSet>();
        require_send::<StrategyKind>();
        require_sync::<StrategyKind>();
        require_send::<HardnessPredicate>();
        require_sync::<HardnessPredicate>();
        require_send::<HardnessBucket>();
        require_sync::<HardnessBucket>();
        require_send::<MetricsRecord>();
        require_sync::<MetricsRecord>();
        require_send::<folds::FoldSpec>();
        require_sync::<folds::FoldSpec>();
        require_send::<scaling::StandardScaler>();
        require_sync::<scaling::StandardScaler>();
        require_send::<rng::RngHierarchy>();
        require_sync::<rng::RngHierarchy>();
        require_send::<pool::ClassifierPool>();
        require_sync::<pool::ClassifierPool>();
        require_send::<pool::StrategySpec>();
        require_sync::<pool::StrategySpec>();
        require_send::<data::LoadedDataset>();
        require_sync::<data::LoadedDataset>();
    }

    /// Architecture contract: hardness depends only on features and labels.
    #[test]
    fn hardness_takes_only_the_instance_set() {
        fn _check(set: &InstanceSet) -> Result<Vec<f64>, HardnessError> {
            kdn_hardness(set, 1)
        }
    }
}
