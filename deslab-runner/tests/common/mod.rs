//! Stub pool, strategies and fixture data shared by the integration tests.
//!
//! The fixture puts every instance at the same point, so kDN neighbour ties
//! resolve by index. Positives occupy the low indices, which makes every
//! validation negative Hard (all neighbours positive) and every validation
//! positive Easy.

#![allow(dead_code)]

use rand::rngs::StdRng;
use std::cell::RefCell;
use std::sync::Arc;

use deslab_core::data::LoadedDataset;
use deslab_core::pool::{
    Classifier, ClassifierPool, PoolError, PoolGenerator, PoolParams, SelectionStrategy,
    StrategyFactory, StrategySpec,
};
use deslab_core::{InstanceSet, Label, StrategyKind};
use deslab_runner::ExperimentConfig;

/// 30 positives then 30 negatives, all at the origin.
pub fn stacked_dataset(name: &str) -> LoadedDataset {
    let labels: Vec<Label> = (0..60).map(|i| if i < 30 { 1 } else { 0 }).collect();
    let features = vec![vec![0.0, 0.0]; 60];
    LoadedDataset {
        name: name.to_string(),
        feature_names: vec!["x".into(), "y".into()],
        instances: InstanceSet::new(features, labels).unwrap(),
        dataset_hash: "fixture".to_string(),
        dropped_rows: 0,
    }
}

/// 3 folds, kDN 3, a 3-member pool, and the two stub strategies.
pub fn small_config() -> ExperimentConfig {
    ExperimentConfig {
        num_folds: 3,
        pool_size: 3,
        kdn: 3,
        k_competence: 3,
        strategies: vec![
            StrategySpec::new("ValidationMajority", StrategyKind::Dcs, false),
            StrategySpec::new("PoolVote", StrategyKind::Static, false),
        ],
        ..ExperimentConfig::default()
    }
}

struct Constant(Label);

impl Classifier for Constant {
    fn predict(&self, _x: &[f64]) -> Label {
        self.0
    }
}

/// Pool of constant classifiers alternating 0, 1, 0, ...
pub struct AlternatingPool;

impl PoolGenerator for AlternatingPool {
    fn generate(
        &self,
        train: &InstanceSet,
        params: &PoolParams,
        _rng: &mut StdRng,
    ) -> Result<ClassifierPool, PoolError> {
        if train.is_empty() {
            return Err(PoolError::Generation("empty training set".into()));
        }
        let members: Vec<Arc<dyn Classifier>> = (0..params.pool_size)
            .map(|i| Arc::new(Constant((i % 2) as Label)) as Arc<dyn Classifier>)
            .collect();
        Ok(ClassifierPool::new(members))
    }
}

/// [`AlternatingPool`] that records the parameters of every call.
#[derive(Default)]
pub struct RecordingPool {
    pub params_seen: RefCell<Vec<PoolParams>>,
}

impl PoolGenerator for RecordingPool {
    fn generate(
        &self,
        train: &InstanceSet,
        params: &PoolParams,
        rng: &mut StdRng,
    ) -> Result<ClassifierPool, PoolError> {
        self.params_seen.borrow_mut().push(*params);
        AlternatingPool.generate(train, params, rng)
    }
}

/// Predicts the majority label of its validation set; ties go to 0.
#[derive(Default)]
pub struct ValidationMajority {
    label: Label,
}

impl SelectionStrategy for ValidationMajority {
    fn fit(&mut self, _pool: &ClassifierPool, validation: &InstanceSet) -> Result<(), PoolError> {
        let ones = validation.labels().iter().filter(|&&l| l == 1).count();
        self.label = Label::from(ones * 2 > validation.len());
        Ok(())
    }

    fn predict(&self, instances: &InstanceSet) -> Result<Vec<Label>, PoolError> {
        Ok(vec![self.label; instances.len()])
    }
}

/// Whole-pool majority vote.
#[derive(Default)]
pub struct PoolVote {
    pool: ClassifierPool,
}

impl SelectionStrategy for PoolVote {
    fn fit(&mut self, pool: &ClassifierPool, _validation: &InstanceSet) -> Result<(), PoolError> {
        self.pool = pool.clone();
        Ok(())
    }

    fn predict(&self, instances: &InstanceSet) -> Result<Vec<Label>, PoolError> {
        instances
            .features()
            .iter()
            .map(|x| {
                self.pool.majority_vote(x).ok_or_else(|| PoolError::Predict {
                    name: "PoolVote".into(),
                    reason: "empty pool".into(),
                })
            })
            .collect()
    }
}

/// Builds the stubs by name and records the competence sizes it was given.
#[derive(Default)]
pub struct StubFactory {
    pub k_seen: RefCell<Vec<usize>>,
}

impl StrategyFactory for StubFactory {
    fn build(
        &self,
        spec: &StrategySpec,
        k_competence: usize,
    ) -> Result<Box<dyn SelectionStrategy>, PoolError> {
        self.k_seen.borrow_mut().push(k_competence);
        match spec.name.as_str() {
            "ValidationMajority" => Ok(Box::new(ValidationMajority::default())),
            "PoolVote" => Ok(Box::new(PoolVote::default())),
            other => Err(PoolError::UnknownStrategy(other.to_string())),
        }
    }
}
