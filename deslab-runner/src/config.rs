//! Serializable experiment configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use deslab_core::data::{DEFAULT_DATASETS, DEFAULT_LABEL_COLUMN};
use deslab_core::pool::StrategySpec;
use deslab_core::selection::{default_validation_hardnesses, HardnessBucket};
use deslab_core::StrategyKind;

/// Unique identifier for an experiment configuration (content hash).
pub type RunId = String;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Everything needed to reproduce an experiment run.
///
/// Missing fields in a TOML file fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Stratified cross-validation folds per dataset.
    pub num_folds: usize,
    /// Base classifiers per bagging pool.
    pub pool_size: usize,
    /// Neighbours for kDN hardness.
    pub kdn: usize,
    /// Region-of-competence size handed to every strategy.
    pub k_competence: usize,
    /// Fraction of each training fold held out as validation (DSEL).
    pub strategy_percentage: f64,
    /// `max_samples` fraction for bagging.
    pub bagging_percentage: f64,
    /// Hard/Easy cut-off. Builds `buckets` when a TOML file omits them.
    pub hardness_threshold: f64,
    pub seed: u64,
    pub datasets: DatasetConfig,
    pub buckets: Vec<HardnessBucket>,
    pub strategies: Vec<StrategySpec>,
    pub paths: ArtifactPaths,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub data_dir: PathBuf,
    pub names: Vec<String>,
    pub label_column: String,
}

/// Relative locations of the persisted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArtifactPaths {
    pub predictions: PathBuf,
    pub summary: PathBuf,
    pub metrics_dir: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            names: DEFAULT_DATASETS.iter().map(|s| s.to_string()).collect(),
            label_column: DEFAULT_LABEL_COLUMN.to_string(),
        }
    }
}

impl Default for ArtifactPaths {
    fn default() -> Self {
        Self {
            predictions: PathBuf::from("predictions/all_predictions.json"),
            summary: PathBuf::from("results/summary.json"),
            metrics_dir: PathBuf::from("metrics"),
        }
    }
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        let hardness_threshold = 0.5;
        Self {
            num_folds: 10,
            pool_size: 100,
            kdn: 5,
            k_competence: 7,
            strategy_percentage: 0.5,
            bagging_percentage: 0.5,
            hardness_threshold,
            seed: 42,
            datasets: DatasetConfig::default(),
            buckets: default_validation_hardnesses(hardness_threshold),
            strategies: default_strategies(),
            paths: ArtifactPaths::default(),
        }
    }
}

/// F-KNU and F-KNE (DES), F-OLA, F-LCA and F-MCB (DCS), and plain bagging.
pub fn default_strategies() -> Vec<StrategySpec> {
    vec![
        StrategySpec::new("F-KNU", StrategyKind::Des, true),
        StrategySpec::new("F-KNE", StrategyKind::Des, true),
        StrategySpec::new("F-OLA", StrategyKind::Dcs, true),
        StrategySpec::new("F-LCA", StrategyKind::Dcs, true),
        StrategySpec::new("F-MCB", StrategyKind::Dcs, true),
        StrategySpec::new("Bagging", StrategyKind::Static, true),
    ]
}

impl ExperimentConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse and validate.
    ///
    /// Without an explicit `buckets` list the None/Hard/Easy buckets are
    /// derived from `hardness_threshold`.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(text)?;
        let explicit_buckets = table.contains_key("buckets");
        let mut config: Self = toml::Value::Table(table).try_into()?;
        if !explicit_buckets {
            config.buckets = default_validation_hardnesses(config.hardness_threshold);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_folds < 2 {
            return Err(ConfigError::Invalid(format!(
                "num_folds must be at least 2, got {}",
                self.num_folds
            )));
        }
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be positive".into()));
        }
        if self.kdn == 0 {
            return Err(ConfigError::Invalid("kdn must be positive".into()));
        }
        if self.k_competence == 0 {
            return Err(ConfigError::Invalid("k_competence must be positive".into()));
        }
        for (name, value) in [
            ("strategy_percentage", self.strategy_percentage),
            ("bagging_percentage", self.bagging_percentage),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie in (0, 1), got {value}"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.hardness_threshold) {
            return Err(ConfigError::Invalid(format!(
                "hardness_threshold must lie in [0, 1], got {}",
                self.hardness_threshold
            )));
        }
        if self.buckets.is_empty() {
            return Err(ConfigError::Invalid("at least one bucket is required".into()));
        }
        if self.strategies.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one strategy is required".into(),
            ));
        }
        if let Some(dup) = first_duplicate(self.buckets.iter().map(|b| b.name.as_str())) {
            return Err(ConfigError::Invalid(format!("duplicate bucket '{dup}'")));
        }
        if let Some(dup) = first_duplicate(self.strategies.iter().map(|s| s.name.as_str())) {
            return Err(ConfigError::Invalid(format!("duplicate strategy '{dup}'")));
        }
        if self
            .strategies
            .iter()
            .any(|s| s.name == crate::predictions::GOLD_LABELS_KEY)
        {
            return Err(ConfigError::Invalid(format!(
                "'{}' is reserved and cannot name a strategy",
                crate::predictions::GOLD_LABELS_KEY
            )));
        }
        Ok(())
    }

    /// Deterministic hash of the canonical JSON form.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).expect("ExperimentConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use deslab_core::HardnessPredicate;

    #[test]
    fn defaults_match_experiment_constants() {
        let c = ExperimentConfig::default();
        assert_eq!(c.num_folds, 10);
        assert_eq!(c.pool_size, 100);
        assert_eq!(c.kdn, 5);
        assert_eq!(c.k_competence, 7);
        assert_eq!(c.seed, 42);
        assert_eq!(c.datasets.names, vec!["cm1", "pc1"]);
        assert_eq!(c.datasets.label_column, "defects");
        assert_eq!(c.strategies.len(), 6);
        assert!(c.strategies.iter().all(|s| s.dfp));
        assert_eq!(
            c.buckets[1].predicate,
            HardnessPredicate::Above { threshold: 0.5 }
        );
        assert!(c.validate().is_ok());
    }

    #[test]
    fn threshold_builds_buckets_when_omitted() {
        let c = ExperimentConfig::from_toml("hardness_threshold = 0.3\n").unwrap();
        assert_eq!(c.hardness_threshold, 0.3);
        assert_eq!(c.buckets, default_validation_hardnesses(0.3));
        assert_eq!(
            c.buckets[1].predicate,
            HardnessPredicate::Above { threshold: 0.3 }
        );
        assert_eq!(
            c.buckets[2].predicate,
            HardnessPredicate::Below { threshold: 0.3 }
        );
    }

    #[test]
    fn explicit_buckets_win_over_threshold() {
        let text = r#"
hardness_threshold = 0.3

[[buckets]]
name = "VeryHard"
predicate = { type = "above", threshold = 0.8 }
"#;
        let c = ExperimentConfig::from_toml(text).unwrap();
        assert_eq!(c.buckets.len(), 1);
        assert_eq!(
            c.buckets[0].predicate,
            HardnessPredicate::Above { threshold: 0.8 }
        );
    }

    #[test]
    fn toml_roundtrip() {
        let c = ExperimentConfig::default();
        let text = c.to_toml().unwrap();
        let back = ExperimentConfig::from_toml(&text).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c = ExperimentConfig::from_toml("num_folds = 5\nseed = 7\n").unwrap();
        assert_eq!(c.num_folds, 5);
        assert_eq!(c.seed, 7);
        assert_eq!(c.pool_size, 100);
        assert_eq!(c.buckets.len(), 3);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(matches!(
            ExperimentConfig::from_toml("num_folds = 1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ExperimentConfig::from_toml("strategy_percentage = 1.5"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            ExperimentConfig::from_toml("kdn = \"five\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn reserved_and_duplicate_names_rejected() {
        let mut c = ExperimentConfig::default();
        c.strategies
            .push(StrategySpec::new("gold_labels", StrategyKind::Static, false));
        assert!(c.validate().is_err());

        let mut c = ExperimentConfig::default();
        c.buckets.push(c.buckets[0].clone());
        assert!(c.validate().is_err());
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = ExperimentConfig::default();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        b.seed = 43;
        assert_ne!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ExperimentConfig::from_file(Path::new("/nonexistent/deslab.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
