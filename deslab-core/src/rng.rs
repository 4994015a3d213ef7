//! Deterministic RNG hierarchy.
//!
//! A master seed generates sub-seeds for each `(dataset, fold, stream)` tuple.
//! Sub-seeds are derived by BLAKE3 hashing, so they do not depend on the
//! order in which datasets or folds are visited.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Named random streams used by an experiment run.
pub mod streams {
    pub const FOLDS: &str = "folds";
    pub const SPLIT: &str = "split";
    pub const POOL: &str = "pool";
}

/// Deterministic RNG hierarchy.
#[derive(Debug, Clone)]
pub struct RngHierarchy {
    master_seed: u64,
}

impl RngHierarchy {
    pub fn new(master_seed: u64) -> Self {
        Self { master_seed }
    }

    /// Derive a sub-seed for `(dataset, fold, stream)`.
    ///
    /// Dataset-level streams (fold assignment) use `fold = 0`.
    pub fn sub_seed(&self, dataset: &str, fold: usize, stream: &str) -> u64 {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.master_seed.to_le_bytes());
        // Length prefixes keep ("ab", "c") distinct from ("a", "bc").
        hasher.update(&(dataset.len() as u64).to_le_bytes());
        hasher.update(dataset.as_bytes());
        hasher.update(&(fold as u64).to_le_bytes());
        hasher.update(&(stream.len() as u64).to_le_bytes());
        hasher.update(stream.as_bytes());
        let hash = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Seeded `StdRng` for `(dataset, fold, stream)`.
    pub fn rng_for(&self, dataset: &str, fold: usize, stream: &str) -> StdRng {
        StdRng::seed_from_u64(self.sub_seed(dataset, fold, stream))
    }
}
