//! Domain types for DESLab

pub mod instance;
pub mod strategy;

pub use instance::{DomainError, InstanceSet, Label};
pub use strategy::StrategyKind;
