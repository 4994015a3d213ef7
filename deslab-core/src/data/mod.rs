//! Dataset loading.

pub mod loader;

pub use loader::{
    dataset_path, load_dataset, parse_bool_label, DataError, LoadedDataset, DEFAULT_DATASETS,
    DEFAULT_LABEL_COLUMN,
};
