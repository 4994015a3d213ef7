//! CSV dataset loader.
//!
//! A dataset is a header-first CSV whose label column holds boolean strings
//! and whose remaining columns are numeric features. Rows with a missing
//! cell (empty or `?`) are dropped before parsing.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::{DomainError, InstanceSet, Label};

/// Datasets used when none are configured.
pub const DEFAULT_DATASETS: [&str; 2] = ["cm1", "pc1"];

/// Label column of the defect-prediction datasets.
pub const DEFAULT_LABEL_COLUMN: &str = "defects";

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("label column '{column}' not found")]
    MissingLabelColumn { column: String },

    #[error("not a valid boolean string: '{value}'")]
    InvalidBoolean { value: String },

    #[error("row {row}, column '{column}': cannot parse '{value}' as a number")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("{path} has no complete rows")]
    Empty { path: PathBuf },

    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
}

/// A parsed dataset with provenance.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub name: String,
    /// Header names of the feature columns, in order.
    pub feature_names: Vec<String>,
    pub instances: InstanceSet,
    /// BLAKE3 hex digest of the raw file bytes.
    pub dataset_hash: String,
    pub dropped_rows: usize,
}

/// Parse `true`/`false` in any case, optionally quoted or written as a
/// byte literal (`b'true'`).
pub fn parse_bool_label(raw: &str) -> Result<bool, DataError> {
    let mut s = raw.trim();
    if let Some(inner) = s.strip_prefix("b'").and_then(|r| r.strip_suffix('\'')) {
        s = inner;
    } else if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s = &s[1..s.len() - 1];
    }

    if s.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if s.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(DataError::InvalidBoolean {
            value: raw.to_string(),
        })
    }
}

/// `{data_dir}/{name}.csv`
pub fn dataset_path(data_dir: &Path, name: &str) -> PathBuf {
    data_dir.join(format!("{name}.csv"))
}

/// Load a dataset from a CSV file.
pub fn load_dataset(path: &Path, label_column: &str) -> Result<LoadedDataset, DataError> {
    let bytes = std::fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset_hash = blake3::hash(&bytes).to_hex().to_string();

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let headers = reader.headers()?.clone();
    let label_idx = headers
        .iter()
        .position(|h| h == label_column)
        .ok_or_else(|| DataError::MissingLabelColumn {
            column: label_column.to_string(),
        })?;

    let feature_names: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != label_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut features = Vec::new();
    let mut labels: Vec<Label> = Vec::new();
    let mut dropped_rows = 0;

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().any(|cell| cell.is_empty() || cell == "?") {
            dropped_rows += 1;
            continue;
        }

        let mut x = Vec::with_capacity(record.len().saturating_sub(1));
        for (col, cell) in record.iter().enumerate() {
            if col == label_idx {
                continue;
            }
            let value = cell.parse::<f64>().map_err(|_| DataError::InvalidNumber {
                row,
                column: headers.get(col).unwrap_or_default().to_string(),
                value: cell.to_string(),
            })?;
            x.push(value);
        }
        let label = record.get(label_idx).unwrap_or_default();
        labels.push(Label::from(parse_bool_label(label)?));
        features.push(x);
    }

    if labels.is_empty() {
        return Err(DataError::Empty {
            path: path.to_path_buf(),
        });
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(LoadedDataset {
        name,
        feature_names,
        instances: InstanceSet::new(features, labels)?,
        dataset_hash,
        dropped_rows,
    })
}
