//! JSON archives for raw predictions and aggregated summaries.
//!
//! Both archives wrap their payload in an envelope carrying a schema version
//! and a UTC timestamp. Files are written to a `.tmp` sibling first and then
//! renamed into place.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::Summary;
use crate::predictions::PredictionStore;

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionArchive {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    /// Hash of the experiment config that produced the predictions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub predictions: PredictionStore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryArchive {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub summary: Summary,
}

pub fn save_predictions(path: &Path, store: &PredictionStore, run_id: Option<&str>) -> Result<()> {
    let archive = PredictionArchive {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        run_id: run_id.map(str::to_string),
        predictions: store.clone(),
    };
    let json = serde_json::to_string(&archive).context("Failed to serialize predictions")?;
    write_atomic(path, json.as_bytes())
}

pub fn load_predictions(path: &Path) -> Result<PredictionArchive> {
    let archive: PredictionArchive = read_json(path)?;
    check_version(path, archive.schema_version)?;
    Ok(archive)
}

pub fn save_summary(path: &Path, summary: &Summary) -> Result<()> {
    let archive = SummaryArchive {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        summary: summary.clone(),
    };
    let json = serde_json::to_string_pretty(&archive).context("Failed to serialize summary")?;
    write_atomic(path, json.as_bytes())
}

pub fn load_summary(path: &Path) -> Result<Summary> {
    let archive: SummaryArchive = read_json(path)?;
    check_version(path, archive.schema_version)?;
    Ok(archive.summary)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

fn check_version(path: &Path, found: u32) -> Result<()> {
    if found > SCHEMA_VERSION {
        bail!(
            "{} has schema version {found}, newer than supported version {SCHEMA_VERSION}",
            path.display()
        );
    }
    Ok(())
}

/// Write `bytes` to `path` via a temporary sibling and a rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
