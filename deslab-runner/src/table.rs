//! Flat tabular view of a [`Summary`]: one row per (dataset, bucket, strategy).

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame, NamedFrom, ParquetWriter, PolarsResult, Series};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use deslab_core::MetricName;

use crate::aggregate::{StrategySummary, Summary};
use crate::persistence::write_atomic;

/// Column names, in order.
pub const COLUMNS: [&str; 11] = [
    "set",
    "hardness",
    "strategy",
    "mean_auc_roc",
    "std_auc_roc",
    "mean_acc",
    "std_acc",
    "mean_f1",
    "std_f1",
    "mean_g1",
    "std_g1",
];

pub const CSV_FILE: &str = "metrics_summary.csv";
pub const PARQUET_FILE: &str = "metrics_summary.parquet";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub set: String,
    pub hardness: String,
    pub strategy: String,
    pub mean_auc_roc: f64,
    pub std_auc_roc: f64,
    pub mean_acc: f64,
    pub std_acc: f64,
    pub mean_f1: f64,
    pub std_f1: f64,
    pub mean_g1: f64,
    pub std_g1: f64,
}

impl SummaryRow {
    fn from_metrics(set: &str, hardness: &str, strategy: &str, m: &StrategySummary) -> Self {
        let mean = |name: MetricName| m.get(&name).map_or(f64::NAN, |s| s.mean);
        let std = |name: MetricName| m.get(&name).map_or(f64::NAN, |s| s.std);
        Self {
            set: set.to_string(),
            hardness: hardness.to_string(),
            strategy: strategy.to_string(),
            mean_auc_roc: mean(MetricName::AucRoc),
            std_auc_roc: std(MetricName::AucRoc),
            mean_acc: mean(MetricName::Acc),
            std_acc: std(MetricName::Acc),
            mean_f1: mean(MetricName::F1),
            std_f1: std(MetricName::F1),
            mean_g1: mean(MetricName::G1),
            std_g1: std(MetricName::G1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

/// Flatten the nested summary. A metric missing from a strategy is NaN.
pub fn pandanize_summary(summary: &Summary) -> SummaryTable {
    let rows = summary
        .iter()
        .flat_map(|(set, buckets)| {
            buckets.iter().flat_map(move |(hardness, strategies)| {
                strategies
                    .iter()
                    .map(move |(strategy, m)| SummaryRow::from_metrics(set, hardness, strategy, m))
            })
        })
        .collect();
    SummaryTable { rows }
}

impl SummaryTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let text = |f: fn(&SummaryRow) -> &str| -> Vec<String> {
            self.rows.iter().map(|r| f(r).to_string()).collect()
        };
        let num = |f: fn(&SummaryRow) -> f64| -> Vec<f64> { self.rows.iter().map(f).collect() };

        let columns = vec![
            Column::Series(Series::new(COLUMNS[0].into(), text(|r| r.set.as_str())).into()),
            Column::Series(Series::new(COLUMNS[1].into(), text(|r| r.hardness.as_str())).into()),
            Column::Series(Series::new(COLUMNS[2].into(), text(|r| r.strategy.as_str())).into()),
            Column::Series(Series::new(COLUMNS[3].into(), num(|r| r.mean_auc_roc)).into()),
            Column::Series(Series::new(COLUMNS[4].into(), num(|r| r.std_auc_roc)).into()),
            Column::Series(Series::new(COLUMNS[5].into(), num(|r| r.mean_acc)).into()),
            Column::Series(Series::new(COLUMNS[6].into(), num(|r| r.std_acc)).into()),
            Column::Series(Series::new(COLUMNS[7].into(), num(|r| r.mean_f1)).into()),
            Column::Series(Series::new(COLUMNS[8].into(), num(|r| r.std_f1)).into()),
            Column::Series(Series::new(COLUMNS[9].into(), num(|r| r.mean_g1)).into()),
            Column::Series(Series::new(COLUMNS[10].into(), num(|r| r.std_g1)).into()),
        ];
        DataFrame::new(columns)
    }

    /// CSV text with a header row.
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        if self.rows.is_empty() {
            writer.write_record(COLUMNS)?;
        }
        for row in &self.rows {
            writer.serialize(row)?;
        }
        let bytes = writer.into_inner().context("Failed to flush CSV writer")?;
        String::from_utf8(bytes).context("CSV output is not UTF-8")
    }

    /// Write `metrics_summary.csv` and `metrics_summary.parquet` into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let csv_path = dir.join(CSV_FILE);
        write_atomic(&csv_path, self.to_csv()?.as_bytes())?;

        let parquet_path = dir.join(PARQUET_FILE);
        let mut df = self.to_dataframe().context("Failed to build summary dataframe")?;
        let mut file = File::create(&parquet_path)
            .with_context(|| format!("Failed to create {}", parquet_path.display()))?;
        ParquetWriter::new(&mut file)
            .finish(&mut df)
            .context("Failed to write summary parquet")?;

        Ok((csv_path, parquet_path))
    }
}

impl fmt::Display for SummaryTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = |pick: fn(&SummaryRow) -> &str, header: &str| {
            self.rows
                .iter()
                .map(|r| pick(r).len())
                .max()
                .unwrap_or(0)
                .max(header.len())
        };
        let w_set = width(|r| r.set.as_str(), COLUMNS[0]);
        let w_hard = width(|r| r.hardness.as_str(), COLUMNS[1]);
        let w_strat = width(|r| r.strategy.as_str(), COLUMNS[2]);

        write!(
            f,
            "{:<w_set$}  {:<w_hard$}  {:<w_strat$}",
            COLUMNS[0], COLUMNS[1], COLUMNS[2]
        )?;
        for col in &COLUMNS[3..] {
            write!(f, "  {col:>12}")?;
        }
        writeln!(f)?;

        for r in &self.rows {
            write!(
                f,
                "{:<w_set$}  {:<w_hard$}  {:<w_strat$}",
                r.set, r.hardness, r.strategy
            )?;
            for v in [
                r.mean_auc_roc,
                r.std_auc_roc,
                r.mean_acc,
                r.std_acc,
                r.mean_f1,
                r.std_f1,
                r.mean_g1,
                r.std_g1,
            ] {
                write!(f, "  {v:>12.4}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::MetricSummary;

    fn summary() -> Summary {
        let mut s = Summary::new();
        for (set, strategy, acc) in [("cm1", "F-KNU", 0.9), ("cm1", "F-OLA", 0.8), ("pc1", "F-KNU", 0.7)] {
            let per_metric = MetricName::ALL
                .into_iter()
                .map(|m| {
                    let mean = if m == MetricName::Acc { acc } else { 0.5 };
                    (m, MetricSummary { mean, std: 0.1 })
                })
                .collect();
            s.entry(set.into())
                .or_default()
                .entry("Hard".into())
                .or_default()
                .insert(strategy.into(), per_metric);
        }
        s
    }

    #[test]
    fn one_row_per_triple() {
        let table = pandanize_summary(&summary());
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].set, "cm1");
        assert_eq!(table.rows[1].strategy, "F-OLA");
        assert_eq!(table.rows[1].mean_acc, 0.8);
        assert_eq!(table.rows[2].set, "pc1");
    }

    #[test]
    fn dataframe_has_eleven_columns_in_order() {
        let df = pandanize_summary(&summary()).to_dataframe().unwrap();
        assert_eq!(df.width(), 11);
        assert_eq!(df.height(), 3);
        let names: Vec<String> = df.get_column_names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, COLUMNS.to_vec());
    }

    #[test]
    fn csv_header_matches_columns() {
        let csv = pandanize_summary(&summary()).to_csv().unwrap();
        let header = csv.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
        assert_eq!(csv.lines().count(), 4);

        let empty = SummaryTable::default().to_csv().unwrap();
        assert_eq!(empty.trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn missing_metric_is_nan() {
        let mut s = Summary::new();
        s.entry("cm1".into())
            .or_default()
            .entry("None".into())
            .or_default()
            .insert("F-KNU".into(), StrategySummary::new());
        let row = &pandanize_summary(&s).rows[0];
        assert!(row.mean_auc_roc.is_nan());
    }

    #[test]
    fn save_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let (csv_path, parquet_path) = pandanize_summary(&summary())
            .save(&dir.path().join("metrics"))
            .unwrap();
        assert!(csv_path.exists());
        assert!(parquet_path.exists());
    }

    #[test]
    fn display_lists_every_row() {
        let text = pandanize_summary(&summary()).to_string();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().next().unwrap().starts_with("set"));
        assert!(text.contains("0.9000"));
    }
}
