//! DESLab CLI — hardness scoring, validation selection and metrics reporting.
//!
//! Commands:
//! - `hardness` — score a dataset with kDN and report bucket counts
//! - `select` — write the validation subset a hardness bucket keeps
//! - `metrics` — aggregate a predictions archive into a summary and table
//! - `report` — print the flat table of a persisted summary
//! - `config` — emit the default experiment configuration

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use deslab_core::data::{load_dataset, DEFAULT_LABEL_COLUMN};
use deslab_core::hardness::{histogram, kdn_hardness};
use deslab_core::selection::{default_validation_hardnesses, filter_by_hardness};
use deslab_runner::{
    generate_metrics, load_predictions, load_summary, pandanize_summary, summarize_and_persist,
    ExperimentConfig,
};

#[derive(Parser)]
#[command(
    name = "deslab",
    about = "DESLab CLI — instance hardness and dynamic ensemble selection experiments"
)]
struct Cli {
    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every instance with kDN hardness and report bucket counts.
    Hardness {
        /// Dataset CSV file.
        #[arg(long)]
        dataset: PathBuf,

        /// Neighbours per instance.
        #[arg(long, default_value_t = 5)]
        k: usize,

        /// Name of the boolean label column.
        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,

        /// Hard/Easy threshold.
        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// Histogram bins over [0, 1].
        #[arg(long, default_value_t = 10)]
        bins: usize,

        /// Write per-instance scores (index, label, hardness) to this CSV.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Write the instances a hardness bucket keeps.
    Select {
        /// Dataset CSV file.
        #[arg(long)]
        dataset: PathBuf,

        /// Bucket name: None, Hard or Easy.
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value_t = 5)]
        k: usize,

        #[arg(long, default_value = DEFAULT_LABEL_COLUMN)]
        label_column: String,

        #[arg(long, default_value_t = 0.5)]
        threshold: f64,

        /// Output CSV.
        #[arg(long)]
        output: PathBuf,
    },
    /// Aggregate a predictions archive into a summary and the flat table.
    Metrics {
        /// Predictions archive (JSON).
        #[arg(long)]
        predictions: PathBuf,

        /// Where to write the summary JSON. Defaults to the config path.
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Directory for metrics_summary.csv/.parquet. Defaults to the config path.
        #[arg(long)]
        table_dir: Option<PathBuf>,

        /// Experiment config (TOML) supplying the default artifact paths.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the flat table of a persisted summary.
    Report {
        /// Summary JSON.
        #[arg(long)]
        summary: PathBuf,

        /// Also write the table as CSV.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Print (or write) the default experiment configuration as TOML.
    Config {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Hardness {
            dataset,
            k,
            label_column,
            threshold,
            bins,
            output,
        } => run_hardness(&dataset, k, &label_column, threshold, bins, output.as_deref()),
        Commands::Select {
            dataset,
            bucket,
            k,
            label_column,
            threshold,
            output,
        } => run_select(&dataset, &bucket, k, &label_column, threshold, &output),
        Commands::Metrics {
            predictions,
            summary,
            table_dir,
            config,
        } => run_metrics(&predictions, summary, table_dir, config.as_deref()),
        Commands::Report { summary, csv } => run_report(&summary, csv.as_deref()),
        Commands::Config { output } => run_config(output.as_deref()),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn run_hardness(
    dataset: &Path,
    k: usize,
    label_column: &str,
    threshold: f64,
    bins: usize,
    output: Option<&Path>,
) -> Result<()> {
    let ds = load_dataset(dataset, label_column)?;
    let scores = kdn_hardness(&ds.instances, k)?;
    info!(dataset = %ds.name, instances = scores.len(), k, "scored");

    println!(
        "{}: {} instances ({} dropped), k = {k}",
        ds.name,
        scores.len(),
        ds.dropped_rows
    );
    for bucket in default_validation_hardnesses(threshold) {
        let kept = filter_by_hardness(&scores, &bucket.predicate).len();
        println!("  {:<6} ({:>8}): {kept}", bucket.name, bucket.predicate.to_string());
    }

    println!("Histogram:");
    let counts = histogram(&scores, bins);
    for (i, count) in counts.iter().enumerate() {
        let lo = i as f64 / bins as f64;
        let hi = (i + 1) as f64 / bins as f64;
        println!("  [{lo:.2}, {hi:.2}{}  {count}", if i + 1 == bins { "]" } else { ")" });
    }

    if let Some(path) = output {
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(["index", "label", "hardness"])?;
        for (i, (&label, h)) in ds.instances.labels().iter().zip(&scores).enumerate() {
            writer.write_record([i.to_string(), label.to_string(), h.to_string()])?;
        }
        writer.flush()?;
        println!("Scores written to: {}", path.display());
    }
    Ok(())
}

fn run_select(
    dataset: &Path,
    bucket_name: &str,
    k: usize,
    label_column: &str,
    threshold: f64,
    output: &Path,
) -> Result<()> {
    let bucket = default_validation_hardnesses(threshold)
        .into_iter()
        .find(|b| b.name.eq_ignore_ascii_case(bucket_name))
        .ok_or_else(|| anyhow!("unknown bucket '{bucket_name}'. Valid: None, Hard, Easy"))?;

    let ds = load_dataset(dataset, label_column)?;
    let scores = kdn_hardness(&ds.instances, k)?;
    let indices = filter_by_hardness(&scores, &bucket.predicate);
    let selected = ds.instances.subset(&indices)?;
    debug!(bucket = %bucket.name, kept = selected.len(), "selected");

    let mut writer = csv::Writer::from_path(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    let mut header = ds.feature_names.clone();
    header.push(label_column.to_string());
    writer.write_record(&header)?;
    for (x, label) in selected.iter() {
        let mut record: Vec<String> = x.iter().map(f64::to_string).collect();
        record.push((label == 1).to_string());
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!(
        "{}: kept {} of {} instances in bucket {} -> {}",
        ds.name,
        selected.len(),
        ds.instances.len(),
        bucket.name,
        output.display()
    );
    Ok(())
}

fn run_metrics(
    predictions: &Path,
    summary: Option<PathBuf>,
    table_dir: Option<PathBuf>,
    config: Option<&Path>,
) -> Result<()> {
    let config = match config {
        Some(path) => ExperimentConfig::from_file(path)?,
        None => ExperimentConfig::default(),
    };
    let summary_path = summary.unwrap_or(config.paths.summary);
    let table_dir = table_dir.unwrap_or(config.paths.metrics_dir);

    let archive = load_predictions(predictions)?;
    info!(
        predictions = archive.predictions.n_predictions(),
        generated_at = %archive.generated_at,
        "loaded predictions"
    );

    let fold_metrics = generate_metrics(archive.predictions)?;
    let summary = summarize_and_persist(&fold_metrics, &summary_path)?;
    let table = pandanize_summary(&summary);
    let (csv_path, parquet_path) = table.save(&table_dir)?;

    print!("{table}");
    println!("Summary saved to: {}", summary_path.display());
    println!("Table saved to: {} and {}", csv_path.display(), parquet_path.display());
    Ok(())
}

fn run_report(summary: &Path, csv: Option<&Path>) -> Result<()> {
    let table = pandanize_summary(&load_summary(summary)?);
    if table.is_empty() {
        println!("Summary is empty: {}", summary.display());
        return Ok(());
    }
    print!("{table}");
    if let Some(path) = csv {
        std::fs::write(path, table.to_csv()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("CSV written to: {}", path.display());
    }
    Ok(())
}

fn run_config(output: Option<&Path>) -> Result<()> {
    let text = ExperimentConfig::default().to_toml()?;
    match output {
        Some(path) => {
            std::fs::write(path, &text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Default config written to: {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
