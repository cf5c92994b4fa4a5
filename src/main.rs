use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{info, LevelFilter};

use crime_normalize::batch::{aggregate_directory, aggregate_files, source_files, LogObserver};
use crime_normalize::config::{BatchOptions, YearWindow};
use crime_normalize::output::write_parquet;

/// Normalize wide-format crime-report CSV files into one long-format Parquet file.
#[derive(Debug, Parser)]
#[command(name = "crime-normalize", version, about)]
struct Cli {
    /// Input files, processed in the order given.
    #[arg(value_name = "FILE", conflicts_with = "input_dir")]
    inputs: Vec<PathBuf>,

    /// Process every matching file directly inside this directory, in file-name order.
    #[arg(long, value_name = "DIR")]
    input_dir: Option<PathBuf>,

    /// Filename glob for --input-dir [default: *.csv].
    #[arg(long, requires = "input_dir")]
    pattern: Option<String>,

    /// Output path; `.parquet` is appended when missing.
    #[arg(short, long)]
    output: PathBuf,

    /// JSON options file; command-line flags take precedence.
    #[arg(long, value_name = "JSON")]
    config: Option<PathBuf>,

    /// Keep the aggregate `index_total` offense type.
    #[arg(long)]
    keep_index_total: bool,

    /// Do not derive `clearance_ratio` from cleared-count columns.
    #[arg(long)]
    no_clearance: bool,

    /// Territory code to exclude (repeatable); replaces the default list.
    #[arg(long = "territory", value_name = "CODE")]
    territories: Vec<String>,

    /// First report year to include, from a `_YYYY` file name suffix.
    #[arg(long, requires = "to_year")]
    from_year: Option<i32>,

    /// Last report year to include, from a `_YYYY` file name suffix.
    #[arg(long, requires = "from_year")]
    to_year: Option<i32>,
}

fn init_logging() {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
    if env::var("RUST_LOG").is_err() {
        builder.filter_module("crime_normalize", LevelFilter::Info);
    }
    let _ = builder.format_timestamp_millis().try_init();
}

fn batch_options(cli: &Cli) -> Result<BatchOptions> {
    let mut options = match &cli.config {
        Some(path) => BatchOptions::from_json_path(path)
            .with_context(|| format!("Loading options from {path:?}"))?,
        None => BatchOptions::default(),
    };

    if let Some(pattern) = &cli.pattern {
        options.pattern = pattern.clone();
    }
    if cli.keep_index_total {
        options.normalize.exclude_index_total = false;
    }
    if cli.no_clearance {
        options.normalize.with_clearance = false;
    }
    if !cli.territories.is_empty() {
        options.normalize.territories = cli
            .territories
            .iter()
            .map(|t| t.trim().to_ascii_uppercase())
            .filter(|t| !t.is_empty())
            .collect();
    }
    if let (Some(from), Some(to)) = (cli.from_year, cli.to_year) {
        if from > to {
            bail!("--from-year {from} is after --to-year {to}");
        }
        options.years = Some(YearWindow { from, to });
    }
    options.observer = Some(Arc::new(LogObserver));
    Ok(options)
}

fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let options = batch_options(&cli)?;

    let combined = match (&cli.input_dir, cli.inputs.is_empty()) {
        (Some(dir), _) => aggregate_directory(dir, &options)
            .with_context(|| format!("Normalizing files in {dir:?}"))?,
        (None, false) => aggregate_files(&cli.inputs, &options).context("Normalizing input files")?,
        (None, true) => bail!("no input: pass FILE arguments or --input-dir"),
    };

    let written = write_parquet(&combined, &cli.output)
        .with_context(|| format!("Writing {:?}", cli.output))?;

    for (file_id, path) in source_files(&combined) {
        info!("file_id={file_id} source={}", path.display());
    }
    info!(
        "{} long-format rows written to {}",
        combined.row_count(),
        written.display()
    );
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
