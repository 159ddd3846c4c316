//! CLI entry point for the listing preprocessing pipeline.

use anyhow::{Context, Result, anyhow};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use listing_prep::{
    CsvDirectorySource, ListingsTable, PartitionFormat, RunReport, Settings, TabularPreprocessor,
    TrainTestSplit, write_run_outputs,
};
use std::path::PathBuf;
use tracing::error;

/// CLI-compatible partition format enum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliFormat {
    /// Comma-separated values with a header row
    Csv,
    /// Apache Parquet
    Parquet,
}

impl From<CliFormat> for PartitionFormat {
    fn from(cli: CliFormat) -> Self {
        match cli {
            CliFormat::Csv => PartitionFormat::Csv,
            CliFormat::Parquet => PartitionFormat::Parquet,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Real-estate listing preprocessing pipeline",
    long_about = "Cleans, filters, encodes and splits raw real-estate listings.\n\n\
                  ENVIRONMENT VARIABLES:\n  \
                  LISTINGS_DATA_DIR    Directory holding data_main.csv / data_staging.csv\n\n\
                  EXAMPLES:\n  \
                  # Process the main table\n  \
                  listing-prep --data-dir data/\n\n  \
                  # Staging table, write partitions as parquet\n  \
                  listing-prep --data-dir data/ --staging -o out/ --format parquet\n\n  \
                  # Machine-readable summary\n  \
                  listing-prep --data-dir data/ --json | jq .rows_final"
)]
struct Args {
    /// Directory with one `<table>.csv` per listing table
    #[arg(short, long, env = "LISTINGS_DATA_DIR")]
    data_dir: PathBuf,

    /// Read `data_staging` instead of `data_main`
    #[arg(long)]
    staging: bool,

    /// JSON settings file with `features` and `pipeline` sections
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip type casting
    #[arg(long)]
    no_cast: bool,

    /// Skip standardization
    #[arg(long)]
    no_standardize: bool,

    /// Fill missing values and drop duplicates before filtering
    #[arg(long)]
    handle_missing: bool,

    /// Output directory for the train/test partitions
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File format of the written partitions
    #[arg(long, value_enum, default_value = "csv")]
    format: CliFormat,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all logs; only the final JSON report is printed.
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // .env must be loaded before clap reads LISTINGS_DATA_DIR
    dotenv().ok();

    let args = Args::parse();
    init_logging(&args.log_level, args.quiet, args.json);

    if !args.data_dir.is_dir() {
        return Err(anyhow!(
            "Data directory not found: {}",
            args.data_dir.display()
        ));
    }

    let settings = match &args.config {
        Some(path) => Settings::from_json_file(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?,
        None => Settings::default(),
    };

    let mut pipeline_config = settings.pipeline;
    if args.handle_missing {
        pipeline_config.handle_missing = true;
    }

    let table = ListingsTable::from_main_flag(!args.staging);
    // price columns mix numbers and free text far into the file
    let source = CsvDirectorySource::new(args.data_dir.clone()).infer_schema_length(None);
    let mut prep =
        TabularPreprocessor::from_source(&source, table, settings.features, pipeline_config)?;
    let rows_loaded = prep.get().height();

    if let Err(e) = prep.run_preprocessing_pipeline(!args.no_cast, !args.no_standardize) {
        error!("Pipeline failed: {}", e);
        return Err(anyhow!("Pipeline failed: {}", e));
    }

    let split = prep.train_test_split()?;

    let report = RunReport::new(table, rows_loaded, &prep, Some(&split));

    // files are written whether or not the summary goes to stdout as JSON
    let written = match &args.output {
        Some(dir) => write_run_outputs(&split, &report, dir, args.format.into())?,
        None => Vec::new(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_human_readable_summary(&report, &split, &written);
    Ok(())
}

/// Print a human-readable summary of the run.
///
/// Uses `println!` on purpose: this is the primary output and must show
/// regardless of the log level.
fn print_human_readable_summary(report: &RunReport, split: &TrainTestSplit, written: &[PathBuf]) {
    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!("Table: {}", report.table);
    println!("Target: {}", report.target);
    println!(
        "Rows: {} -> {} ({} removed)",
        report.rows_loaded,
        report.rows_final,
        report.rows_removed()
    );
    println!("Columns: {}", report.columns.join(", "));
    println!();

    println!("Steps:");
    for record in &report.steps {
        println!(
            "  - {:<36} {:>8} -> {:<8}",
            record.step.display_name(),
            record.rows_before,
            record.rows_after
        );
    }
    println!();

    if !report.scaling.is_empty() {
        println!("Scaling:");
        for params in &report.scaling {
            println!(
                "  - {:<20} mean={:<14.4} scale={:.4}",
                params.column, params.mean, params.scale
            );
        }
        println!();
    }

    println!(
        "Split: {} train / {} test rows",
        split.train_rows(),
        split.test_rows()
    );

    if !written.is_empty() {
        println!();
        println!("Output files:");
        for path in written {
            println!("  - {}", path.display());
        }
    }

    println!("{}", "=".repeat(80));
}
