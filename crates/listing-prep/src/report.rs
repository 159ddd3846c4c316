//! Run reports and partition output.
//!
//! A [`RunReport`] summarises one pipeline run (row counts, applied steps,
//! fitted scaling) and serializes to JSON for the `--json` CLI flag or a
//! report file. [`write_partitions`] persists the four split partitions.

use crate::error::{Result, ResultExt};
use crate::config::ScalerFit;
use crate::pipeline::{StepRecord, TabularPreprocessor};
use crate::scaling::ColumnScaling;
use crate::split::TrainTestSplit;
use crate::storage::ListingsTable;
use crate::utils::column_names;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File format for written partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PartitionFormat {
    #[default]
    Csv,
    Parquet,
}

impl PartitionFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: String,
    pub table: String,
    pub target: String,
    pub scaler_fit: ScalerFit,
    pub rows_loaded: usize,
    pub rows_final: usize,
    pub columns: Vec<String>,
    pub train_rows: Option<usize>,
    pub test_rows: Option<usize>,
    pub steps: Vec<StepRecord>,
    /// Scaling parameters, empty when nothing was standardized.
    pub scaling: Vec<ColumnScaling>,
}

impl RunReport {
    /// Build a report from a finished preprocessor and, optionally, its split.
    pub fn new(
        table: ListingsTable,
        rows_loaded: usize,
        prep: &TabularPreprocessor,
        split: Option<&TrainTestSplit>,
    ) -> Self {
        let scaling = split
            .and_then(|s| s.scaler.as_ref())
            .or(prep.scaler())
            .map(|scaler| scaler.params().to_vec())
            .unwrap_or_default();

        Self {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            table: table.table_name().to_string(),
            target: prep.features().target_column.clone(),
            scaler_fit: prep.config().scaler_fit,
            rows_loaded,
            rows_final: prep.get().height(),
            columns: column_names(prep.get()),
            train_rows: split.map(TrainTestSplit::train_rows),
            test_rows: split.map(TrainTestSplit::test_rows),
            steps: prep.history().to_vec(),
            scaling,
        }
    }

    /// Rows removed between loading and the final dataset.
    pub fn rows_removed(&self) -> usize {
        self.rows_loaded.saturating_sub(self.rows_final)
    }

    /// Write the report as pretty JSON to `<dir>/<base_name>_report.json`.
    pub fn write_to_file(&self, dir: &Path, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;

        let report_path = dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

/// Write `x_train`, `x_test`, `y_train` and `y_test` into `dir`.
///
/// Returns the written paths in that order.
pub fn write_partitions(
    split: &TrainTestSplit,
    dir: &Path,
    format: PartitionFormat,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let mut frames = [
        ("x_train", split.x_train.clone()),
        ("x_test", split.x_test.clone()),
        ("y_train", split.y_train.clone().into_frame()),
        ("y_test", split.y_test.clone().into_frame()),
    ];

    let mut written = Vec::with_capacity(frames.len());
    for (name, df) in frames.iter_mut() {
        let path = dir.join(format!("{}.{}", name, format.extension()));
        let mut file = File::create(&path)?;
        match format {
            PartitionFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(df)
                    .context(format!("Writing {}", name))?;
            }
            PartitionFormat::Parquet => {
                ParquetWriter::new(&mut file)
                    .finish(df)
                    .map(|_| ())
                    .context(format!("Writing {}", name))?;
            }
        }
        info!("Wrote {} ({} rows) to {}", name, df.height(), path.display());
        written.push(path);
    }

    Ok(written)
}

/// Write the four partitions and the run report into `dir`.
///
/// Returns the written paths, the report last.
pub fn write_run_outputs(
    split: &TrainTestSplit,
    report: &RunReport,
    dir: &Path,
    format: PartitionFormat,
) -> Result<Vec<PathBuf>> {
    let mut written = write_partitions(split, dir, format)?;
    written.push(report.write_to_file(dir, &report.table)?);
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FeatureConfig, PipelineConfig};
    use polars::io::csv::read::CsvReadOptions;

    fn finished() -> TabularPreprocessor {
        let df = df!(
            "price" => [300000.0, 410000.0, 520000.0, 275000.0, 390000.0],
            "size" => [40.0, 52.0, 61.0, 35.0, 48.0],
            "rooms" => [2i64, 2, 3, 1, 2],
            "floor" => ["1", "3", "2", "4", "0"],
            "status" => ["ready", "new", "ready", "new", "ready"],
            "property_type" => ["flat", "flat", "house", "flat", "flat"],
            "year_built" => ["1999", "2010", "2004", "1985", "2021"],
            "property_condition" => ["good", "new", "good", "bad", "good"]
        )
        .unwrap();
        let mut prep =
            TabularPreprocessor::new(df, FeatureConfig::default(), PipelineConfig::default())
                .unwrap();
        prep.run_preprocessing_pipeline(true, true).unwrap();
        prep
    }

    #[test]
    fn test_report_summarises_run() {
        let prep = finished();
        let split = prep.train_test_split().unwrap();
        let report = RunReport::new(ListingsTable::Main, 5, &prep, Some(&split));

        assert_eq!(report.table, "data_main");
        assert_eq!(report.target, "price");
        assert_eq!(report.scaler_fit, ScalerFit::FullDataset);
        assert_eq!(report.rows_final, 5);
        assert_eq!(report.rows_removed(), 0);
        assert_eq!(report.train_rows, Some(4));
        assert_eq!(report.test_rows, Some(1));
        assert_eq!(report.scaling.len(), 2);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"select_features\""));
    }

    #[test]
    fn test_write_partitions_csv() {
        let prep = finished();
        let split = prep.train_test_split().unwrap();
        let dir = std::env::temp_dir().join(format!("listing_prep_parts_{}", std::process::id()));

        let paths = write_partitions(&split, &dir, PartitionFormat::Csv).unwrap();
        assert_eq!(paths.len(), 4);
        assert!(paths[0].ends_with("x_train.csv"));

        let y_test = CsvReadOptions::default()
            .with_has_header(true)
            .try_into_reader_with_file_path(Some(paths[3].clone()))
            .unwrap()
            .finish()
            .unwrap();
        assert_eq!(y_test.height(), 1);
        assert_eq!(column_names(&y_test), vec!["price".to_string()]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_run_outputs_include_report() {
        let prep = finished();
        let split = prep.train_test_split().unwrap();
        let report = RunReport::new(ListingsTable::Staging, 5, &prep, Some(&split));
        let dir = std::env::temp_dir().join(format!("listing_prep_run_{}", std::process::id()));

        let paths = write_run_outputs(&split, &report, &dir, PartitionFormat::Parquet).unwrap();
        assert_eq!(paths.len(), 5);
        assert!(paths[0].ends_with("x_train.parquet"));
        assert!(paths[4].ends_with("data_staging_report.json"));

        let saved: RunReport =
            serde_json::from_str(&fs::read_to_string(&paths[4]).unwrap()).unwrap();
        assert_eq!(saved.table, "data_staging");
        assert_eq!(saved.test_rows, Some(1));

        fs::remove_dir_all(&dir).ok();
    }
}
