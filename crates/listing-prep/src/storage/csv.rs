//! CSV directory table source.

use super::TableSource;
use crate::error::{PreprocessingError, Result};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Table source reading `<dir>/<table>.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirectorySource {
    dir: PathBuf,
    infer_schema_length: Option<usize>,
}

impl CsvDirectorySource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            infer_schema_length: Some(100),
        }
    }

    /// Number of rows used for schema inference (`None` scans the whole file).
    pub fn infer_schema_length(mut self, rows: Option<usize>) -> Self {
        self.infer_schema_length = rows;
        self
    }

    /// Path of the file backing `table`.
    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", table))
    }
}

impl TableSource for CsvDirectorySource {
    fn fetch_table(&self, table: &str) -> Result<DataFrame> {
        let path = self.table_path(table);
        let storage_err = |reason: String| PreprocessingError::Storage {
            table: table.to_string(),
            reason,
        };

        if !path.exists() {
            return Err(storage_err(format!("file not found: {}", path.display())));
        }

        debug!("Reading table '{}' from {}", table, path.display());

        let df = CsvReadOptions::default()
            .with_infer_schema_length(self.infer_schema_length)
            .with_has_header(true)
            .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
            .try_into_reader_with_file_path(Some(path))
            .map_err(|e| storage_err(e.to_string()))?
            .finish()
            .map_err(|e| storage_err(e.to_string()))?;

        debug!("Loaded '{}': {:?}", table, df.shape());
        Ok(df)
    }
}
