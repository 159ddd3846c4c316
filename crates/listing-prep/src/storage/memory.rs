//! In-memory table source.

use super::TableSource;
use crate::error::{PreprocessingError, Result};
use polars::prelude::DataFrame;
use std::collections::HashMap;

/// Table source backed by frames held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    tables: HashMap<String, DataFrame>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a table.
    pub fn with_table(mut self, name: impl Into<String>, df: DataFrame) -> Self {
        self.tables.insert(name.into(), df);
        self
    }
}

impl TableSource for InMemorySource {
    fn fetch_table(&self, table: &str) -> Result<DataFrame> {
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| PreprocessingError::Storage {
                table: table.to_string(),
                reason: "no such table".to_string(),
            })
    }
}
