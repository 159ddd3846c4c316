//! Table storage collaborators.
//!
//! The preprocessor never talks to a database directly. It is handed
//! something implementing [`TableSource`], asks it once for a whole table at
//! construction time and lets go of it afterwards.
//!
//! Two sources ship with the crate:
//!
//! - [`InMemorySource`] - frames registered by name, used by tests and callers
//!   that already hold the data.
//! - [`CsvDirectorySource`] - one `<table>.csv` file per table in a directory.

mod csv;
mod memory;

pub use csv::CsvDirectorySource;
pub use memory::InMemorySource;

use crate::error::Result;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// Something that can return a full table by name.
pub trait TableSource {
    /// Load every row of `table`.
    ///
    /// Failures are reported as [`crate::PreprocessingError::Storage`].
    fn fetch_table(&self, table: &str) -> Result<DataFrame>;
}

impl<T: TableSource + ?Sized> TableSource for &T {
    fn fetch_table(&self, table: &str) -> Result<DataFrame> {
        (**self).fetch_table(table)
    }
}

/// The two listing tables the pipeline reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ListingsTable {
    /// Curated listings.
    #[default]
    Main,
    /// Freshly scraped listings awaiting promotion.
    Staging,
}

impl ListingsTable {
    /// Pick a table from the "main" flag.
    pub fn from_main_flag(main: bool) -> Self {
        if main { Self::Main } else { Self::Staging }
    }

    /// Name of the table in storage.
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Main => "data_main",
            Self::Staging => "data_staging",
        }
    }
}

impl std::fmt::Display for ListingsTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table_name())
    }
}
