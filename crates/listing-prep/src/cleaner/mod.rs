//! Data cleaning module for listing tables.
//!
//! This module provides functionality for:
//! - Filling missing categorical-like values with a sentinel
//! - Removing duplicate rows
//! - Dropping rows without a price or size
//! - Numeric domain filters on price, size and floor
//! - Type casting of feature columns

mod casting;
mod filters;

pub use casting::TypeCaster;
pub use filters::DomainFilter;

use crate::error::Result;
use crate::utils::{has_column, is_numeric_dtype, require_column};
use polars::prelude::*;
use tracing::{debug, info};

/// Listing price, also the default target.
pub const PRICE_COLUMN: &str = "price";

/// Usable area of the listing.
pub const SIZE_COLUMN: &str = "size";

/// Floor the listing is on.
pub const FLOOR_COLUMN: &str = "floor";

/// Number of rooms.
pub const ROOMS_COLUMN: &str = "rooms";

/// Columns whose missing values are replaced with the sentinel.
pub const SENTINEL_COLUMNS: [&str; 5] = [
    FLOOR_COLUMN,
    "status",
    "property_type",
    "year_built",
    "property_condition",
];

/// Data cleaner for missing and duplicated listing rows.
#[derive(Debug, Clone)]
pub struct DataCleaner {
    sentinel: String,
    rooms_default: i64,
}

impl DataCleaner {
    pub fn new(sentinel: impl Into<String>, rooms_default: i64) -> Self {
        Self {
            sentinel: sentinel.into(),
            rooms_default,
        }
    }

    /// Fill, deduplicate and drop incomplete rows.
    ///
    /// This includes:
    /// 1. Filling the sentinel columns and `rooms`
    /// 2. Removing exact duplicate rows (first occurrence kept)
    /// 3. Removing rows with a null `price` or `size`
    ///
    /// Fill columns that are absent from the table are skipped.
    pub fn handle_missing_and_duplicates(&self, df: DataFrame) -> Result<DataFrame> {
        require_column(&df, PRICE_COLUMN)?;
        require_column(&df, SIZE_COLUMN)?;

        let mut df = df;

        // 1. Fill missing values
        for col_name in SENTINEL_COLUMNS {
            if !has_column(&df, col_name) {
                debug!("Column '{}' absent, nothing to fill", col_name);
                continue;
            }
            let series = require_column(&df, col_name)?;
            let missing = series.null_count();
            if missing == 0 {
                continue;
            }
            let filled = fill_with_text(series, &self.sentinel)?;
            df.replace(col_name, filled)?;
            debug!(
                "Filled {} missing values in '{}' with '{}'",
                missing, col_name, self.sentinel
            );
        }

        if has_column(&df, ROOMS_COLUMN) {
            let series = require_column(&df, ROOMS_COLUMN)?;
            let missing = series.null_count();
            if missing > 0 {
                let filled = fill_rooms(series, self.rooms_default)?;
                df.replace(ROOMS_COLUMN, filled)?;
                debug!(
                    "Filled {} missing values in '{}' with {}",
                    missing, ROOMS_COLUMN, self.rooms_default
                );
            }
        }

        // 2. Remove duplicate rows
        let before_duplicates = df.height();
        df = df
            .lazy()
            .unique_stable(None, UniqueKeepStrategy::First)
            .collect()?;
        let duplicates_removed = before_duplicates - df.height();
        debug!("Removed {} duplicate rows", duplicates_removed);

        // 3. Remove rows without price or size
        let before_incomplete = df.height();
        df = df
            .lazy()
            .filter(
                col(PRICE_COLUMN)
                    .is_not_null()
                    .and(col(SIZE_COLUMN).is_not_null()),
            )
            .collect()?;
        let incomplete_removed = before_incomplete - df.height();
        debug!(
            "Removed {} rows with missing {} or {}",
            incomplete_removed, PRICE_COLUMN, SIZE_COLUMN
        );

        info!(
            "Missing/duplicate cleanup: {} duplicates and {} incomplete rows removed",
            duplicates_removed, incomplete_removed
        );

        Ok(df)
    }
}

/// Replace nulls with a text value, rendering the column as strings.
fn fill_with_text(series: &Series, fill_value: &str) -> Result<Series> {
    let as_str = series.cast(&DataType::String)?;
    let filled: Vec<Option<String>> = as_str
        .str()?
        .into_iter()
        .map(|v| Some(v.unwrap_or(fill_value).to_string()))
        .collect();
    Ok(Series::new(series.name().clone(), filled))
}

/// Replace nulls in `rooms`, keeping the column numeric when it already is.
fn fill_rooms(series: &Series, default: i64) -> Result<Series> {
    let dtype = series.dtype();

    if matches!(dtype, DataType::Float32 | DataType::Float64) {
        let cast = series.cast(&DataType::Float64)?;
        let filled: Vec<f64> = cast
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(default as f64))
            .collect();
        return Ok(Series::new(series.name().clone(), filled));
    }

    if is_numeric_dtype(dtype) {
        let cast = series.cast(&DataType::Int64)?;
        let filled: Vec<i64> = cast
            .i64()?
            .into_iter()
            .map(|v| v.unwrap_or(default))
            .collect();
        return Ok(Series::new(series.name().clone(), filled));
    }

    fill_with_text(series, &default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SENTINEL;
    use pretty_assertions::assert_eq;

    fn cleaner() -> DataCleaner {
        DataCleaner::new(DEFAULT_SENTINEL, 1)
    }

    #[test]
    fn test_fills_sentinel_and_rooms() {
        let df = df!(
            "price" => [100.0, 200.0],
            "size" => [40.0, 50.0],
            "status" => [Some("new"), None],
            "rooms" => [None, Some(3i64)]
        )
        .unwrap();

        let cleaned = cleaner().handle_missing_and_duplicates(df).unwrap();

        let status: Vec<Option<&str>> = cleaned
            .column("status")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(status, vec![Some("new"), Some(DEFAULT_SENTINEL)]);

        let rooms: Vec<Option<i64>> = cleaned
            .column("rooms")
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(rooms, vec![Some(1), Some(3)]);
    }

    #[test]
    fn test_float_rooms_stay_float() {
        let df = df!(
            "price" => [100.0, 200.0],
            "size" => [40.0, 50.0],
            "rooms" => [Some(2.0), None]
        )
        .unwrap();

        let cleaned = cleaner().handle_missing_and_duplicates(df).unwrap();
        let rooms = cleaned.column("rooms").unwrap();
        assert_eq!(rooms.dtype(), &DataType::Float64);
        assert_eq!(rooms.null_count(), 0);
    }

    #[test]
    fn test_numeric_floor_becomes_text_when_filled() {
        let df = df!(
            "price" => [100.0, 200.0],
            "size" => [40.0, 50.0],
            "floor" => [Some(3i64), None]
        )
        .unwrap();

        let cleaned = cleaner().handle_missing_and_duplicates(df).unwrap();
        let floor: Vec<Option<&str>> = cleaned
            .column("floor")
            .unwrap()
            .as_materialized_series()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(floor, vec![Some("3"), Some(DEFAULT_SENTINEL)]);
    }

    #[test]
    fn test_complete_columns_untouched() {
        let df = df!(
            "price" => [100.0, 200.0],
            "size" => [40.0, 50.0],
            "floor" => [1i64, 2]
        )
        .unwrap();

        let cleaned = cleaner().handle_missing_and_duplicates(df.clone()).unwrap();
        assert!(cleaned.equals(&df));
    }

    #[test]
    fn test_duplicates_removed_before_incomplete_rows() {
        let df = df!(
            "price" => [Some(100.0), Some(100.0), Some(300.0), None],
            "size" => [Some(40.0), Some(40.0), None, Some(60.0)],
            "status" => ["a", "a", "b", "c"]
        )
        .unwrap();

        let cleaned = cleaner().handle_missing_and_duplicates(df).unwrap();
        assert_eq!(cleaned.height(), 1);
        assert_eq!(cleaned.column("price").unwrap().null_count(), 0);
        assert_eq!(cleaned.column("size").unwrap().null_count(), 0);
    }

    #[test]
    fn test_missing_price_column() {
        let df = df!("size" => [1.0]).unwrap();
        let err = cleaner().handle_missing_and_duplicates(df).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
