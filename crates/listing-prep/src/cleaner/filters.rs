//! Numeric domain filters on price, size and floor.
//!
//! Every filter keeps rows strictly below its threshold. A threshold that is
//! not positive (zero, negative or NaN) disables the filter.

use super::{FLOOR_COLUMN, PRICE_COLUMN, SIZE_COLUMN};
use crate::config::NonNumericFloor;
use crate::error::Result;
use crate::utils::{coerce_numeric_lenient, mask_from, require_column};
use polars::prelude::*;
use tracing::{debug, warn};

/// Only a positive threshold filters; NaN compares false and leaves rows alone.
#[inline]
fn is_active(threshold: f64) -> bool {
    threshold > 0.0
}

/// Row filters over the listing's numeric domain columns.
pub struct DomainFilter;

impl DomainFilter {
    /// Coerce `price` to `Float64`, drop rows that are not numeric, then apply
    /// the threshold.
    pub fn process_price(df: DataFrame, filter_price: f64) -> Result<DataFrame> {
        let prices = coerce_numeric_lenient(require_column(&df, PRICE_COLUMN)?)?;
        let invalid = prices.null_count();
        if invalid > 0 {
            debug!("Dropping {} rows with non-numeric {}", invalid, PRICE_COLUMN);
        }

        let mask = mask_from(
            (&prices)
                .into_iter()
                .map(|v| v.is_some_and(|p| !is_active(filter_price) || p < filter_price)),
        )?;

        let mut df = df;
        df.replace(PRICE_COLUMN, prices.into_series())?;
        let before = df.height();
        let df = df.filter(&mask)?;
        debug!(
            "{} filter ({}): {} -> {} rows",
            PRICE_COLUMN,
            filter_price,
            before,
            df.height()
        );
        Ok(df)
    }

    /// Keep rows with `size < filter_size`.
    ///
    /// Rows whose size is null or not a number fail the comparison and are
    /// dropped. The column itself is left as it is.
    pub fn process_size(df: DataFrame, filter_size: f64) -> Result<DataFrame> {
        if !is_active(filter_size) {
            return Ok(df);
        }

        let sizes = coerce_numeric_lenient(require_column(&df, SIZE_COLUMN)?)?;
        let mask = mask_from(sizes.into_iter().map(|v| v.is_some_and(|s| s < filter_size)))?;

        let before = df.height();
        let df = df.filter(&mask)?;
        debug!(
            "{} filter ({}): {} -> {} rows",
            SIZE_COLUMN,
            filter_size,
            before,
            df.height()
        );
        Ok(df)
    }

    /// Keep rows with `floor < filter_floor`.
    ///
    /// Floors are read as numbers whatever the column's dtype. Entries that are
    /// not numbers (the sentinel, free text, null) are handled by `policy`.
    pub fn process_floor(
        df: DataFrame,
        filter_floor: f64,
        policy: NonNumericFloor,
    ) -> Result<DataFrame> {
        if !is_active(filter_floor) {
            return Ok(df);
        }

        let floors = coerce_numeric_lenient(require_column(&df, FLOOR_COLUMN)?)?;
        let non_numeric = floors.null_count();
        if non_numeric > 0 {
            match policy {
                NonNumericFloor::Drop => warn!(
                    "Dropping {} rows whose {} is not numeric",
                    non_numeric, FLOOR_COLUMN
                ),
                NonNumericFloor::Keep => debug!(
                    "Keeping {} rows whose {} is not numeric",
                    non_numeric, FLOOR_COLUMN
                ),
            }
        }

        let mask = mask_from(floors.into_iter().map(|v| match v {
            Some(floor) => floor < filter_floor,
            None => policy == NonNumericFloor::Keep,
        }))?;

        let before = df.height();
        let df = df.filter(&mask)?;
        debug!(
            "{} filter ({}): {} -> {} rows",
            FLOOR_COLUMN,
            filter_floor,
            before,
            df.height()
        );
        Ok(df)
    }
}
