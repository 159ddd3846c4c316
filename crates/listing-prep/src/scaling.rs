//! Zero-mean / unit-variance scaling of numeric feature columns.
//!
//! Statistics use the population standard deviation. A constant column is
//! scaled by 1 so it maps to all zeros instead of NaN. Nulls are ignored
//! while fitting and stay null after transforming.

use crate::error::{PreprocessingError, Result};
use crate::utils::{coerce_numeric_strict, require_column};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted parameters for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScaling {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation, or 1.0 when the column is constant.
    pub scale: f64,
}

impl ColumnScaling {
    #[inline]
    fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// A fitted standard scaler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<ColumnScaling>,
}

impl StandardScaler {
    /// Fit per-column mean and scale on `columns` of `df`.
    pub fn fit(df: &DataFrame, columns: &[String]) -> Result<Self> {
        let mut fitted = Vec::with_capacity(columns.len());

        for col_name in columns {
            let values = coerce_numeric_strict(require_column(df, col_name)?)?;
            let present: Vec<f64> = values
                .f64()?
                .into_iter()
                .flatten()
                .filter(|v| !v.is_nan())
                .collect();

            if present.is_empty() {
                return Err(PreprocessingError::NoValidValues(col_name.clone()));
            }

            let n = present.len() as f64;
            let mean = present.iter().sum::<f64>() / n;
            let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            let std_dev = variance.sqrt();
            let scale = if std_dev == 0.0 { 1.0 } else { std_dev };

            debug!("Fitted '{}': mean={:.4}, scale={:.4}", col_name, mean, scale);
            fitted.push(ColumnScaling {
                column: col_name.clone(),
                mean,
                scale,
            });
        }

        Ok(Self { columns: fitted })
    }

    /// Overwrite the fitted columns of `df` with scaled `Float64` values.
    pub fn transform(&self, df: DataFrame) -> Result<DataFrame> {
        let mut df = df;

        for params in &self.columns {
            let values = coerce_numeric_strict(require_column(&df, &params.column)?)?;
            let scaled: Float64Chunked = values
                .f64()?
                .into_iter()
                .map(|v| v.map(|x| params.apply(x)))
                .collect();
            df.replace(
                &params.column,
                scaled.with_name(params.column.as_str().into()).into_series(),
            )?;
        }

        Ok(df)
    }

    /// Fit on `df` and transform the same frame.
    pub fn fit_transform(df: DataFrame, columns: &[String]) -> Result<(Self, DataFrame)> {
        let scaler = Self::fit(&df, columns)?;
        let df = scaler.transform(df)?;
        Ok((scaler, df))
    }

    /// Fitted parameters in column order.
    pub fn params(&self) -> &[ColumnScaling] {
        &self.columns
    }

    /// Fitted parameters for one column.
    pub fn get(&self, column: &str) -> Option<&ColumnScaling> {
        self.columns.iter().find(|p| p.column == column)
    }
}
