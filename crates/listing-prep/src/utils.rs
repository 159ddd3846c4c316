//! Shared utilities for the listing preprocessing pipeline.
//!
//! This module contains the coercion helpers used by the cleaning, filtering,
//! casting and scaling steps so that all of them read values the same way.

use crate::error::{PreprocessingError, Result};
use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType can be cast straight to `Float64` without parsing.
///
/// Covers every numeric dtype (decimals and 128-bit integers included),
/// booleans, and the all-null `Null` dtype.
#[inline]
pub fn is_float_castable(dtype: &DataType) -> bool {
    dtype.is_primitive_numeric()
        || dtype.is_decimal()
        || matches!(dtype, DataType::Boolean | DataType::Null)
}

/// Check if a DataType is the categorical encoding.
#[inline]
pub fn is_categorical_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Categorical(_, _))
}

/// The categorical dtype produced by [`to_categorical`].
pub fn categorical_dtype() -> DataType {
    DataType::from_categories(Categories::global())
}

// =============================================================================
// Column Access
// =============================================================================

/// Look up a column, mapping a miss to [`PreprocessingError::ColumnNotFound`].
pub fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series> {
    df.column(name)
        .map(|col| col.as_materialized_series())
        .map_err(|_| PreprocessingError::ColumnNotFound(name.to_string()))
}

/// Check whether the frame has a column with this name.
#[inline]
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.column(name).is_ok()
}

/// Column names of a frame as owned strings.
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .into_iter()
        .map(|s| s.to_string())
        .collect()
}

// =============================================================================
// Numeric Coercion
// =============================================================================

/// Parse a single value as a number.
///
/// Surrounding whitespace is ignored. Empty strings, free text and `NaN`
/// are not numbers.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// Read a series as `Float64`, turning anything that is not a number into null.
///
/// Numeric, boolean and all-null columns are cast directly (NaN becomes null), string
/// columns are parsed value by value, and every other dtype (categorical
/// included) is rendered to strings first.
pub fn coerce_numeric_lenient(series: &Series) -> PolarsResult<Float64Chunked> {
    let dtype = series.dtype();

    if is_float_castable(dtype) {
        let cast = series.cast(&DataType::Float64)?;
        let values: Float64Chunked = cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect();
        return Ok(values.with_name(series.name().clone()));
    }

    let as_str = if dtype == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };

    let values: Float64Chunked = as_str
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_number))
        .collect();
    Ok(values.with_name(series.name().clone()))
}

/// Convert a series to `Float64`, failing on the first value that is present
/// but cannot be read as a number.
///
/// Nulls stay null.
pub fn coerce_numeric_strict(series: &Series) -> Result<Series> {
    let name = series.name().to_string();
    let dtype = series.dtype();

    if is_float_castable(dtype) {
        return Ok(series.cast(&DataType::Float64)?);
    }

    if !(dtype == &DataType::String || is_categorical_dtype(dtype)) {
        return Err(PreprocessingError::not_numeric(
            name,
            format!("unsupported source type {:?}", dtype),
        ));
    }

    let as_str = series.cast(&DataType::String)?;
    let str_values = as_str.str()?;
    let mut result = Vec::with_capacity(str_values.len());

    for opt_val in str_values.into_iter() {
        match opt_val {
            Some(val) => match val.trim().parse::<f64>() {
                Ok(num) => result.push(Some(num)),
                Err(_) => {
                    return Err(PreprocessingError::not_numeric(
                        name,
                        format!("could not convert '{}' to float", val),
                    ));
                }
            },
            None => result.push(None),
        }
    }

    Ok(Series::new(series.name().clone(), result))
}

// =============================================================================
// Categorical Coercion
// =============================================================================

/// Convert a series to the categorical encoding.
///
/// Already-categorical series are returned unchanged; non-string series are
/// rendered to strings before encoding.
pub fn to_categorical(series: &Series) -> PolarsResult<Series> {
    if is_categorical_dtype(series.dtype()) {
        return Ok(series.clone());
    }

    let as_str = if series.dtype() == &DataType::String {
        series.clone()
    } else {
        series.cast(&DataType::String)?
    };

    as_str.cast(&categorical_dtype())
}

// =============================================================================
// Row Masks
// =============================================================================

/// Build a filter mask of the given length from a predicate over row values.
pub fn mask_from<I>(values: I) -> PolarsResult<BooleanChunked>
where
    I: IntoIterator<Item = bool>,
{
    let flags: Vec<bool> = values.into_iter().collect();
    let series = Series::new("mask".into(), flags);
    Ok(series.bool()?.clone())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("  250000.5 "), Some(250000.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("brak informacji"), None);
    }

    #[test]
    fn test_coerce_numeric_lenient_strings() {
        let series = Series::new("price".into(), &[Some("100000"), Some("abc"), None]);
        let values = coerce_numeric_lenient(&series).unwrap();
        let collected: Vec<Option<f64>> = values.into_iter().collect();
        assert_eq!(collected, vec![Some(100000.0), None, None]);
    }

    #[test]
    fn test_coerce_numeric_lenient_nan_is_null() {
        let series = Series::new("size".into(), &[1.0, f64::NAN]);
        let values = coerce_numeric_lenient(&series).unwrap();
        let collected: Vec<Option<f64>> = values.into_iter().collect();
        assert_eq!(collected, vec![Some(1.0), None]);
    }

    #[test]
    fn test_coerce_numeric_strict_rejects_text() {
        let series = Series::new("rooms".into(), &["2", "three"]);
        let err = coerce_numeric_strict(&series).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
        assert!(err.to_string().contains("three"));
    }

    #[test]
    fn test_coerce_numeric_strict_keeps_nulls() {
        let series = Series::new("rooms".into(), &[Some("2"), None]);
        let converted = coerce_numeric_strict(&series).unwrap();
        assert_eq!(converted.dtype(), &DataType::Float64);
        assert_eq!(converted.null_count(), 1);
    }

    #[test]
    fn test_coerce_numeric_strict_all_null_column() {
        let series = Series::full_null("rooms".into(), 3, &DataType::Null);
        let converted = coerce_numeric_strict(&series).unwrap();
        assert_eq!(converted.dtype(), &DataType::Float64);
        assert_eq!(converted.null_count(), 3);
    }

    #[test]
    fn test_is_float_castable() {
        assert!(is_float_castable(&DataType::Int32));
        assert!(is_float_castable(&DataType::Boolean));
        assert!(is_float_castable(&DataType::Null));
        assert!(!is_float_castable(&DataType::String));
    }

    #[test]
    fn test_to_categorical_from_integers() {
        let series = Series::new("year_built".into(), &[1990i64, 2005, 1990]);
        let encoded = to_categorical(&series).unwrap();
        assert!(is_categorical_dtype(encoded.dtype()));
        assert_eq!(encoded.n_unique().unwrap(), 2);
    }

    #[test]
    fn test_to_categorical_is_idempotent() {
        let series = Series::new("status".into(), &["new", "used"]);
        let once = to_categorical(&series).unwrap();
        let twice = to_categorical(&once).unwrap();
        assert_eq!(once.dtype(), twice.dtype());
    }

    #[test]
    fn test_require_column_missing() {
        let df = df!("a" => [1, 2]).unwrap();
        assert!(require_column(&df, "a").is_ok());
        assert!(matches!(
            require_column(&df, "b").unwrap_err(),
            PreprocessingError::ColumnNotFound(name) if name == "b"
        ));
    }
}
