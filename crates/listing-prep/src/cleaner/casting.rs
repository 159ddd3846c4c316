//! Type casting of feature columns.
//!
//! Numeric features become `Float64`, categorical features become the
//! categorical encoding. The same rules serve the owned dataset and any
//! frame cast at inference time.

use crate::config::FeatureConfig;
use crate::error::Result;
use crate::utils::{coerce_numeric_strict, require_column, to_categorical};
use polars::prelude::*;
use tracing::debug;

/// Casts feature columns to their declared types.
pub struct TypeCaster;

impl TypeCaster {
    /// Cast every feature column of `df` according to `features`.
    ///
    /// Fails with `TypeConversionFailed` when a numeric feature holds a value
    /// that is not a number, and with `ColumnNotFound` when a feature column
    /// is absent. Casting an already-cast frame leaves it unchanged.
    pub fn cast_types(df: DataFrame, features: &FeatureConfig) -> Result<DataFrame> {
        let mut df = df;

        for col_name in &features.numeric_features {
            let converted = coerce_numeric_strict(require_column(&df, col_name)?)?;
            df.replace(col_name, converted)?;
            debug!("Cast '{}' to Float64", col_name);
        }

        for col_name in &features.categorical_features {
            let encoded = to_categorical(require_column(&df, col_name)?)?;
            df.replace(col_name, encoded)?;
            debug!("Cast '{}' to Categorical", col_name);
        }

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::is_categorical_dtype;

    fn features() -> FeatureConfig {
        FeatureConfig::builder()
            .numeric_features(["size", "rooms"])
            .categorical_features(["status", "year_built"])
            .target_column("price")
            .build()
            .unwrap()
    }

    fn dtypes(df: &DataFrame) -> Vec<DataType> {
        df.get_columns().iter().map(|c| c.dtype().clone()).collect()
    }

    #[test]
    fn test_cast_types() {
        let df = df!(
            "size" => ["40.5", "60"],
            "rooms" => [2i64, 3],
            "status" => ["new", "used"],
            "year_built" => [1990i64, 2005],
            "price" => [1.0, 2.0]
        )
        .unwrap();

        let cast = TypeCaster::cast_types(df, &features()).unwrap();
        assert_eq!(cast.column("size").unwrap().dtype(), &DataType::Float64);
        assert_eq!(cast.column("rooms").unwrap().dtype(), &DataType::Float64);
        assert!(is_categorical_dtype(cast.column("status").unwrap().dtype()));
        assert!(is_categorical_dtype(cast.column("year_built").unwrap().dtype()));
        // Non-feature columns untouched
        assert_eq!(cast.column("price").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_cast_types_is_idempotent() {
        let df = df!(
            "size" => [40.0, 60.0],
            "rooms" => [2i64, 3],
            "status" => ["new", "used"],
            "year_built" => ["1990", "brak informacji"]
        )
        .unwrap();

        let once = TypeCaster::cast_types(df, &features()).unwrap();
        let twice = TypeCaster::cast_types(once.clone(), &features()).unwrap();
        assert_eq!(dtypes(&once), dtypes(&twice));
    }

    #[test]
    fn test_cast_types_rejects_text_in_numeric_feature() {
        let df = df!(
            "size" => ["40", "brak informacji"],
            "rooms" => [2i64, 3],
            "status" => ["new", "used"],
            "year_built" => [1990i64, 2005]
        )
        .unwrap();

        let err = TypeCaster::cast_types(df, &features()).unwrap_err();
        assert_eq!(err.error_code(), "TYPE_CONVERSION_FAILED");
    }

    #[test]
    fn test_cast_types_missing_column() {
        let df = df!("size" => [1.0]).unwrap();
        let err = TypeCaster::cast_types(df, &features()).unwrap_err();
        assert_eq!(err.error_code(), "COLUMN_NOT_FOUND");
    }
}
