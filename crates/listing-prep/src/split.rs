//! Deterministic train/test partitioning.
//!
//! Rows are permuted with a seeded `StdRng`; the first `ceil(n * test_size)`
//! permuted rows form the holdout and the rest the training set, so the same
//! input and seed always give the same partition.

use crate::config::FeatureConfig;
use crate::error::{PreprocessingError, Result};
use crate::scaling::StandardScaler;
use crate::utils::{column_names, require_column};
use polars::prelude::*;
use rand::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Features and target for both partitions.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: DataFrame,
    pub x_test: DataFrame,
    pub y_train: Series,
    pub y_test: Series,
    /// Scaler that produced the numeric features, when scaling ran.
    pub scaler: Option<StandardScaler>,
}

impl TrainTestSplit {
    pub fn train_rows(&self) -> usize {
        self.x_train.height()
    }

    pub fn test_rows(&self) -> usize {
        self.x_test.height()
    }
}

/// Row indices `(train, test)` for a frame of `n_rows`.
pub fn split_indices(
    n_rows: usize,
    test_size: f64,
    seed: u64,
) -> Result<(Vec<IdxSize>, Vec<IdxSize>)> {
    let n_test = (n_rows as f64 * test_size).ceil() as usize;
    let n_train = n_rows.saturating_sub(n_test);

    if n_test == 0 || n_train == 0 {
        return Err(PreprocessingError::InvalidSplit {
            rows: n_rows,
            reason: format!(
                "test_size {} leaves {} train and {} test rows",
                test_size, n_train, n_test
            ),
        });
    }

    let mut indices: Vec<IdxSize> = (0..n_rows as IdxSize).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(n_test);
    Ok((train, indices))
}

/// Fail unless the frame's columns are exactly the features plus the target.
pub fn ensure_model_columns(df: &DataFrame, features: &FeatureConfig) -> Result<()> {
    let expected: HashSet<String> = features.model_columns().into_iter().collect();
    let actual = column_names(df);
    let actual_set: HashSet<String> = actual.iter().cloned().collect();

    if actual.len() != expected.len() || actual_set != expected {
        return Err(PreprocessingError::PreconditionViolated(format!(
            "expected columns {:?} (run select_features first), found {:?}",
            features.model_columns(),
            actual
        )));
    }
    Ok(())
}

/// Split a feature-selected frame into train/test features and targets.
pub fn train_test_split(
    df: &DataFrame,
    features: &FeatureConfig,
    test_size: f64,
    seed: u64,
) -> Result<TrainTestSplit> {
    ensure_model_columns(df, features)?;

    let (train_idx, test_idx) = split_indices(df.height(), test_size, seed)?;
    debug!(
        "Split {} rows into {} train / {} test (seed {})",
        df.height(),
        train_idx.len(),
        test_idx.len(),
        seed
    );

    let train = df.take(&IdxCa::from_vec("idx".into(), train_idx))?;
    let test = df.take(&IdxCa::from_vec("idx".into(), test_idx))?;

    let feature_cols: Vec<PlSmallStr> = features
        .feature_columns()
        .iter()
        .map(|s| s.as_str().into())
        .collect();

    Ok(TrainTestSplit {
        x_train: train.select(feature_cols.clone())?,
        x_test: test.select(feature_cols)?,
        y_train: require_column(&train, &features.target_column)?.clone(),
        y_test: require_column(&test, &features.target_column)?.clone(),
        scaler: None,
    })
}
