//! Configuration types for the listing preprocessing pipeline.
//!
//! Two independent pieces of configuration are passed into the preprocessor:
//!
//! - [`FeatureConfig`] names the numeric features, categorical features and
//!   the target column.
//! - [`PipelineConfig`] holds filter thresholds, missing-value policy, scaling
//!   policy and split parameters.
//!
//! Both use the builder pattern and are serde (de)serializable so they can be
//! loaded from a JSON file through [`Settings`].

use crate::error::ResultExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Default placeholder written into categorical-like columns with missing values.
pub const DEFAULT_SENTINEL: &str = "brak informacji";

/// Default price threshold used by the full pipeline.
pub const DEFAULT_PRICE_FILTER: f64 = 17_500_000.0;

/// Default size threshold used by the full pipeline.
pub const DEFAULT_SIZE_FILTER: f64 = 1000.0;

/// Default floor threshold used by the full pipeline.
pub const DEFAULT_FLOOR_FILTER: f64 = 30.0;

/// How `process_floor` treats floor entries that are not numbers
/// (the sentinel, free text or null).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NonNumericFloor {
    /// Drop the row; it cannot be shown to satisfy the threshold.
    #[default]
    Drop,
    /// Keep the row; only numeric floors are compared.
    Keep,
}

/// Which rows the standard scaler is fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalerFit {
    /// Fit and transform the whole dataset before splitting.
    #[default]
    FullDataset,
    /// Defer scaling to the split: fit on the training rows, apply to both.
    TrainPartition,
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Target column must not be empty")]
    EmptyTarget,

    #[error("At least one feature column is required")]
    NoFeatures,

    #[error("Column '{0}' is listed more than once")]
    DuplicateColumn(String),

    #[error("Target column '{0}' is also listed as a feature")]
    TargetIsFeature(String),

    #[error("Invalid test size: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidTestSize(f64),

    #[error("Invalid threshold for '{field}': {value} (must be finite)")]
    InvalidThreshold { field: String, value: f64 },
}

// =============================================================================
// Feature roles
// =============================================================================

/// Column roles used by the model.
///
/// The feature columns are the numeric features followed by the categorical
/// features, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Columns coerced to `Float64` and standardized.
    pub numeric_features: Vec<String>,

    /// Columns coerced to a categorical encoding.
    pub categorical_features: Vec<String>,

    /// The column the model learns to predict.
    pub target_column: String,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            numeric_features: vec!["size".to_string(), "rooms".to_string()],
            categorical_features: [
                "floor",
                "status",
                "property_type",
                "year_built",
                "property_condition",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            target_column: "price".to_string(),
        }
    }
}

impl FeatureConfig {
    /// Create a new feature configuration builder.
    pub fn builder() -> FeatureConfigBuilder {
        FeatureConfigBuilder::default()
    }

    /// All feature columns: numeric first, then categorical.
    pub fn feature_columns(&self) -> Vec<String> {
        self.numeric_features
            .iter()
            .chain(self.categorical_features.iter())
            .cloned()
            .collect()
    }

    /// Feature columns followed by the target column.
    pub fn model_columns(&self) -> Vec<String> {
        let mut cols = self.feature_columns();
        cols.push(self.target_column.clone());
        cols
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigValidationError::EmptyTarget);
        }

        if self.numeric_features.is_empty() && self.categorical_features.is_empty() {
            return Err(ConfigValidationError::NoFeatures);
        }

        let mut seen = HashSet::new();
        for col in self.feature_columns() {
            if !seen.insert(col.clone()) {
                return Err(ConfigValidationError::DuplicateColumn(col));
            }
        }

        if seen.contains(&self.target_column) {
            return Err(ConfigValidationError::TargetIsFeature(
                self.target_column.clone(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`FeatureConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct FeatureConfigBuilder {
    numeric_features: Option<Vec<String>>,
    categorical_features: Option<Vec<String>>,
    target_column: Option<String>,
}

impl FeatureConfigBuilder {
    /// Set the numeric feature columns.
    pub fn numeric_features<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_features = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the categorical feature columns.
    pub fn categorical_features<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categorical_features = Some(cols.into_iter().map(Into::into).collect());
        self
    }

    /// Set the target column.
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Build the configuration, falling back to the listing defaults for
    /// anything not set.
    pub fn build(self) -> Result<FeatureConfig, ConfigValidationError> {
        let defaults = FeatureConfig::default();
        let config = FeatureConfig {
            numeric_features: self.numeric_features.unwrap_or(defaults.numeric_features),
            categorical_features: self
                .categorical_features
                .unwrap_or(defaults.categorical_features),
            target_column: self.target_column.unwrap_or(defaults.target_column),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Pipeline options
// =============================================================================

/// Options controlling the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] to override individual values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows with `price >= price_filter` are dropped. `<= 0` disables the filter.
    /// Default: 17 500 000
    pub price_filter: f64,

    /// Rows with `size >= size_filter` are dropped. `<= 0` disables the filter.
    /// Default: 1000
    pub size_filter: f64,

    /// Rows with `floor >= floor_filter` are dropped. `<= 0` disables the filter.
    /// Default: 30
    pub floor_filter: f64,

    /// Whether the full pipeline starts with missing/duplicate cleanup.
    /// Default: false
    pub handle_missing: bool,

    /// Placeholder for missing categorical-like values.
    /// Default: "brak informacji"
    pub sentinel: String,

    /// Fill value for missing `rooms`.
    /// Default: 1
    pub rooms_default: i64,

    /// Policy for floors that cannot be read as numbers.
    /// Default: Drop
    pub non_numeric_floor: NonNumericFloor,

    /// Rows the scaler is fitted on.
    /// Default: FullDataset
    pub scaler_fit: ScalerFit,

    /// Fraction of rows held out for testing.
    /// Default: 0.2
    pub test_size: f64,

    /// Seed for the split permutation.
    /// Default: 42
    pub random_seed: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            price_filter: DEFAULT_PRICE_FILTER,
            size_filter: DEFAULT_SIZE_FILTER,
            floor_filter: DEFAULT_FLOOR_FILTER,
            handle_missing: false,
            sentinel: DEFAULT_SENTINEL.to_string(),
            rooms_default: 1,
            non_numeric_floor: NonNumericFloor::default(),
            scaler_fit: ScalerFit::default(),
            test_size: 0.2,
            random_seed: 42,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        for (field, value) in [
            ("price_filter", self.price_filter),
            ("size_filter", self.size_filter),
            ("floor_filter", self.floor_filter),
        ] {
            if !value.is_finite() {
                return Err(ConfigValidationError::InvalidThreshold {
                    field: field.to_string(),
                    value,
                });
            }
        }

        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(ConfigValidationError::InvalidTestSize(self.test_size));
        }

        Ok(())
    }
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    price_filter: Option<f64>,
    size_filter: Option<f64>,
    floor_filter: Option<f64>,
    handle_missing: Option<bool>,
    sentinel: Option<String>,
    rooms_default: Option<i64>,
    non_numeric_floor: Option<NonNumericFloor>,
    scaler_fit: Option<ScalerFit>,
    test_size: Option<f64>,
    random_seed: Option<u64>,
}

impl PipelineConfigBuilder {
    /// Set the exclusive upper bound for `price` (`<= 0` disables it).
    pub fn price_filter(mut self, threshold: f64) -> Self {
        self.price_filter = Some(threshold);
        self
    }

    /// Set the exclusive upper bound for `size` (`<= 0` disables it).
    pub fn size_filter(mut self, threshold: f64) -> Self {
        self.size_filter = Some(threshold);
        self
    }

    /// Set the exclusive upper bound for `floor` (`<= 0` disables it).
    pub fn floor_filter(mut self, threshold: f64) -> Self {
        self.floor_filter = Some(threshold);
        self
    }

    /// Run missing/duplicate cleanup as the first pipeline step.
    pub fn handle_missing(mut self, enable: bool) -> Self {
        self.handle_missing = Some(enable);
        self
    }

    /// Set the placeholder used for missing categorical-like values.
    pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
        self.sentinel = Some(sentinel.into());
        self
    }

    /// Set the fill value for missing `rooms`.
    pub fn rooms_default(mut self, rooms: i64) -> Self {
        self.rooms_default = Some(rooms);
        self
    }

    /// Set the policy for non-numeric floors.
    pub fn non_numeric_floor(mut self, policy: NonNumericFloor) -> Self {
        self.non_numeric_floor = Some(policy);
        self
    }

    /// Set which rows the scaler is fitted on.
    pub fn scaler_fit(mut self, fit: ScalerFit) -> Self {
        self.scaler_fit = Some(fit);
        self
    }

    /// Set the holdout fraction.
    pub fn test_size(mut self, fraction: f64) -> Self {
        self.test_size = Some(fraction);
        self
    }

    /// Set the split seed.
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let config = PipelineConfig {
            price_filter: self.price_filter.unwrap_or(DEFAULT_PRICE_FILTER),
            size_filter: self.size_filter.unwrap_or(DEFAULT_SIZE_FILTER),
            floor_filter: self.floor_filter.unwrap_or(DEFAULT_FLOOR_FILTER),
            handle_missing: self.handle_missing.unwrap_or(false),
            sentinel: self
                .sentinel
                .unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
            rooms_default: self.rooms_default.unwrap_or(1),
            non_numeric_floor: self.non_numeric_floor.unwrap_or_default(),
            scaler_fit: self.scaler_fit.unwrap_or_default(),
            test_size: self.test_size.unwrap_or(0.2),
            random_seed: self.random_seed.unwrap_or(42),
        };

        config.validate()?;
        Ok(config)
    }
}

// =============================================================================
// Settings file
// =============================================================================

/// Both configuration halves, as stored in a JSON settings file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub features: FeatureConfig,
    pub pipeline: PipelineConfig,
}

impl Settings {
    /// Read and validate settings from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> crate::error::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(crate::error::PreprocessingError::from)
            .context(format!("Reading settings file {}", path.display()))?;
        let settings: Settings = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate both halves.
    pub fn validate(&self) -> crate::error::Result<()> {
        self.features
            .validate()
            .map_err(|e| crate::error::PreprocessingError::InvalidConfig(e.to_string()))?;
        self.pipeline
            .validate()
            .map_err(|e| crate::error::PreprocessingError::InvalidConfig(e.to_string()))?;
        Ok(())
    }
}
