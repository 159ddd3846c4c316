//! Real-Estate Listing Preprocessing Library
//!
//! Turns raw real-estate listing tables into clean, numerically encoded
//! datasets ready for supervised-model training, built on Polars.
//!
//! # Overview
//!
//! - **Loading**: whole tables are fetched once through a [`TableSource`]
//!   (`data_main` or `data_staging`)
//! - **Cleaning**: sentinel fill for descriptive columns, duplicate removal,
//!   dropping rows without price or size
//! - **Filtering**: price, size and floor thresholds
//! - **Casting**: numeric features to `Float64`, categorical features to
//!   `Categorical`
//! - **Scaling**: zero-mean / unit-variance numeric features
//! - **Splitting**: deterministic, seeded 80/20 train/test partition
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use listing_prep::{
//!     CsvDirectorySource, FeatureConfig, ListingsTable, PipelineConfig, TabularPreprocessor,
//! };
//!
//! let source = CsvDirectorySource::new("data/");
//! let mut prep = TabularPreprocessor::from_source(
//!     &source,
//!     ListingsTable::Main,
//!     FeatureConfig::default(),
//!     PipelineConfig::default(),
//! )?;
//!
//! prep.run_preprocessing_pipeline(true, true)?;
//! let split = prep.train_test_split()?;
//!
//! println!("Train rows: {}", split.train_rows());
//! println!("Test rows: {}", split.test_rows());
//! ```
//!
//! # Configuration
//!
//! Column roles live in [`FeatureConfig`], thresholds and policies in
//! [`PipelineConfig`]:
//!
//! ```rust,ignore
//! use listing_prep::config::*;
//!
//! let features = FeatureConfig::builder()
//!     .numeric_features(["size", "rooms"])
//!     .categorical_features(["floor", "status"])
//!     .target_column("price")
//!     .build()?;
//!
//! let config = PipelineConfig::builder()
//!     .price_filter(10_000_000.0)
//!     .handle_missing(true)
//!     .scaler_fit(ScalerFit::TrainPartition)
//!     .build()?;
//! ```

pub mod cleaner;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod scaling;
pub mod split;
pub mod storage;
pub mod utils;

// Re-exports for convenient access
pub use cleaner::{DataCleaner, DomainFilter, TypeCaster};
pub use config::{
    ConfigValidationError, FeatureConfig, FeatureConfigBuilder, NonNumericFloor, PipelineConfig,
    PipelineConfigBuilder, ScalerFit, Settings,
};
pub use error::{PreprocessingError, Result as PreprocessingResult, ResultExt};
pub use pipeline::{PipelineStep, StepRecord, TabularPreprocessor};
pub use report::{PartitionFormat, RunReport, write_partitions, write_run_outputs};
pub use scaling::{ColumnScaling, StandardScaler};
pub use split::TrainTestSplit;
pub use storage::{CsvDirectorySource, InMemorySource, ListingsTable, TableSource};
