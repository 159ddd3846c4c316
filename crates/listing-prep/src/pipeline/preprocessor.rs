//! The listing preprocessor.
//!
//! [`TabularPreprocessor`] owns one dataset and exposes each pipeline step as
//! a method. Every step consumes the current frame and produces a new one
//! that is assigned back, so a failing step leaves the owned frame as it was.

use crate::cleaner::{DataCleaner, DomainFilter, TypeCaster};
use crate::config::{FeatureConfig, PipelineConfig, ScalerFit};
use crate::error::{PreprocessingError, Result};
use crate::pipeline::history::{PipelineStep, StepRecord};
use crate::scaling::StandardScaler;
use crate::split::{self, TrainTestSplit};
use crate::storage::{ListingsTable, TableSource};
use crate::utils::require_column;
use polars::prelude::*;
use tracing::{debug, error, info};

/// Owns a listing table and applies the preprocessing pipeline to it.
///
/// # Example
///
/// ```rust,ignore
/// use listing_prep::{FeatureConfig, InMemorySource, ListingsTable, PipelineConfig, TabularPreprocessor};
///
/// let source = InMemorySource::new().with_table("data_main", raw);
/// let mut prep = TabularPreprocessor::from_source(
///     &source,
///     ListingsTable::Main,
///     FeatureConfig::default(),
///     PipelineConfig::default(),
/// )?;
///
/// prep.run_preprocessing_pipeline(true, true)?;
/// let split = prep.train_test_split()?;
/// println!("{} train / {} test rows", split.train_rows(), split.test_rows());
/// ```
pub struct TabularPreprocessor {
    df: DataFrame,
    features: FeatureConfig,
    config: PipelineConfig,
    cleaner: DataCleaner,
    scaler: Option<StandardScaler>,
    scaling_deferred: bool,
    history: Vec<StepRecord>,
}

static_assertions::assert_impl_all!(TabularPreprocessor: Send);

impl TabularPreprocessor {
    /// Wrap an already-loaded table.
    pub fn new(df: DataFrame, features: FeatureConfig, config: PipelineConfig) -> Result<Self> {
        features
            .validate()
            .map_err(|e| PreprocessingError::InvalidConfig(e.to_string()))?;
        config
            .validate()
            .map_err(|e| PreprocessingError::InvalidConfig(e.to_string()))?;

        let cleaner = DataCleaner::new(config.sentinel.clone(), config.rooms_default);

        Ok(Self {
            df,
            features,
            config,
            cleaner,
            scaler: None,
            scaling_deferred: false,
            history: Vec::new(),
        })
    }

    /// Load the whole `table` from `source`.
    ///
    /// The source is only borrowed for the duration of the load.
    pub fn from_source<S: TableSource + ?Sized>(
        source: &S,
        table: ListingsTable,
        features: FeatureConfig,
        config: PipelineConfig,
    ) -> Result<Self> {
        info!("Loading table '{}'", table);
        let df = source.fetch_table(table.table_name()).map_err(|e| {
            error!("Failed to load '{}': {}", table, e);
            e
        })?;
        info!("Loaded '{}': {:?}", table, df.shape());

        Self::new(df, features, config)
    }

    /// Fill missing values, drop duplicates, then drop rows without price or size.
    pub fn handle_missing_and_duplicated_values(&mut self) -> Result<()> {
        let cleaner = &self.cleaner;
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::HandleMissing,
            |df| cleaner.handle_missing_and_duplicates(df),
        )
    }

    /// Coerce `price` to float, dropping non-numeric rows, and keep
    /// `price < filter_price` when `filter_price > 0`.
    pub fn process_price(&mut self, filter_price: f64) -> Result<()> {
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::ProcessPrice,
            |df| DomainFilter::process_price(df, filter_price),
        )
    }

    /// Keep `size < filter_size` when `filter_size > 0`.
    pub fn process_size(&mut self, filter_size: f64) -> Result<()> {
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::ProcessSize,
            |df| DomainFilter::process_size(df, filter_size),
        )
    }

    /// Keep `floor < filter_floor` when `filter_floor > 0`.
    ///
    /// Non-numeric floors follow [`PipelineConfig::non_numeric_floor`].
    pub fn process_floor(&mut self, filter_floor: f64) -> Result<()> {
        let policy = self.config.non_numeric_floor;
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::ProcessFloor,
            |df| DomainFilter::process_floor(df, filter_floor, policy),
        )
    }

    /// Cast numeric features to `Float64` and categorical features to
    /// `Categorical`.
    pub fn cast_types(&mut self) -> Result<()> {
        let features = &self.features;
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::CastTypes,
            |df| TypeCaster::cast_types(df, features),
        )
    }

    /// Cast a frame that is not owned by any preprocessor, e.g. inference
    /// data, with exactly the rules of [`Self::cast_types`].
    pub fn static_cast_types(df: DataFrame, features: &FeatureConfig) -> Result<DataFrame> {
        TypeCaster::cast_types(df, features)
    }

    /// Restrict the dataset to the feature columns followed by the target.
    pub fn select_features(&mut self) -> Result<()> {
        let features = &self.features;
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::SelectFeatures,
            |df| {
                let model_columns = features.model_columns();
                for col_name in &model_columns {
                    require_column(&df, col_name)?;
                }
                let selection: Vec<PlSmallStr> =
                    model_columns.iter().map(|s| s.as_str().into()).collect();
                Ok(df.select(selection)?)
            },
        )
    }

    /// Fit a scaler on the numeric features and overwrite them with the
    /// scaled values.
    ///
    /// The scaler is fitted on, and applied to, the whole current dataset.
    pub fn standardize(&mut self) -> Result<()> {
        let numeric = &self.features.numeric_features;
        let mut fitted = None;
        apply_step(
            &mut self.df,
            &mut self.history,
            PipelineStep::Standardize,
            |df| {
                let (scaler, df) = StandardScaler::fit_transform(df, numeric)?;
                fitted = Some(scaler);
                Ok(df)
            },
        )?;
        self.scaler = fitted;
        self.scaling_deferred = false;
        Ok(())
    }

    /// Run the full pipeline in its fixed order.
    ///
    /// Cleanup (if enabled in the config) → cast (optional) → price → size →
    /// floor → standardize (optional) → select features.
    ///
    /// With [`ScalerFit::TrainPartition`] standardization is not applied here;
    /// [`Self::train_test_split`] fits it on the training rows instead.
    pub fn run_preprocessing_pipeline(&mut self, cast_types: bool, standardize: bool) -> Result<()> {
        info!(
            "Starting preprocessing pipeline ({} rows, {} columns)",
            self.df.height(),
            self.df.width()
        );

        if self.config.handle_missing {
            self.handle_missing_and_duplicated_values()?;
        } else {
            debug!("Skipping missing/duplicate cleanup (disabled)");
        }

        if cast_types {
            self.cast_types()?;
        } else {
            debug!("Skipping type casting (disabled)");
        }

        self.process_price(self.config.price_filter)?;
        self.process_size(self.config.size_filter)?;
        self.process_floor(self.config.floor_filter)?;

        self.scaling_deferred = false;
        if standardize {
            match self.config.scaler_fit {
                ScalerFit::FullDataset => self.standardize()?,
                ScalerFit::TrainPartition => {
                    info!("Deferring standardization to the training partition");
                    self.scaling_deferred = true;
                }
            }
        } else {
            debug!("Skipping standardization (disabled)");
        }

        self.select_features()?;

        info!(
            "Preprocessing pipeline complete: {} rows, {} columns",
            self.df.height(),
            self.df.width()
        );
        Ok(())
    }

    /// Partition the feature-selected dataset into train/test features and
    /// targets.
    ///
    /// Fails with `PreconditionViolated` if the dataset's columns are not
    /// exactly the features plus the target.
    pub fn train_test_split(&self) -> Result<TrainTestSplit> {
        let mut split = split::train_test_split(
            &self.df,
            &self.features,
            self.config.test_size,
            self.config.random_seed,
        )?;

        if self.scaling_deferred {
            let scaler = StandardScaler::fit(&split.x_train, &self.features.numeric_features)?;
            split.x_train = scaler.transform(std::mem::take(&mut split.x_train))?;
            split.x_test = scaler.transform(std::mem::take(&mut split.x_test))?;
            debug!("Standardized partitions with statistics of {} training rows", split.train_rows());
            split.scaler = Some(scaler);
        } else {
            split.scaler = self.scaler.clone();
        }

        info!(
            "Split into {} train / {} test rows",
            split.train_rows(),
            split.test_rows()
        );
        Ok(split)
    }

    /// The current dataset.
    pub fn get(&self) -> &DataFrame {
        &self.df
    }

    /// Give up ownership of the current dataset.
    pub fn into_inner(self) -> DataFrame {
        self.df
    }

    pub fn features(&self) -> &FeatureConfig {
        &self.features
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Scaler fitted by the last [`Self::standardize`] call.
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Whether scaling will be fitted on the training partition at split time.
    pub fn scaling_deferred(&self) -> bool {
        self.scaling_deferred
    }

    /// Steps applied so far, in order.
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }
}

/// Run one step over a copy of the frame and store the result.
fn apply_step<F>(
    df: &mut DataFrame,
    history: &mut Vec<StepRecord>,
    step: PipelineStep,
    f: F,
) -> Result<()>
where
    F: FnOnce(DataFrame) -> Result<DataFrame>,
{
    let rows_before = df.height();
    let next = f(df.clone()).map_err(|e| {
        error!("{} failed: {}", step, e);
        e
    })?;

    info!("{}: {} -> {} rows", step, rows_before, next.height());
    history.push(StepRecord {
        step,
        rows_before,
        rows_after: next.height(),
    });
    *df = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{column_names, is_categorical_dtype};
    use pretty_assertions::assert_eq;

    fn raw() -> DataFrame {
        df!(
            "id" => [1i64, 2, 3, 4, 5, 6],
            "price" => ["300000", "abc", "450000", "20000000", "510000", "275000"],
            "size" => [45.0, 50.0, 62.0, 80.0, 1200.0, 38.0],
            "rooms" => [2i64, 2, 3, 4, 5, 1],
            "floor" => ["1", "2", "3", "4", "5", "35"],
            "status" => ["ready", "ready", "new", "new", "ready", "new"],
            "property_type" => ["flat", "flat", "flat", "house", "house", "flat"],
            "year_built" => ["1990", "2001", "2015", "1975", "2020", "2010"],
            "property_condition" => ["good", "good", "new", "bad", "good", "good"]
        )
        .unwrap()
    }

    fn prep() -> TabularPreprocessor {
        TabularPreprocessor::new(raw(), FeatureConfig::default(), PipelineConfig::default())
            .unwrap()
    }

    #[test]
    fn test_full_pipeline_filters_and_shapes() {
        let mut p = prep();
        p.run_preprocessing_pipeline(true, true).unwrap();

        // abc price, 20M price, 1200 size and floor 35 are gone
        assert_eq!(p.get().height(), 2);
        assert_eq!(
            column_names(p.get()),
            FeatureConfig::default().model_columns()
        );
        assert!(is_categorical_dtype(p.get().column("status").unwrap().dtype()));
        assert!(p.scaler().is_some());
    }

    #[test]
    fn test_history_records_each_step() {
        let mut p = prep();
        p.run_preprocessing_pipeline(true, true).unwrap();
        let steps: Vec<PipelineStep> = p.history().iter().map(|r| r.step).collect();
        assert_eq!(
            steps,
            vec![
                PipelineStep::CastTypes,
                PipelineStep::ProcessPrice,
                PipelineStep::ProcessSize,
                PipelineStep::ProcessFloor,
                PipelineStep::Standardize,
                PipelineStep::SelectFeatures,
            ]
        );
        assert_eq!(p.history()[1].rows_removed(), 2);
    }

    #[test]
    fn test_failed_step_leaves_dataset_unchanged() {
        let mut p = prep();
        let before = p.get().clone();
        // property_type holds free text, so it cannot be numeric
        p.features.numeric_features.push("property_type".to_string());
        p.features.categorical_features.retain(|c| c != "property_type");
        assert!(p.cast_types().is_err());
        assert!(p.get().equals(&before));
        assert!(p.history().is_empty());
    }

    #[test]
    fn test_split_requires_feature_selection() {
        let p = prep();
        let err = p.train_test_split().unwrap_err();
        assert_eq!(err.error_code(), "PRECONDITION_VIOLATED");
    }

    #[test]
    fn test_accessors_and_into_inner() {
        let config = PipelineConfig::builder().random_seed(7).build().unwrap();
        let mut p = TabularPreprocessor::new(raw(), FeatureConfig::default(), config).unwrap();
        assert_eq!(p.features().target_column, "price");
        assert_eq!(p.config().random_seed, 7);

        p.process_size(1000.0).unwrap();
        let df = p.into_inner();
        assert_eq!(df.height(), 5);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PipelineConfig::default();
        config.test_size = 1.5;
        let result = TabularPreprocessor::new(raw(), FeatureConfig::default(), config);
        assert!(matches!(result, Err(PreprocessingError::InvalidConfig(_))));
    }
}
