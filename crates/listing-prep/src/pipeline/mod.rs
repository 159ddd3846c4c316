//! Pipeline module.
//!
//! This module provides the [`TabularPreprocessor`] that owns a listing table
//! and runs the ordered cleaning, casting and scaling steps over it.

mod history;
mod preprocessor;

pub use history::{PipelineStep, StepRecord};
pub use preprocessor::TabularPreprocessor;
