//! Record of the steps applied to the owned dataset.

use serde::{Deserialize, Serialize};

/// Steps of the preprocessing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStep {
    /// Missing-value fill, duplicate removal, price/size completeness
    HandleMissing,
    /// Price coercion and threshold
    ProcessPrice,
    /// Size threshold
    ProcessSize,
    /// Floor threshold
    ProcessFloor,
    /// Numeric/categorical casting of feature columns
    CastTypes,
    /// Standard scaling of numeric features
    Standardize,
    /// Projection to features and target
    SelectFeatures,
}

impl PipelineStep {
    /// Returns a human-readable name for the step.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::HandleMissing => "Handling Missing/Duplicated Values",
            Self::ProcessPrice => "Processing Price",
            Self::ProcessSize => "Processing Size",
            Self::ProcessFloor => "Processing Floor",
            Self::CastTypes => "Casting Types",
            Self::Standardize => "Standardizing",
            Self::SelectFeatures => "Selecting Features",
        }
    }
}

impl std::fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// One applied step and its effect on the row count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: PipelineStep,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl StepRecord {
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_serialization() {
        let record = StepRecord {
            step: PipelineStep::ProcessPrice,
            rows_before: 10,
            rows_after: 7,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"process_price\""));
        assert_eq!(record.rows_removed(), 3);
    }
}
