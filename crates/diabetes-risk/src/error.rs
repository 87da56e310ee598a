//! Error Types for the Risk Engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RiskError>;

/// Top-level error surfaced to callers of the engine
#[derive(Error, Debug)]
pub enum RiskError {
    /// Bad or missing input; the caller should re-prompt
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No usable trained model; the request cannot proceed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Offline training failed; no artifact was published
    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RiskError {
    /// Whether re-prompting the user can fix the request
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Intake(_))
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(e) => format!("Please check your measurements: {e}"),
            Self::Intake(e) => format!("The uploaded results could not be read: {e}"),
            Self::ModelUnavailable(_) => {
                "The risk model is not available right now. Please try again later.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

/// Rejected raw input
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("`{field}` = {value} is outside the allowed range {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("`{field}` is not a number: {raw:?}")]
    NotNumeric { field: &'static str, raw: String },

    #[error("`{field}` must be a whole number, got {value}")]
    NotIntegral { field: &'static str, value: f64 },
}

impl ValidationError {
    /// Name of the offending input field
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field }
            | Self::OutOfRange { field, .. }
            | Self::NotNumeric { field, .. }
            | Self::NotIntegral { field, .. } => field,
        }
    }
}

/// Offline training failure
#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("dataset is empty")]
    EmptyDataset,

    #[error("dataset contains a single class only ({rows} rows, all outcome={outcome})")]
    SingleClass { outcome: u8, rows: usize },

    #[error("dataset is missing required column `{0}`")]
    MissingColumn(String),

    #[error("row {row}: column `{column}` is not numeric: {value:?}")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: outcome must be 0 or 1, got {value:?}")]
    InvalidOutcome { row: usize, value: String },

    #[error("invalid trainer configuration: {0}")]
    InvalidConfig(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Lab sheet could not be turned into raw inputs
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("the sheet is empty")]
    Empty,

    #[error("the sheet has a header but no data rows")]
    NoRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_is_recoverable() {
        let err: RiskError = ValidationError::MissingField { field: "age" }.into();
        assert!(err.is_recoverable());
        assert!(err.user_message().contains("age"));

        let err = RiskError::ModelUnavailable("not loaded".into());
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_out_of_range_message_lists_range() {
        let err = ValidationError::OutOfRange {
            field: "glucose",
            value: -5.0,
            min: 0.0,
            max: 600.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("glucose"));
        assert!(msg.contains("0..=600"));
        assert_eq!(err.field(), "glucose");
    }
}
