//! Error types for the fleetscore-ml crate.

use thiserror::Error;

/// Top-level error type for scoring pipelines.
#[derive(Debug, Error)]
pub enum MlError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Non-numeric value {value:?} in column '{column}' at row {row}")]
    NonNumeric {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl MlError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn missing_column(column: impl Into<String>) -> Self {
        Self::MissingColumn(column.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn training(msg: impl Into<String>) -> Self {
        Self::Training(msg.into())
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
