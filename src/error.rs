use thiserror::Error;

use crate::types::SqlType;

/// Main error type for the csvload system
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("store error: {0}")]
    Store(#[from] tokio_postgres::Error),

    #[error("type mismatch in column `{column}`: value `{value}` does not parse as {expected}")]
    TypeMismatch {
        column: String,
        value: String,
        expected: SqlType,
    },

    #[error("row width mismatch: expected {expected} columns, found {found}")]
    RowWidth { expected: usize, found: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LoaderError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn type_mismatch(
        column: impl Into<String>,
        value: impl Into<String>,
        expected: SqlType,
    ) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            value: value.into(),
            expected,
        }
    }

    /// Short tag used in the run summary to classify a per-file failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Csv(_) => "csv",
            Self::Store(_) => "store",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::RowWidth { .. } => "row_width",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }
}
