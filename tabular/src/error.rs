//! Tabular tool error types

use shared::ToolError;
use thiserror::Error;

/// Result type for tabular tool operations
pub type TabularResult<T> = Result<T, TabularError>;

/// Tabular tool error types
#[derive(Error, Debug)]
pub enum TabularError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("CSV buffer error: {message}")]
    CsvBufferError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Page error: {0}")]
    PageError(#[from] ToolError),
}

impl From<TabularError> for ToolError {
    fn from(error: TabularError) -> Self {
        match error {
            TabularError::PageError(inner) => inner,
            other => ToolError::handler(other),
        }
    }
}
