//! Error types for schema analysis.

use thiserror::Error;

/// A failure reported by the database driver.
///
/// The message is kept exactly as the driver produced it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors raised by [`SchemaAnalyzer`](crate::SchemaAnalyzer).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// Opening the connection or running a catalog or describe call failed.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// There is no command to analyze.
    #[error("command text is empty")]
    EmptyCommand,
}

/// Convenience alias for results with [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;
