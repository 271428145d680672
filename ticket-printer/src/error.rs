//! Error types for the printer library

use thiserror::Error;

/// Printer error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// Network connection error
    #[error("Connection failed: {0}")]
    Connection(String),

    /// IO error while streaming the job
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Printer did not answer in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Invalid printer configuration
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// The print surface refused the job (dialog blocked, render error)
    #[error("Print rejected: {0}")]
    Rejected(String),
}

/// Result type for printer operations
pub type PrintResult<T> = Result<T, PrintError>;
