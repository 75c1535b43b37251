//! Error types for the cldfkit library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for cldfkit operations.
#[derive(Debug, Error)]
pub enum CldfError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex compilation error (datatype formats).
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// The reference component catalog is missing or malformed.
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A schema mutation referenced something that does not exist.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed BibTeX input.
    #[error("Bibliography error at line {line}: {message}")]
    Bibliography { line: usize, message: String },

    /// Structural validation of a written dataset failed.
    #[error("Validation failed with {} problem(s): {}", .0.len(), .0.join("; "))]
    Validation(Vec<String>),
}

impl CldfError {
    /// Build an [`CldfError::Io`] for the given path.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CldfError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for cldfkit operations.
pub type Result<T> = std::result::Result<T, CldfError>;
