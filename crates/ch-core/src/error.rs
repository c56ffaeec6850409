//! Error types for Combine Harvester

use thiserror::Error;

/// Combine Harvester error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error (malformed caller input)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A named object could not be found in a source
    #[error("Not found: {0}")]
    NotFound(String),

    /// A named object exists but has an unexpected type
    #[error("Wrong type: object '{path}' in {source_name} is of type {found}, expected {expected}")]
    WrongType {
        /// Path of the object inside its source.
        path: String,
        /// Name of the source (file or workspace).
        source_name: String,
        /// Expected type name.
        expected: String,
        /// Actual type name.
        found: String,
    },

    /// Text parsing error (tables, ranges, patterns)
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
