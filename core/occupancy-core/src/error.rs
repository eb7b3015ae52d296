//! Error types for occupancy-core operations.
//!
//! Bad individual records never surface here as fatal: the reconstructor logs
//! and skips them. These variants describe failures at the edges (timestamps
//! handed to the normalizer directly, sources, configuration).

use std::path::PathBuf;

/// All errors that can occur in occupancy-core operations.
#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    // ─────────────────────────────────────────────────────────────────────
    // Data Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Malformed timestamp: {value:?}")]
    MalformedTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Invalid payload from {source_name}: {details}")]
    InvalidPayload {
        source_name: String,
        details: String,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Source Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Fetch failed: {target}: {details}")]
    FetchFailed { target: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // I/O Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parsing error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for Results using OccupancyError.
pub type Result<T> = std::result::Result<T, OccupancyError>;
