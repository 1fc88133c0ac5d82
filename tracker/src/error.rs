//! Error types for the substitution tracking pipeline.
//!
//! - [`ParseError`] - reading, decoding and projecting the metadata table
//! - [`WriteError`] - writing the exploded CSV
//! - [`PipelineError`] - top-level run errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Row-level data problems (wrong host, bad date, ...) are never errors:
//! those rows are filtered out by the pipeline.

use thiserror::Error;

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors while loading the metadata table.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Failed to read the input file.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// Content could not be decoded.
    #[error("Failed to decode input as {0}")]
    Encoding(String),

    /// Malformed tab-separated content.
    #[error("Invalid metadata table: {0}")]
    Csv(#[from] csv::Error),

    /// Input has no header row.
    #[error("Metadata file is empty")]
    EmptyFile,

    /// Required columns are absent from the header.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

// =============================================================================
// Writing Errors
// =============================================================================

/// Errors while writing the output CSV.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Output path is not writable.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failed.
    #[error("Failed to write CSV row: {0}")]
    Csv(#[from] csv::Error),

    /// The temporary file could not be moved over the destination.
    #[error("Failed to finalize output file: {0}")]
    Persist(#[from] tempfile::PersistError),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level errors returned by [`crate::transform::track_file`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be loaded.
    #[error("Input error: {0}")]
    Parse(#[from] ParseError),

    /// Output could not be written.
    #[error("Output error: {0}")]
    Write(#[from] WriteError),

    /// Run report could not be written.
    #[error("Report error: {0}")]
    Report(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Result type for writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
