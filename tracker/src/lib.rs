//! # aasubs - amino-acid substitution tracking from GISAID metadata
//!
//! Reads a GISAID metadata export (tab-separated), keeps sequences from one
//! host with a lineage and a well-formed collection date, and writes one CSV
//! row per amino-acid substitution, tagged with date, country and lineage.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ metadata.tsv│────▶│   Parser    │────▶│  Transform  │────▶│  subs.csv   │
//! │ (GISAID)    │     │ (project)   │     │ (filter/exp)│     │  (atomic)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aasubs::{track_file, TrackOptions};
//! use std::path::Path;
//!
//! let report = track_file(
//!     Path::new("metadata.tsv"),
//!     Path::new("aa_subs.csv"),
//!     &TrackOptions::default(),
//! ).unwrap();
//! println!("{} substitution rows", report.rows_written);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`logs`] - Progress logging
//! - [`models`] - Record types and column names
//! - [`parser`] - Metadata reading with encoding detection
//! - [`transform`] - Filters, explosion and pipeline
//! - [`writer`] - Atomic CSV output

// Core modules
pub mod error;
pub mod logs;
pub mod models;

// Input
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod writer;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{ParseError, PipelineError, WriteError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{SourceRecord, SubstitutionRow, OUTPUT_COLUMNS, REQUIRED_COLUMNS};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content,
    detect_encoding,
    parse_bytes_auto,
    read_metadata,
    read_metadata_file,
    MetadataTable,
};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    check_record,
    derive_country,
    explode_substitutions,
    is_valid_date,
    run,
    track_file,
    write_report,
    DateCheck,
    DropReason,
    FilterStats,
    RunReport,
    TrackOptions,
    TrackResult,
    DEFAULT_HOST,
};

// =============================================================================
// Re-exports - Output
// =============================================================================

pub use writer::{write_rows, write_rows_atomic};
