//! Transformation module.
//!
//! Turns projected metadata records into substitution rows:
//! - Filters: host, lineage, date checks and country derivation
//! - Explode: one row per amino-acid substitution
//! - Pipeline: the end-to-end run

pub mod explode;
pub mod filters;
pub mod pipeline;

pub use explode::explode_substitutions;
pub use filters::{derive_country, has_lineage, host_matches, is_valid_date, strip_parens, DateCheck};
pub use pipeline::*;
