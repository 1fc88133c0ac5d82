//! Domain models for the substitution tracking pipeline.
//!
//! - [`SourceRecord`] - one projected row of the GISAID metadata table
//! - [`SubstitutionRow`] - one output row (a single AA substitution)

use serde::Serialize;

// =============================================================================
// Column Names
// =============================================================================

pub const VIRUS_NAME: &str = "Virus name";
pub const ACCESSION_ID: &str = "Accession ID";
pub const COLLECTION_DATE: &str = "Collection date";
pub const LOCATION: &str = "Location";
pub const PANGO_LINEAGE: &str = "Pango lineage";
pub const AA_SUBSTITUTIONS: &str = "AA Substitutions";
pub const HOST: &str = "Host";
pub const COUNTRY: &str = "Country";

/// Input columns that must be present in the metadata header.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    VIRUS_NAME,
    ACCESSION_ID,
    COLLECTION_DATE,
    LOCATION,
    PANGO_LINEAGE,
    AA_SUBSTITUTIONS,
    HOST,
];

/// Output header, in output order.
pub const OUTPUT_COLUMNS: [&str; 6] = [
    VIRUS_NAME,
    ACCESSION_ID,
    COLLECTION_DATE,
    COUNTRY,
    PANGO_LINEAGE,
    AA_SUBSTITUTIONS,
];

// =============================================================================
// Source Record
// =============================================================================

/// One sequence submission, projected to the columns the pipeline uses.
///
/// Every field is literal text from the table; empty cells are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceRecord {
    pub virus_name: String,
    pub accession_id: String,
    pub collection_date: String,
    pub location: String,
    pub pango_lineage: String,
    pub aa_substitutions: String,
    pub host: String,
    /// 1-based line where the record starts in the file, 0 if not read from one
    pub line: u64,
}

// =============================================================================
// Output Row
// =============================================================================

/// A single amino-acid substitution observed in one submission.
///
/// Field order and serde names define the output CSV columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubstitutionRow {
    #[serde(rename = "Virus name")]
    pub virus_name: String,
    #[serde(rename = "Accession ID")]
    pub accession_id: String,
    #[serde(rename = "Collection date")]
    pub collection_date: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Pango lineage")]
    pub pango_lineage: String,
    #[serde(rename = "AA Substitutions")]
    pub substitution: String,
}
