//! Explode a record's substitution list into one row per substitution.

use crate::models::{SourceRecord, SubstitutionRow};

use super::filters::strip_parens;

/// One [`SubstitutionRow`] per comma-separated token, in list order.
///
/// Tokens are not trimmed. An empty list (`()`) yields a single row with
/// an empty substitution, like splitting an empty string does.
pub fn explode_substitutions(record: &SourceRecord, country: &str) -> Vec<SubstitutionRow> {
    strip_parens(&record.aa_substitutions)
        .split(',')
        .map(|token| SubstitutionRow {
            virus_name: record.virus_name.clone(),
            accession_id: record.accession_id.clone(),
            collection_date: record.collection_date.clone(),
            country: country.to_string(),
            pango_lineage: record.pango_lineage.clone(),
            substitution: token.to_string(),
        })
        .collect()
}
