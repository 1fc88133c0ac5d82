//! Row-level filters and field derivations.
//!
//! Every function here is pure and operates on a single record, so the
//! pipeline can chain them as iterator adapters.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::SourceRecord;

/// `YYYY-MM-DD`, ASCII digits only.
static DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("date pattern is valid")
});

/// How strictly collection dates are checked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateCheck {
    /// Shape only: `2021-13-40` is accepted.
    #[default]
    Pattern,
    /// Shape plus a real calendar date.
    Calendar,
}

/// Country is the second `/`-separated part of the location, trimmed.
///
/// `North America / USA / California` gives `USA`. Locations with a single
/// part have no country.
pub fn derive_country(location: &str) -> Option<String> {
    location.split('/').nth(1).map(|part| part.trim().to_string())
}

/// Exact, case-sensitive host comparison.
pub fn host_matches(record: &SourceRecord, host: &str) -> bool {
    record.host == host
}

/// Cell values that stand for a missing value in metadata exports.
///
/// These are the markers pandas reads as NA by default, matched exactly
/// after trimming.
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A lineage that is blank or a missing-value marker counts as absent.
pub fn has_lineage(record: &SourceRecord) -> bool {
    let lineage = record.pango_lineage.trim();
    !lineage.is_empty() && !MISSING_VALUE_TOKENS.contains(&lineage)
}

/// Check a collection date against the requested strictness.
pub fn is_valid_date(date: &str, check: DateCheck) -> bool {
    if !DATE_PATTERN.is_match(date) {
        return false;
    }
    match check {
        DateCheck::Pattern => true,
        DateCheck::Calendar => NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok(),
    }
}

/// Remove enclosing parentheses from a substitution list.
///
/// Only `(` and `)` are stripped, from both ends; whitespace is left alone.
pub fn strip_parens(subs: &str) -> &str {
    subs.trim_matches(|c: char| c == '(' || c == ')')
}
