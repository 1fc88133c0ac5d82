//! High-level pipeline API: metadata file in, substitution CSV out.
//!
//! The run is a single sequential pass:
//!
//! 1. Read and project the metadata table
//! 2. Derive the country from the location
//! 3. Keep rows from the requested host
//! 4. Drop rows without a lineage or a country
//! 5. Drop rows whose collection date is malformed
//! 6. Explode the substitution list, one row per substitution
//! 7. Write the CSV atomically
//!
//! Dropped rows are not errors. They are only counted in [`FilterStats`].
//!
//! # Example
//!
//! ```rust,ignore
//! use aasubs::{track_file, TrackOptions};
//! use std::path::Path;
//!
//! let report = track_file(
//!     Path::new("metadata.tsv"),
//!     Path::new("aa_subs.csv"),
//!     &TrackOptions::default(),
//! )?;
//! println!("{} rows written", report.rows_written);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use super::explode::explode_substitutions;
use super::filters::{derive_country, has_lineage, host_matches, is_valid_date, DateCheck};
use crate::error::{PipelineError, PipelineResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{SourceRecord, SubstitutionRow};
use crate::parser::read_metadata_file;
use crate::writer::write_rows_atomic;

/// Default host filter.
pub const DEFAULT_HOST: &str = "Human";

/// Row numbers kept per drop reason for diagnostics.
const MAX_SAMPLE_ROWS: usize = 5;

/// Options for a tracking run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackOptions {
    /// Exact host value to keep
    pub host: String,

    /// Collection date strictness
    pub date_check: DateCheck,

    /// Drop exploded rows with an empty substitution
    pub drop_empty: bool,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            date_check: DateCheck::Pattern,
            drop_empty: false,
        }
    }
}

/// Why a metadata row was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    WrongHost,
    MissingLineage,
    MissingCountry,
    MalformedDate,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DropReason::WrongHost => "host does not match",
            DropReason::MissingLineage => "no Pango lineage",
            DropReason::MissingCountry => "no country in location",
            DropReason::MalformedDate => "malformed collection date",
        };
        f.write_str(text)
    }
}

/// Counts of rows read, kept and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterStats {
    /// Metadata rows read
    pub rows_read: usize,
    /// Metadata rows that passed every filter
    pub records_kept: usize,
    /// Dropped rows per reason
    pub dropped: BTreeMap<DropReason, usize>,
    /// First few file line numbers per reason
    pub samples: BTreeMap<DropReason, Vec<u64>>,
    /// Exploded rows removed because their substitution was empty
    pub empty_substitutions_dropped: usize,
}

impl FilterStats {
    /// Record a dropped row. `line` is where the record starts in the file.
    fn record_drop(&mut self, reason: DropReason, line: u64) {
        *self.dropped.entry(reason).or_default() += 1;
        let samples = self.samples.entry(reason).or_default();
        if samples.len() < MAX_SAMPLE_ROWS {
            samples.push(line);
        }
    }

    /// Total metadata rows dropped
    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    /// Dropped count for one reason
    pub fn dropped_for(&self, reason: DropReason) -> usize {
        self.dropped.get(&reason).copied().unwrap_or(0)
    }
}

/// Output of an in-memory run
#[derive(Debug, Clone)]
pub struct TrackResult {
    /// Exploded rows, in input order then substitution order
    pub rows: Vec<SubstitutionRow>,
    /// Filtering statistics
    pub stats: FilterStats,
}

/// Summary of a file-to-file run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub input: String,
    pub output: String,
    pub options: TrackOptions,
    pub encoding: String,
    pub rows_written: usize,
    pub stats: FilterStats,
}

/// Decide whether a record is kept, returning its country if so.
///
/// Checks run in pipeline order and the first failure wins.
pub fn check_record(record: &SourceRecord, options: &TrackOptions) -> Result<String, DropReason> {
    let country = derive_country(&record.location);

    if !host_matches(record, &options.host) {
        return Err(DropReason::WrongHost);
    }
    if !has_lineage(record) {
        return Err(DropReason::MissingLineage);
    }
    let country = country.ok_or(DropReason::MissingCountry)?;
    if !is_valid_date(&record.collection_date, options.date_check) {
        return Err(DropReason::MalformedDate);
    }

    Ok(country)
}

/// Filter and explode already-loaded records.
pub fn run(records: &[SourceRecord], options: &TrackOptions) -> TrackResult {
    let mut stats = FilterStats {
        rows_read: records.len(),
        ..Default::default()
    };
    let mut rows = Vec::new();

    for record in records {
        match check_record(record, options) {
            Ok(country) => {
                stats.records_kept += 1;
                rows.extend(explode_substitutions(record, &country));
            }
            Err(reason) => stats.record_drop(reason, record.line),
        }
    }

    if options.drop_empty {
        let before = rows.len();
        rows.retain(|row| !row.substitution.is_empty());
        stats.empty_substitutions_dropped = before - rows.len();
    }

    TrackResult { rows, stats }
}

/// Run the whole pipeline from a metadata file to a CSV file.
///
/// The output file is only replaced once every row has been written.
pub fn track_file(input: &Path, output: &Path, options: &TrackOptions) -> PipelineResult<RunReport> {
    log_info(format!("📖 Reading metadata: {}", input.display()));
    let table = read_metadata_file(input)?;
    log_success(format!("Encoding: {}", table.encoding));
    log_success(format!("Read {} rows ({} columns)", table.records.len(), table.headers.len()));

    log_info(format!("⚙️  Filtering on host \"{}\"...", options.host));
    let result = run(&table.records, options);
    print_filter_stats(&result.stats);

    let rows_written = write_rows_atomic(output, &result.rows)?;
    log_success(format!("💾 Wrote {} rows to {}", rows_written, output.display()));

    Ok(RunReport {
        input: input.display().to_string(),
        output: output.display().to_string(),
        options: options.clone(),
        encoding: table.encoding,
        rows_written,
        stats: result.stats,
    })
}

/// Write a run report as pretty JSON.
pub fn write_report(path: &Path, report: &RunReport) -> PipelineResult<()> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| PipelineError::Report(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| PipelineError::Report(format!("{}: {}", path.display(), e)))?;
    log_success(format!("Report written to {}", path.display()));
    Ok(())
}

/// Print filtering statistics
fn print_filter_stats(stats: &FilterStats) {
    log_success(format!("Kept {} of {} rows", stats.records_kept, stats.rows_read));

    if stats.total_dropped() > 0 {
        log_warning(format!("{} rows dropped", stats.total_dropped()));
        for (reason, count) in &stats.dropped {
            let lines: Vec<String> = stats
                .samples
                .get(reason)
                .map(|s| s.iter().map(|l| l.to_string()).collect())
                .unwrap_or_default();
            let more = if *count > lines.len() { ", ..." } else { "" };
            log_info_indent(
                format!("• {}: {} (lines: {}{})", reason, count, lines.join(", "), more),
                1,
            );
        }
    }

    if stats.empty_substitutions_dropped > 0 {
        log_warning(format!(
            "{} empty substitutions dropped",
            stats.empty_substitutions_dropped
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LOGGER;
    use tempfile::tempdir;

    const HEADER: &str = "Virus name\tAccession ID\tCollection date\tLocation\tPango lineage\tAA Substitutions\tHost";

    fn record(name: &str, date: &str, location: &str, lineage: &str, subs: &str, host: &str) -> SourceRecord {
        SourceRecord {
            virus_name: name.into(),
            accession_id: format!("EPI_ISL_{}", name.len()),
            collection_date: date.into(),
            location: location.into(),
            pango_lineage: lineage.into(),
            aa_substitutions: subs.into(),
            host: host.into(),
            line: 0,
        }
    }

    /// Number records as consecutive file lines after the header.
    fn numbered(mut records: Vec<SourceRecord>) -> Vec<SourceRecord> {
        for (i, record) in records.iter_mut().enumerate() {
            record.line = i as u64 + 2;
        }
        records
    }

    #[test]
    fn test_default_options() {
        let opts = TrackOptions::default();
        assert_eq!(opts.host, "Human");
        assert_eq!(opts.date_check, DateCheck::Pattern);
        assert!(!opts.drop_empty);
    }

    #[test]
    fn test_end_to_end_scenario() {
        let records = numbered(vec![
            record("VirusA", "2021-04-28", "NA/USA/CA", "B.1.1.7", "(D614G,N501Y)", "Human"),
            record("VirusB", "bad-date", "NA/UK", "B.1.617.2", "(E484K)", "Human"),
        ]);
        let result = run(&records, &TrackOptions::default());

        assert_eq!(result.rows.len(), 2);
        assert!(result.rows.iter().all(|r| r.virus_name == "VirusA" && r.country == "USA"));
        assert_eq!(result.rows[0].substitution, "D614G");
        assert_eq!(result.rows[1].substitution, "N501Y");
        assert_eq!(result.stats.dropped_for(DropReason::MalformedDate), 1);
        assert_eq!(result.stats.samples[&DropReason::MalformedDate], vec![3]);
    }

    #[test]
    fn test_rows_grouped_in_input_order() {
        let records = vec![
            record("v1", "2021-01-01", "Europe / France", "B.1", "(A,B)", "Human"),
            record("v2", "2021-01-02", "Europe / Spain", "B.1", "(C)", "Human"),
            record("v3", "2021-01-03", "Europe / Italy", "B.1", "(D,E)", "Human"),
        ];
        let result = run(&records, &TrackOptions::default());
        let order: Vec<(&str, &str)> = result
            .rows
            .iter()
            .map(|r| (r.virus_name.as_str(), r.substitution.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("v1", "A"), ("v1", "B"), ("v2", "C"), ("v3", "D"), ("v3", "E")]
        );
    }

    #[test]
    fn test_host_filter_exact() {
        let records = vec![
            record("v1", "2021-01-01", "Asia / Japan", "B.1", "(A)", "human"),
            record("v2", "2021-01-01", "Asia / Japan", "B.1", "(A)", "Human"),
        ];
        let result = run(&records, &TrackOptions::default());
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.stats.dropped_for(DropReason::WrongHost), 1);

        let mink = TrackOptions {
            host: "Neovison vison".into(),
            ..Default::default()
        };
        let result = run(&records, &mink);
        assert!(result.rows.is_empty());
        assert_eq!(result.stats.dropped_for(DropReason::WrongHost), 2);
    }

    #[test]
    fn test_missing_lineage_and_country_dropped() {
        let records = vec![
            record("v1", "2021-01-01", "Asia / Japan", "", "(A)", "Human"),
            record("v2", "2021-01-01", "Oceania", "B.1", "(A)", "Human"),
        ];
        let result = run(&records, &TrackOptions::default());
        assert!(result.rows.is_empty());
        assert_eq!(result.stats.dropped_for(DropReason::MissingLineage), 1);
        assert_eq!(result.stats.dropped_for(DropReason::MissingCountry), 1);
        assert_eq!(result.stats.total_dropped(), 2);
    }

    #[test]
    fn test_missing_value_lineages_dropped() {
        let records: Vec<SourceRecord> = ["None", "NA", "nan", "N/A", "NaN", "null", "<NA>", "#N/A"]
            .iter()
            .map(|lineage| record("v1", "2021-01-01", "Asia / Japan", lineage, "(A)", "Human"))
            .collect();
        let result = run(&records, &TrackOptions::default());
        assert!(result.rows.is_empty());
        assert_eq!(result.stats.dropped_for(DropReason::MissingLineage), 8);
        assert_eq!(result.stats.records_kept, 0);
    }

    #[test]
    fn test_first_failing_check_wins() {
        let records = vec![record("v1", "bad", "Oceania", "", "(A)", "Dog")];
        let result = run(&records, &TrackOptions::default());
        assert_eq!(result.stats.dropped_for(DropReason::WrongHost), 1);
        assert_eq!(result.stats.total_dropped(), 1);
    }

    #[test]
    fn test_calendar_dates_tighten_filter() {
        let records = vec![record("v1", "2021-13-99", "Asia / Japan", "B.1", "(A)", "Human")];
        assert_eq!(run(&records, &TrackOptions::default()).rows.len(), 1);

        let strict = TrackOptions {
            date_check: DateCheck::Calendar,
            ..Default::default()
        };
        assert!(run(&records, &strict).rows.is_empty());
    }

    #[test]
    fn test_empty_substitutions() {
        let records = vec![record("v1", "2021-01-01", "Asia / Japan", "B.1", "()", "Human")];

        let kept = run(&records, &TrackOptions::default());
        assert_eq!(kept.rows.len(), 1);
        assert_eq!(kept.rows[0].substitution, "");

        let dropping = TrackOptions {
            drop_empty: true,
            ..Default::default()
        };
        let dropped = run(&records, &dropping);
        assert!(dropped.rows.is_empty());
        assert_eq!(dropped.stats.empty_substitutions_dropped, 1);
        assert_eq!(dropped.stats.records_kept, 1);
    }

    #[test]
    fn test_sample_lines_capped() {
        let records = numbered(
            (0..8)
                .map(|i| record(&format!("v{i}"), "nope", "Asia / Japan", "B.1", "(A)", "Human"))
                .collect(),
        );
        let result = run(&records, &TrackOptions::default());
        assert_eq!(result.stats.dropped_for(DropReason::MalformedDate), 8);
        assert_eq!(result.stats.samples[&DropReason::MalformedDate], vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_track_file_end_to_end() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let input = dir.path().join("metadata.tsv");
        let output = dir.path().join("subs.csv");
        std::fs::write(
            &input,
            format!(
                "{}\nVirusA\tAcc1\t2021-04-28\tNA/USA/CA\tB.1.1.7\t(D614G,N501Y)\tHuman\n\
                 VirusB\tAcc2\tbad-date\tNA/UK\tB.1.617.2\t(E484K)\tHuman\n",
                HEADER
            ),
        )
        .unwrap();

        let report = track_file(&input, &output, &TrackOptions::default()).unwrap();

        assert_eq!(report.rows_written, 2);
        assert_eq!(report.stats.rows_read, 2);
        assert_eq!(report.encoding, "utf-8");
        let text = std::fs::read_to_string(&output).unwrap();
        assert_eq!(
            text,
            "Virus name,Accession ID,Collection date,Country,Pango lineage,AA Substitutions\n\
             VirusA,Acc1,2021-04-28,USA,B.1.1.7,D614G\n\
             VirusA,Acc1,2021-04-28,USA,B.1.1.7,N501Y\n"
        );
    }

    #[test]
    fn test_track_file_reports_file_lines() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let input = dir.path().join("metadata.tsv");
        let output = dir.path().join("subs.csv");
        // Quoted name spans lines 2-3, line 4 is blank
        std::fs::write(
            &input,
            format!(
                "{}\n\"hCoV-19/USA/\nCA-1/2021\"\tAcc1\t2021-04-28\tNA/USA/CA\tB.1.1.7\t(D614G)\tHuman\n\n\
                 VirusB\tAcc2\tbad-date\tNA/UK\tB.1.617.2\t(E484K)\tHuman\n",
                HEADER
            ),
        )
        .unwrap();

        let report = track_file(&input, &output, &TrackOptions::default()).unwrap();

        assert_eq!(report.stats.rows_read, 2);
        assert_eq!(report.rows_written, 1);
        assert_eq!(report.stats.samples[&DropReason::MalformedDate], vec![5]);
    }

    #[test]
    fn test_track_file_is_idempotent() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let input = dir.path().join("metadata.tsv");
        std::fs::write(
            &input,
            format!(
                "{}\nv1\ta1\t2021-02-03\tEurope / Germany / Berlin\tB.1.1.7\t(Spike_N501Y,Spike_A570D)\tHuman\n\
                 v2\ta2\t2021-02-04\tEurope / Germany\tB.1.351\t(Spike_K417N)\tHuman\n",
                HEADER
            ),
        )
        .unwrap();

        let first = dir.path().join("first.csv");
        let second = dir.path().join("second.csv");
        track_file(&input, &first, &TrackOptions::default()).unwrap();
        track_file(&input, &second, &TrackOptions::default()).unwrap();

        assert_eq!(std::fs::read(&first).unwrap(), std::fs::read(&second).unwrap());
    }

    #[test]
    fn test_track_file_missing_column_leaves_no_output() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let input = dir.path().join("metadata.tsv");
        let output = dir.path().join("subs.csv");
        std::fs::write(&input, "Virus name\tHost\nv1\tHuman\n").unwrap();

        let err = track_file(&input, &output, &TrackOptions::default()).unwrap_err();

        assert!(matches!(err, PipelineError::Parse(_)));
        assert!(err.to_string().contains("Pango lineage"));
        assert!(!output.exists());
    }

    #[test]
    fn test_track_file_unreadable_input() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let err = track_file(
            &dir.path().join("absent.tsv"),
            &dir.path().join("out.csv"),
            &TrackOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }

    #[test]
    fn test_write_report() {
        LOGGER.set_quiet(true);
        let dir = tempdir().unwrap();
        let records = vec![record("v1", "bad", "Asia / Japan", "B.1", "(A)", "Human")];
        let result = run(&records, &TrackOptions::default());
        let report = RunReport {
            input: "in.tsv".into(),
            output: "out.csv".into(),
            options: TrackOptions::default(),
            encoding: "utf-8".into(),
            rows_written: result.rows.len(),
            stats: result.stats,
        };
        let path = dir.path().join("report.json");
        write_report(&path, &report).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["rows_written"], 0);
        assert_eq!(json["options"]["host"], "Human");
        assert_eq!(json["stats"]["dropped"]["malformed_date"], 1);
    }
}
