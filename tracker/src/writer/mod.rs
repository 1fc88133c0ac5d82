//! CSV output for exploded substitution rows.
//!
//! The header is always written, even when no rows survive filtering.
//! [`write_rows_atomic`] goes through a temporary file in the destination
//! directory so a failed run never leaves a truncated CSV behind.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::WriteResult;
use crate::models::{SubstitutionRow, OUTPUT_COLUMNS};

/// Write the header and all rows to `writer`. Returns the row count.
pub fn write_rows<W: Write>(writer: W, rows: &[SubstitutionRow]) -> WriteResult<usize> {
    let mut wtr = csv::Writer::from_writer(writer);

    // serialize() emits the header with the first row only
    if rows.is_empty() {
        wtr.write_record(OUTPUT_COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(rows.len())
}

/// Write rows to `path`, replacing it only once everything is on disk.
pub fn write_rows_atomic(path: &Path, rows: &[SubstitutionRow]) -> WriteResult<usize> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    let written = write_rows(&mut tmp, rows)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn row(sub: &str) -> SubstitutionRow {
        SubstitutionRow {
            virus_name: "hCoV-19/England/MILK-9E05B3/2020".into(),
            accession_id: "EPI_ISL_601443".into(),
            collection_date: "2020-09-20".into(),
            country: "United Kingdom".into(),
            pango_lineage: "B.1.1.7".into(),
            substitution: sub.into(),
        }
    }

    #[test]
    fn test_header_and_rows() {
        let mut out = Vec::new();
        let n = write_rows(&mut out, &[row("Spike_N501Y"), row("Spike_P681H")]).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(n, 2);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "Virus name,Accession ID,Collection date,Country,Pango lineage,AA Substitutions"
        );
        assert_eq!(
            lines[1],
            "hCoV-19/England/MILK-9E05B3/2020,EPI_ISL_601443,2020-09-20,United Kingdom,B.1.1.7,Spike_N501Y"
        );
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_header_written_without_rows() {
        let mut out = Vec::new();
        write_rows(&mut out, &[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Virus name,Accession ID,Collection date,Country,Pango lineage,AA Substitutions\n"
        );
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let mut r = row("Spike_D614G");
        r.country = "Korea, Republic of".into();
        let mut out = Vec::new();
        write_rows(&mut out, &[r]).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("\"Korea, Republic of\""));
    }

    #[test]
    fn test_atomic_write_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("subs.csv");
        std::fs::write(&path, "stale").unwrap();

        write_rows_atomic(&path, &[row("Spike_N501Y")]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Virus name,"));
        assert!(text.contains("Spike_N501Y"));
        // No temporary files left behind
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_atomic_write_missing_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("subs.csv");
        assert!(write_rows_atomic(&path, &[row("x")]).is_err());
        assert!(!path.exists());
    }
}
