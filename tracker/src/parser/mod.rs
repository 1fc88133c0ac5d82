//! GISAID metadata reader with encoding auto-detection.
//!
//! Reads the tab-separated export and projects each row onto
//! [`SourceRecord`]. Columns are located by header name, so column order
//! and any extra columns in the export do not matter. Every cell is kept
//! as literal text.

use std::io::Read;
use std::path::Path;

use crate::error::{ParseError, ParseResult};
use crate::models::{SourceRecord, REQUIRED_COLUMNS};

/// Bytes inspected by the charset detector.
const ENCODING_SAMPLE_BYTES: usize = 64 * 1024;

/// A loaded metadata table
#[derive(Debug, Clone)]
pub struct MetadataTable {
    /// Projected records, in file order
    pub records: Vec<SourceRecord>,
    /// Header row as found in the file
    pub headers: Vec<String>,
    /// Detected or used encoding
    pub encoding: String,
}

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 short-circuits; otherwise chardet looks at a bounded sample.
pub fn detect_encoding(bytes: &[u8]) -> String {
    if std::str::from_utf8(bytes).is_ok() {
        return "utf-8".to_string();
    }

    let sample = &bytes[..bytes.len().min(ENCODING_SAMPLE_BYTES)];
    let charset = chardet::detect(sample).0;

    // Normalize charset names; no verdict means a single-byte Western file
    match charset.to_lowercase().as_str() {
        "" => "windows-1252".to_string(),
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the named encoding.
///
/// A leading BOM is removed. Malformed sequences are replaced rather
/// than rejected, an unknown encoding label is an error.
pub fn decode_content(bytes: &[u8], encoding: &str) -> ParseResult<String> {
    let encoding_impl = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => encoding_rs::UTF_8,
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252
        }
        other => encoding_rs::Encoding::for_label(other.as_bytes())
            .ok_or_else(|| ParseError::Encoding(encoding.to_string()))?,
    };

    let (decoded, _, _) = encoding_impl.decode(bytes);
    Ok(decoded.into_owned())
}

/// Positions of the required columns in the header row.
struct ColumnIndex {
    virus_name: usize,
    accession_id: usize,
    collection_date: usize,
    location: usize,
    pango_lineage: usize,
    aa_substitutions: usize,
    host: usize,
}

impl ColumnIndex {
    /// Locate every required column, reporting all missing ones at once.
    fn resolve(headers: &[String]) -> ParseResult<Self> {
        let positions = REQUIRED_COLUMNS.map(|name| headers.iter().position(|h| h == name));

        match positions {
            [Some(virus_name), Some(accession_id), Some(collection_date), Some(location), Some(pango_lineage), Some(aa_substitutions), Some(host)] => {
                Ok(Self {
                    virus_name,
                    accession_id,
                    collection_date,
                    location,
                    pango_lineage,
                    aa_substitutions,
                    host,
                })
            }
            _ => Err(ParseError::MissingColumns(
                REQUIRED_COLUMNS
                    .iter()
                    .zip(positions)
                    .filter(|(_, position)| position.is_none())
                    .map(|(name, _)| name.to_string())
                    .collect(),
            )),
        }
    }

    fn project(&self, row: &csv::StringRecord) -> SourceRecord {
        // Short rows yield empty cells
        let cell = |i: usize| row.get(i).unwrap_or("").to_string();
        SourceRecord {
            virus_name: cell(self.virus_name),
            accession_id: cell(self.accession_id),
            collection_date: cell(self.collection_date),
            location: cell(self.location),
            pango_lineage: cell(self.pango_lineage),
            aa_substitutions: cell(self.aa_substitutions),
            host: cell(self.host),
            line: row.position().map(|p| p.line()).unwrap_or(0),
        }
    }
}

/// Read tab-separated metadata from a reader of UTF-8 text.
pub fn read_metadata<R: Read>(reader: R) -> ParseResult<MetadataTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    if headers.is_empty() {
        return Err(ParseError::EmptyFile);
    }

    let columns = ColumnIndex::resolve(&headers)?;

    let mut records = Vec::new();
    for row in rdr.records() {
        records.push(columns.project(&row?));
    }

    Ok(MetadataTable {
        records,
        headers,
        encoding: "utf-8".to_string(),
    })
}

/// Read a metadata string in an already-known encoding.
pub fn parse_metadata_str(content: &str, encoding: String) -> ParseResult<MetadataTable> {
    let mut table = read_metadata(content.as_bytes())?;
    table.encoding = encoding;
    Ok(table)
}

/// Read metadata bytes with encoding auto-detection.
pub fn parse_bytes_auto(bytes: &[u8]) -> ParseResult<MetadataTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    parse_metadata_str(&content, encoding)
}

/// Read a metadata file with encoding auto-detection.
///
/// # Example
/// ```ignore
/// let table = read_metadata_file("metadata.tsv")?;
/// println!("{} records ({})", table.records.len(), table.encoding);
/// ```
pub fn read_metadata_file<P: AsRef<Path>>(path: P) -> ParseResult<MetadataTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}
