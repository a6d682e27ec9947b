// src/csv_codec.rs
//
// Quote-wrapped, header-driven CSV used for export and import.
// Field values are trimmed on read.

use crate::error::{RadioLogError, Result};
use crate::models::{format_timestamp, parse_frequency, LogEntry};

/// Byte-order mark written first so spreadsheet tools detect UTF-8.
pub const BOM: char = '\u{feff}';

/// Column set written on export, by schema generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CsvSchema {
    /// timestamp, band, frequency, unit, memo
    V1,
    /// adds callsign and rst
    V2,
    /// adds uuid
    #[default]
    V3,
}

impl CsvSchema {
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            CsvSchema::V1 => &["timestamp", "band", "frequency", "unit", "memo"],
            CsvSchema::V2 => &["timestamp", "band", "frequency", "unit", "callsign", "rst", "memo"],
            CsvSchema::V3 => &[
                "uuid", "timestamp", "band", "frequency", "unit", "callsign", "rst", "memo",
            ],
        }
    }
}

impl std::str::FromStr for CsvSchema {
    type Err = RadioLogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(CsvSchema::V1),
            "v2" | "2" => Ok(CsvSchema::V2),
            "v3" | "3" => Ok(CsvSchema::V3),
            other => Err(RadioLogError::Validation(format!("Unknown CSV schema: {}", other))),
        }
    }
}

/// One data row as read from a file, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub uuid: String,
    pub timestamp: String,
    pub band: String,
    /// NaN when the cell did not hold a number.
    pub frequency: f64,
    pub callsign: String,
    pub rst: String,
    pub memo: String,
}

fn cell(entry: &LogEntry, column: &str) -> String {
    match column {
        "uuid" => entry.uuid.clone(),
        "timestamp" => format_timestamp(&entry.timestamp),
        "band" => entry.band.to_string(),
        "frequency" => entry.frequency.to_string(),
        "unit" => entry.unit().to_string(),
        "callsign" => entry.callsign.clone(),
        "rst" => entry.rst.clone(),
        "memo" => entry.memo.clone(),
        _ => String::new(),
    }
}

/// Encodes records, in the order given, as BOM-prefixed CSV with every
/// field quoted.
pub fn encode(entries: &[LogEntry], schema: CsvSchema) -> Result<String> {
    let columns = schema.columns();
    let mut out = String::new();
    out.push(BOM);
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out.into_bytes());

    writer.write_record(columns)?;
    for entry in entries {
        writer.write_record(columns.iter().map(|c| cell(entry, c)))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| RadioLogError::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| RadioLogError::Format(e.to_string()))
}

/// Column positions resolved from the header row by name.
#[derive(Debug, Default)]
struct ColumnMap {
    uuid: Option<usize>,
    timestamp: Option<usize>,
    band: Option<usize>,
    frequency: Option<usize>,
    callsign: Option<usize>,
    rst: Option<usize>,
    memo: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let mut map = ColumnMap::default();
        for (i, name) in headers.iter().enumerate() {
            let slot = match name.to_ascii_lowercase().as_str() {
                "uuid" => &mut map.uuid,
                "timestamp" => &mut map.timestamp,
                "band" => &mut map.band,
                "frequency" => &mut map.frequency,
                "callsign" => &mut map.callsign,
                "rst" => &mut map.rst,
                "memo" => &mut map.memo,
                _ => continue,
            };
            // First occurrence wins.
            slot.get_or_insert(i);
        }

        let missing: Vec<&str> = [
            ("timestamp", map.timestamp),
            ("band", map.band),
            ("frequency", map.frequency),
        ]
        .into_iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name)
        .collect();
        if !missing.is_empty() {
            return Err(RadioLogError::Format(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        Ok(map)
    }

    fn row(&self, record: &csv::StringRecord) -> CsvRow {
        let get = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i)).unwrap_or_default().to_string()
        };
        CsvRow {
            uuid: get(self.uuid),
            timestamp: get(self.timestamp),
            band: get(self.band),
            frequency: parse_frequency(&get(self.frequency)),
            callsign: get(self.callsign),
            rst: get(self.rst),
            memo: get(self.memo),
        }
    }
}

fn read_error(e: csv::Error) -> RadioLogError {
    match e.position() {
        Some(pos) => RadioLogError::Format(format!("line {}: {}", pos.line(), e)),
        None => RadioLogError::Format(e.to_string()),
    }
}

/// Decodes CSV text into rows.
///
/// Quoted fields may span lines. A quote only opens a quoted field at the
/// start of that field; elsewhere it is literal text. Fails with a format
/// error when there is no header, no data row, or any of `timestamp`,
/// `band`, `frequency` is missing from the header.
pub fn decode(text: &str) -> Result<Vec<CsvRow>> {
    let text = text.strip_prefix(BOM).unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers().map_err(read_error)?.clone();
    if headers.iter().all(str::is_empty) {
        return Err(RadioLogError::Format("file is empty".to_string()));
    }
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(read_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(columns.row(&record));
    }
    if rows.is_empty() {
        return Err(RadioLogError::Format("no data rows".to_string()));
    }
    Ok(rows)
}
