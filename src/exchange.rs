// src/exchange.rs
//
// End-to-end export and import built from the store, the CSV codec and the
// deduplicator.

use crate::csv_codec::{self, CsvRow, CsvSchema};
use crate::dedup::Deduplicator;
use crate::error::Result;
use crate::models::{parse_timestamp, Band, NewLogEntry};
use crate::store::LogStore;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Receives finished export text.
pub trait FileDelivery {
    /// Saves `text` under `filename` and returns where it went.
    fn deliver(&self, filename: &str, text: &str) -> Result<PathBuf>;
}

/// Supplies the raw text of a file chosen for import.
pub trait FileSource {
    fn read_text(&self) -> Result<String>;
}

/// Writes exports into a directory.
pub struct DirectoryDelivery {
    dir: PathBuf,
}

impl DirectoryDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        DirectoryDelivery { dir: dir.into() }
    }
}

impl FileDelivery for DirectoryDelivery {
    fn deliver(&self, filename: &str, text: &str) -> Result<PathBuf> {
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)?;
        }
        let path = self.dir.join(filename);
        std::fs::write(&path, text)?;
        Ok(path)
    }
}

/// Reads an import file from disk.
pub struct PathSource {
    path: PathBuf,
}

impl PathSource {
    pub fn new(path: &Path) -> Self {
        PathSource { path: path.to_path_buf() }
    }
}

impl FileSource for PathSource {
    fn read_text(&self) -> Result<String> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExportOutcome {
    NothingToExport,
    Delivered { location: PathBuf, count: usize },
}

/// `radiolog_<UTC date-time>_<8 random hex>.csv`. The random part keeps two
/// exports in the same second apart.
pub fn export_filename(now: DateTime<Utc>) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("radiolog_{}_{}.csv", now.format("%Y%m%d_%H%M%S"), &id[..8])
}

/// Snapshots the whole store in display order and delivers it as CSV.
pub fn export_logs(
    store: &dyn LogStore,
    delivery: &dyn FileDelivery,
    schema: CsvSchema,
    now: DateTime<Utc>,
) -> Result<ExportOutcome> {
    let entries = store.all()?;
    if entries.is_empty() {
        info!("export skipped: store is empty");
        return Ok(ExportOutcome::NothingToExport);
    }
    let text = csv_codec::encode(&entries, schema)?;
    let location = delivery.deliver(&export_filename(now), &text)?;
    info!(count = entries.len(), location = %location.display(), "exported logs");
    Ok(ExportOutcome::Delivered { location, count: entries.len() })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accepted: usize,
    pub duplicate: usize,
    /// Rows whose timestamp or band could not be understood.
    pub invalid: usize,
}

impl ImportReport {
    /// Whether the page view must go back to page 1.
    pub fn resets_view(&self) -> bool {
        self.accepted > 0
    }
}

fn row_to_entry(row: CsvRow) -> Result<NewLogEntry> {
    let timestamp = parse_timestamp(&row.timestamp)?;
    let band: Band = row.band.parse()?;
    let mut entry = NewLogEntry::new(band, row.frequency, timestamp)
        .with_callsign(row.callsign)
        .with_rst(row.rst)
        .with_memo(row.memo);
    // An empty uuid stays empty until the deduplicator accepts the row.
    entry.uuid = row.uuid;
    Ok(entry)
}

/// Decodes, filters duplicates, and commits accepted rows in one bulk write.
/// A format error returns before anything is written.
pub fn import_logs(store: &dyn LogStore, source: &dyn FileSource) -> Result<ImportReport> {
    let text = source.read_text()?;
    let rows = csv_codec::decode(&text)?;

    let existing = store.all()?;
    let mut dedup = Deduplicator::from_existing(&existing);
    let mut report = ImportReport::default();
    let mut accepted = Vec::new();

    for (line, row) in rows.into_iter().enumerate() {
        let mut entry = match row_to_entry(row) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(row = line + 1, error = %e, "skipping invalid row");
                report.invalid += 1;
                continue;
            }
        };
        if dedup.check(&mut entry).is_duplicate() {
            report.duplicate += 1;
        } else {
            debug!(row = line + 1, uuid = %entry.uuid, "accepted row");
            accepted.push(entry);
        }
    }

    report.accepted = store.bulk_add(accepted)?;
    info!(
        accepted = report.accepted,
        duplicate = report.duplicate,
        invalid = report.invalid,
        "import finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::error::RadioLogError;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        delivered: RefCell<Vec<(String, String)>>,
    }

    impl FileDelivery for Recorder {
        fn deliver(&self, filename: &str, text: &str) -> Result<PathBuf> {
            self.delivered
                .borrow_mut()
                .push((filename.to_string(), text.to_string()));
            Ok(PathBuf::from(filename))
        }
    }

    struct Text(String);

    impl FileSource for Text {
        fn read_text(&self) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    fn add(store: &SqliteStore, ts: &str, freq: f64, memo: &str) -> crate::models::LogEntry {
        store
            .add(NewLogEntry::new(Band::Fm, freq, parse_timestamp(ts).unwrap()).with_memo(memo))
            .unwrap()
    }

    fn export_text(store: &SqliteStore) -> String {
        let recorder = Recorder::default();
        export_logs(store, &recorder, CsvSchema::V3, Utc::now()).unwrap();
        let delivered = recorder.delivered.borrow();
        delivered[0].1.clone()
    }

    #[test]
    fn export_of_empty_store_delivers_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        let recorder = Recorder::default();
        let outcome = export_logs(&store, &recorder, CsvSchema::V3, Utc::now()).unwrap();
        assert_eq!(outcome, ExportOutcome::NothingToExport);
        assert!(recorder.delivered.borrow().is_empty());
    }

    #[test]
    fn export_filenames_differ_within_one_second() {
        let now = Utc::now();
        let a = export_filename(now);
        let b = export_filename(now);
        assert_ne!(a, b);
        assert!(a.starts_with(&format!("radiolog_{}_", now.format("%Y%m%d_%H%M%S"))));
        assert!(a.ends_with(".csv"));
    }

    #[test]
    fn reimporting_an_export_is_idempotent() {
        let store = SqliteStore::open_in_memory().unwrap();
        add(&store, "2024-01-01T00:00", 80.0, "one");
        add(&store, "2024-01-02T00:00", 81.0, "two, with \"quotes\"\nand a newline");
        let text = export_text(&store);

        let other = SqliteStore::open_in_memory().unwrap();
        let first = import_logs(&other, &Text(text.clone())).unwrap();
        assert_eq!(first, ImportReport { accepted: 2, duplicate: 0, invalid: 0 });
        let second = import_logs(&other, &Text(text)).unwrap();
        assert_eq!(second, ImportReport { accepted: 0, duplicate: 2, invalid: 0 });
        assert!(!second.resets_view());

        let original = store.all().unwrap();
        let copied = other.all().unwrap();
        for (a, b) in original.iter().zip(&copied) {
            assert_eq!(a.uuid, b.uuid);
            assert_eq!(a.memo, b.memo);
            assert_eq!(a.timestamp, b.timestamp);
            assert_eq!(a.frequency, b.frequency);
            assert_eq!(a.band, b.band);
        }
    }

    #[test]
    fn uuidless_import_is_recognized_on_second_pass() {
        let store = SqliteStore::open_in_memory().unwrap();
        let csv = "timestamp,band,frequency,memo\n2024-01-01T00:00,AM,594,x\n";
        assert_eq!(import_logs(&store, &Text(csv.into())).unwrap().accepted, 1);
        assert!(!store.all().unwrap()[0].uuid.is_empty());

        let exported = export_text(&store);
        let report = import_logs(&store, &Text(exported)).unwrap();
        assert_eq!(report, ImportReport { accepted: 0, duplicate: 1, invalid: 0 });
    }

    #[test]
    fn three_rows_with_one_known_uuid() {
        let store = SqliteStore::open_in_memory().unwrap();
        let known = add(&store, "2023-05-05T05:05", 99.0, "existing");
        let csv = format!(
            "uuid,timestamp,band,frequency,memo\n\
             ,2024-01-01T00:00,FM,80,a\n\
             {},2024-01-02T00:00,FM,81,b\n\
             ,2024-01-03T00:00,FM,82,c\n",
            known.uuid
        );
        let report = import_logs(&store, &Text(csv)).unwrap();
        assert_eq!(report, ImportReport { accepted: 2, duplicate: 1, invalid: 0 });
        assert!(report.resets_view());
        assert_eq!(store.count().unwrap(), 3);
    }

    #[test]
    fn duplicates_within_one_file_are_caught() {
        let store = SqliteStore::open_in_memory().unwrap();
        let csv = "timestamp,band,frequency,memo\n\
                   2024-01-01T00:00,FM,80,same\n\
                   2024-01-01T00:00,FM,80,same\n";
        let report = import_logs(&store, &Text(csv.into())).unwrap();
        assert_eq!(report, ImportReport { accepted: 1, duplicate: 1, invalid: 0 });
    }

    #[test]
    fn missing_frequency_column_writes_nothing() {
        let store = SqliteStore::open_in_memory().unwrap();
        add(&store, "2024-01-01T00:00", 80.0, "keep");
        let csv = "timestamp,band,memo\n2024-01-02T00:00,FM,new\n";
        let err = import_logs(&store, &Text(csv.into())).unwrap_err();
        assert!(matches!(err, RadioLogError::Format(_)));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn invalid_rows_are_skipped_and_counted() {
        let store = SqliteStore::open_in_memory().unwrap();
        let csv = "timestamp,band,frequency\n\
                   not a time,FM,80\n\
                   2024-01-01T00:00,SSB,7.1\n\
                   2024-01-01T00:00,FM,oops\n";
        let report = import_logs(&store, &Text(csv.into())).unwrap();
        assert_eq!(report, ImportReport { accepted: 1, duplicate: 0, invalid: 2 });
        assert!(store.all().unwrap()[0].frequency.is_nan());
    }

    #[test]
    fn directory_delivery_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_in_memory().unwrap();
        add(&store, "2024-01-01T00:00", 80.0, "x");
        let outcome =
            export_logs(&store, &DirectoryDelivery::new(dir.path()), CsvSchema::V3, Utc::now())
                .unwrap();
        let ExportOutcome::Delivered { location, count } = outcome else {
            panic!("expected a delivery");
        };
        assert_eq!(count, 1);
        let text = PathSource::new(&location).read_text().unwrap();
        assert!(text.starts_with(csv_codec::BOM));
    }
}
