// src/commands.rs

use crate::config::Settings;
use crate::csv_codec::CsvSchema;
use crate::db::SqliteStore;
use crate::error::{RadioLogError, Result};
use crate::exchange::{self, DirectoryDelivery, ExportOutcome, PathSource};
use crate::models::{parse_timestamp, Band, NewLogEntry};
use crate::pagination::{Page, Paginator};
use crate::store::LogStore;
use chrono::Utc;
use std::collections::BTreeSet;
use std::env;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::Command;

/// Fields typed by the operator for a new entry.
#[derive(Debug, Default)]
pub struct LogInput {
    pub band: String,
    pub freq: String,
    pub call: Option<String>,
    pub rst: Option<String>,
    pub memo: Option<String>,
    pub edit: bool,
    pub time: Option<String>,
}

fn nav(enabled: bool, target: usize) -> String {
    if enabled { format!("--page {}", target) } else { "-".to_string() }
}

fn render_page(page: &Page) {
    if page.entries.is_empty() {
        println!("No logs yet.");
    }
    for log in &page.entries {
        let mut header = format!(
            "[{}] {} | {} {}",
            log.id,
            log.display_timestamp(),
            log.band,
            log.display_frequency()
        );
        if !log.callsign.is_empty() {
            header.push_str(&format!(" | {}", log.callsign));
        }
        if !log.rst.is_empty() {
            header.push_str(&format!(" | RST {}", log.rst));
        }
        println!("{}", header);
        if !log.memo.is_empty() {
            println!("{}", log.memo.trim_end());
        }
        println!("{}", "─".repeat(40));
    }
    let state = page.state;
    println!(
        "Page {}/{} ({} logs) | prev: {} | next: {}",
        state.page,
        state.total_pages.max(1),
        state.total,
        nav(state.has_prev(), state.prev()),
        nav(state.has_next(), state.next())
    );
}

fn show_page(store: &SqliteStore, settings: &Settings, page: usize) -> Result<()> {
    let page = Paginator::new(settings.page_size).fetch_page(store, page)?;
    render_page(&page);
    Ok(())
}

/// Handles the 'init' command.
pub fn handle_init(settings: &Settings) -> Result<()> {
    let store = SqliteStore::open(&settings.db_path)?;
    println!("✓ Database ready at: {:?}", settings.db_path);
    match store.backfilled() {
        0 => println!("✓ All records are up to date."),
        n => println!("✓ Backfilled {} missing field value(s).", n),
    }
    Ok(())
}

fn memo_from_editor() -> Result<String> {
    let temp_file = tempfile::NamedTempFile::new()?;
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = Command::new(&editor).arg(temp_file.path()).status()?;

    if !status.success() {
        return Err(RadioLogError::EditorError);
    }
    let mut buf = String::new();
    temp_file.reopen()?.read_to_string(&mut buf)?;
    Ok(buf.trim_end().to_string())
}

/// Turns operator input into a record, rejecting malformed required fields.
pub fn build_entry(input: LogInput) -> Result<NewLogEntry> {
    let band: Band = input.band.parse()?;
    let frequency = match input.freq.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => f,
        _ => {
            return Err(RadioLogError::Validation(format!(
                "Invalid frequency: {:?}",
                input.freq
            )))
        }
    };
    let timestamp = match input.time.as_deref() {
        Some(t) => parse_timestamp(t)?,
        None => Utc::now(),
    };
    let memo = if input.edit {
        memo_from_editor()?
    } else {
        input.memo.unwrap_or_default()
    };

    Ok(NewLogEntry::new(band, frequency, timestamp)
        .with_callsign(input.call.unwrap_or_default().trim().to_uppercase())
        .with_rst(input.rst.unwrap_or_default().trim().to_string())
        .with_memo(memo))
}

/// Handles the 'log' command.
pub fn handle_log(settings: &Settings, input: LogInput) -> Result<()> {
    let entry = build_entry(input)?;
    let store = SqliteStore::open(&settings.db_path)?;
    let saved = store.add(entry)?;
    println!("✓ Log #{} recorded.", saved.id);
    show_page(&store, settings, 1)
}

/// Handles the 'list' command.
pub fn handle_list(settings: &Settings, page: usize) -> Result<()> {
    let store = SqliteStore::open(&settings.db_path)?;
    show_page(&store, settings, page)
}

/// Parses an ID list such as "1,3,5-7" into sorted, distinct IDs.
fn parse_id_range(s: &str) -> Result<Vec<i64>> {
    let mut ids = BTreeSet::new();
    for part in s.split(',') {
        let part = part.trim();
        if part.contains('-') {
            let mut range_parts = part.splitn(2, '-');
            let start_str = range_parts.next().unwrap_or("").trim();
            let end_str = range_parts.next().unwrap_or("").trim();

            if start_str.is_empty() || end_str.is_empty() {
                return Err(RadioLogError::Validation(format!("Invalid range: {}", part)));
            }
            let start: i64 = start_str
                .parse()
                .map_err(|_| RadioLogError::Validation(format!("Invalid ID: {}", start_str)))?;
            let end: i64 = end_str
                .parse()
                .map_err(|_| RadioLogError::Validation(format!("Invalid ID: {}", end_str)))?;

            if start > end {
                return Err(RadioLogError::Validation(format!(
                    "Start of range {} cannot be greater than end {}",
                    start, end
                )));
            }
            ids.extend(start..=end);
        } else if !part.is_empty() {
            let id: i64 = part
                .parse()
                .map_err(|_| RadioLogError::Validation(format!("Invalid ID: {}", part)))?;
            ids.insert(id);
        }
    }
    Ok(ids.into_iter().collect())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Handles the 'del' command.
pub fn handle_del(settings: &Settings, ids_str: &str, page: usize, yes: bool) -> Result<()> {
    let ids_to_delete = parse_id_range(ids_str)?;
    if ids_to_delete.is_empty() {
        println!("No valid log IDs to delete.");
        return Ok(());
    }

    if !yes {
        println!(
            "You are about to permanently delete the following log IDs: {:?}",
            ids_to_delete
        );
        if !confirm("Confirm deletion?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let store = SqliteStore::open(&settings.db_path)?;
    let paginator = Paginator::new(settings.page_size);
    let before = paginator.fetch_page(&store, page)?.state;

    let mut removed = 0;
    for id in &ids_to_delete {
        if store.delete(*id)? {
            removed += 1;
        }
    }
    println!("✓ Deleted {} log(s).", removed);

    let next = before.after_delete(store.count()?, paginator.page_size());
    show_page(&store, settings, next)
}

/// Handles the 'export' command.
pub fn handle_export(settings: &Settings, dir: Option<PathBuf>, schema: &str) -> Result<()> {
    let schema: CsvSchema = schema.parse()?;
    let dir = match dir {
        Some(d) => d,
        None => env::current_dir()?,
    };
    let store = SqliteStore::open(&settings.db_path)?;
    match exchange::export_logs(&store, &DirectoryDelivery::new(dir), schema, Utc::now())? {
        ExportOutcome::NothingToExport => println!("Nothing to export."),
        ExportOutcome::Delivered { location, count } => {
            println!("✓ Exported {} log(s) to {}", count, location.display())
        }
    }
    Ok(())
}

/// Handles the 'import' command.
pub fn handle_import(settings: &Settings, file: PathBuf) -> Result<()> {
    let store = SqliteStore::open(&settings.db_path)?;
    let report = exchange::import_logs(&store, &PathSource::new(&file))?;
    println!(
        "✓ Imported {} log(s), skipped {} duplicate(s) and {} invalid row(s).",
        report.accepted, report.duplicate, report.invalid
    );
    if report.resets_view() {
        show_page(&store, settings, 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_ranges_are_sorted_and_deduplicated() {
        assert_eq!(parse_id_range("3,7-9, 12,8").unwrap(), vec![3, 7, 8, 9, 12]);
        assert!(parse_id_range("9-7").is_err());
        assert!(parse_id_range("x").is_err());
        assert!(parse_id_range("3-").is_err());
    }

    #[test]
    fn build_entry_validates_required_fields() {
        let entry = build_entry(LogInput {
            band: "lsb".into(),
            freq: "3.675".into(),
            call: Some(" ja1abc ".into()),
            rst: Some("57".into()),
            memo: Some("ragchew".into()),
            time: Some("2024-05-05T10:00".into()),
            ..LogInput::default()
        })
        .unwrap();
        assert_eq!(entry.band, Band::Lsb);
        assert_eq!(entry.callsign, "JA1ABC");
        assert_eq!(entry.memo, "ragchew");
        assert!(!entry.uuid.is_empty());

        let bad_freq = build_entry(LogInput {
            band: "FM".into(),
            freq: "eighty".into(),
            ..LogInput::default()
        });
        assert!(matches!(bad_freq, Err(RadioLogError::Validation(_))));

        let bad_band = build_entry(LogInput {
            band: "2m".into(),
            freq: "145.5".into(),
            ..LogInput::default()
        });
        assert!(matches!(bad_band, Err(RadioLogError::Validation(_))));
    }

    #[test]
    fn handlers_work_against_a_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            db_path: dir.path().join("radiolog.db"),
            page_size: 10,
        };
        handle_init(&settings).unwrap();
        handle_log(
            &settings,
            LogInput {
                band: "AM".into(),
                freq: "594".into(),
                memo: Some("news".into()),
                ..LogInput::default()
            },
        )
        .unwrap();

        let out_dir = dir.path().join("out");
        handle_export(&settings, Some(out_dir.clone()), "v3").unwrap();
        let exported = std::fs::read_dir(&out_dir).unwrap().next().unwrap().unwrap().path();
        handle_import(&settings, exported).unwrap();

        let store = SqliteStore::open(&settings.db_path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        handle_del(&settings, "1", 1, true).unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
