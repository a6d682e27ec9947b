// src/db.rs

use crate::error::{RadioLogError, Result};
use crate::models::{format_timestamp, new_uuid, Band, LogEntry, NewLogEntry};
use crate::store::LogStore;
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Row};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

const SELECT_COLUMNS: &str =
    "SELECT id, uuid, band, frequency, callsign, rst, memo, timestamp FROM logs";
const ORDER_DISPLAY: &str = "ORDER BY timestamp DESC, id DESC";

/// How a missing or empty field gets its value.
#[derive(Clone, Copy)]
enum Fill {
    Empty,
    FreshUuid,
}

/// A field that older stores may lack, and how to backfill it.
struct BackfillRule {
    column: &'static str,
    fill: Fill,
}

/// Applied in order on every open. Each rule is keyed on the column's
/// presence and on NULL/empty values, never on a version number.
const BACKFILL_RULES: [BackfillRule; 4] = [
    BackfillRule { column: "memo", fill: Fill::Empty },
    BackfillRule { column: "callsign", fill: Fill::Empty },
    BackfillRule { column: "rst", fill: Fill::Empty },
    BackfillRule { column: "uuid", fill: Fill::FreshUuid },
];

/// rusqlite-backed record store.
pub struct SqliteStore {
    conn: Connection,
    backfilled: usize,
}

impl SqliteStore {
    /// Opens the database file, creating it and its directory if needed,
    /// and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), "opened log store");
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    pub fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                band TEXT NOT NULL,
                frequency REAL,
                timestamp TEXT NOT NULL
            )",
            [],
        )?;
        let mut store = SqliteStore { conn, backfilled: 0 };
        store.backfilled = store.migrate()?;
        store.conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_logs_display ON logs (timestamp DESC, id DESC);
             CREATE UNIQUE INDEX IF NOT EXISTS idx_logs_uuid ON logs (uuid);",
        )?;
        Ok(store)
    }

    /// Number of field values filled in when the store was opened.
    pub fn backfilled(&self) -> usize {
        self.backfilled
    }

    /// Adds missing optional columns and fills absent values. Ids, timestamps
    /// and row order are never touched. Runs in one transaction, so a failure
    /// leaves the store as it was.
    pub fn migrate(&self) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let existing = column_names(&tx)?;
        let mut filled = 0;

        for rule in &BACKFILL_RULES {
            if !existing.contains(rule.column) {
                let ddl = match rule.fill {
                    Fill::Empty => format!(
                        "ALTER TABLE logs ADD COLUMN {} TEXT NOT NULL DEFAULT ''",
                        rule.column
                    ),
                    Fill::FreshUuid => format!("ALTER TABLE logs ADD COLUMN {} TEXT", rule.column),
                };
                tx.execute(&ddl, [])?;
                debug!(column = rule.column, "added column");
                if let Fill::Empty = rule.fill {
                    let rows: i64 = tx.query_row("SELECT COUNT(*) FROM logs", [], |r| r.get(0))?;
                    filled += rows as usize;
                }
            }

            match rule.fill {
                Fill::Empty => {
                    filled += tx.execute(
                        &format!(
                            "UPDATE logs SET {0} = '' WHERE {0} IS NULL",
                            rule.column
                        ),
                        [],
                    )?;
                }
                Fill::FreshUuid => {
                    let ids = {
                        let mut stmt = tx.prepare(&format!(
                            "SELECT id FROM logs WHERE {0} IS NULL OR {0} = '' ORDER BY id",
                            rule.column
                        ))?;
                        let ids = stmt
                            .query_map([], |row| row.get::<_, i64>(0))?
                            .collect::<std::result::Result<Vec<_>, _>>()?;
                        ids
                    };
                    let mut update = tx.prepare(&format!(
                        "UPDATE logs SET {} = ?1 WHERE id = ?2",
                        rule.column
                    ))?;
                    for id in &ids {
                        update.execute(params![new_uuid(), id])?;
                    }
                    filled += ids.len();
                }
            }
        }

        tx.commit()?;
        if filled > 0 {
            info!(filled, "backfilled missing fields");
        }
        Ok(filled)
    }

    fn query_entries(&self, sql: &str, params: impl rusqlite::Params) -> Result<Vec<LogEntry>> {
        let mut stmt = self.conn.prepare(sql)?;
        let logs = stmt
            .query_map(params, row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(logs)
    }
}

impl LogStore for SqliteStore {
    fn add(&self, mut entry: NewLogEntry) -> Result<LogEntry> {
        if entry.uuid.is_empty() {
            entry.uuid = new_uuid();
        }
        insert(&self.conn, &entry)?;
        let id = self.conn.last_insert_rowid();
        debug!(id, uuid = %entry.uuid, "stored log entry");
        Ok(LogEntry::from_new(id, entry))
    }

    fn bulk_add(&self, entries: Vec<NewLogEntry>) -> Result<usize> {
        if entries.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.unchecked_transaction()?;
        for mut entry in entries.iter().cloned() {
            if entry.uuid.is_empty() {
                entry.uuid = new_uuid();
            }
            insert(&tx, &entry)?;
        }
        tx.commit()?;
        info!(count = entries.len(), "bulk stored log entries");
        Ok(entries.len())
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn range_by_time_desc(&self, offset: usize, limit: usize) -> Result<Vec<LogEntry>> {
        let sql = format!("{} {} LIMIT ?1 OFFSET ?2", SELECT_COLUMNS, ORDER_DISPLAY);
        self.query_entries(&sql, params![limit as i64, offset as i64])
    }

    fn all(&self) -> Result<Vec<LogEntry>> {
        let sql = format!("{} {}", SELECT_COLUMNS, ORDER_DISPLAY);
        self.query_entries(&sql, [])
    }

    fn delete(&self, id: i64) -> Result<bool> {
        let count = self.conn.execute("DELETE FROM logs WHERE id = ?1", [id])?;
        Ok(count > 0)
    }
}

fn insert(conn: &Connection, entry: &NewLogEntry) -> Result<()> {
    // SQLite turns NaN into NULL; bind it explicitly so reads map it back.
    let frequency = (!entry.frequency.is_nan()).then_some(entry.frequency);
    conn.execute(
        "INSERT INTO logs (uuid, band, frequency, callsign, rst, memo, timestamp)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.uuid,
            entry.band.as_str(),
            frequency,
            entry.callsign,
            entry.rst,
            entry.memo,
            format_timestamp(&entry.timestamp),
        ],
    )?;
    Ok(())
}

fn column_names(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('logs')")?;
    let names = stmt
        .query_map([], |row| row.get(0))?
        .collect::<std::result::Result<HashSet<String>, _>>()?;
    Ok(names)
}

fn conversion_error(idx: usize, err: RadioLogError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn row_to_entry(row: &Row<'_>) -> rusqlite::Result<LogEntry> {
    let band: String = row.get(2)?;
    let band: Band = band.parse().map_err(|e| conversion_error(2, e))?;
    let timestamp: String = row.get(7)?;
    let timestamp: DateTime<Utc> =
        crate::models::parse_timestamp(&timestamp).map_err(|e| conversion_error(7, e))?;
    Ok(LogEntry {
        id: row.get(0)?,
        uuid: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        band,
        frequency: row.get::<_, Option<f64>>(3)?.unwrap_or(f64::NAN),
        callsign: row.get(4)?,
        rst: row.get(5)?,
        memo: row.get(6)?,
        timestamp,
    })
}
