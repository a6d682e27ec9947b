// src/store.rs

use crate::error::Result;
use crate::models::{LogEntry, NewLogEntry};

/// The storage primitives the rest of the crate depends on.
///
/// Ordered reads return records by timestamp descending, newest insertion
/// first among equal timestamps.
pub trait LogStore {
    /// Persists one record and returns it with its assigned id.
    fn add(&self, entry: NewLogEntry) -> Result<LogEntry>;

    /// Persists all records or none of them.
    fn bulk_add(&self, entries: Vec<NewLogEntry>) -> Result<usize>;

    fn count(&self) -> Result<usize>;

    fn range_by_time_desc(&self, offset: usize, limit: usize) -> Result<Vec<LogEntry>>;

    fn all(&self) -> Result<Vec<LogEntry>>;

    /// Removes a record. Returns whether anything was removed; a missing id is not an error.
    fn delete(&self, id: i64) -> Result<bool>;
}
