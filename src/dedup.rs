// src/dedup.rs

use crate::models::{format_timestamp, new_uuid, LogEntry, NewLogEntry};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

const SEPARATOR: u8 = 0x1f;

/// Content key over `(timestamp, frequency, memo)`.
///
/// Band, callsign and rst are not part of the key, so two distinct contacts
/// sharing all three values collide and the later one is treated as a
/// duplicate.
pub fn fingerprint(timestamp: &DateTime<Utc>, frequency: f64, memo: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format_timestamp(timestamp).as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(frequency.to_string().as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(memo.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    DuplicateIdentity,
    DuplicateContent,
}

impl Verdict {
    pub fn is_duplicate(&self) -> bool {
        !matches!(self, Verdict::Accepted)
    }
}

/// Known identities and fingerprints for one import pass.
#[derive(Debug, Default)]
pub struct Deduplicator {
    uuids: HashSet<String>,
    fingerprints: HashSet<String>,
}

impl Deduplicator {
    /// Seeds the sets from the records already in the store.
    pub fn from_existing<'a>(existing: impl IntoIterator<Item = &'a LogEntry>) -> Self {
        let mut dedup = Deduplicator::default();
        for entry in existing {
            if !entry.uuid.is_empty() {
                dedup.uuids.insert(entry.uuid.clone());
            }
            dedup
                .fingerprints
                .insert(fingerprint(&entry.timestamp, entry.frequency, &entry.memo));
        }
        dedup
    }

    /// Classifies a candidate. On acceptance the candidate gets a uuid if it
    /// had none, and both sets are updated so later rows in the same pass are
    /// checked against it.
    pub fn check(&mut self, candidate: &mut NewLogEntry) -> Verdict {
        if !candidate.uuid.is_empty() && self.uuids.contains(&candidate.uuid) {
            debug!(uuid = %candidate.uuid, "duplicate identity");
            return Verdict::DuplicateIdentity;
        }

        let key = fingerprint(&candidate.timestamp, candidate.frequency, &candidate.memo);
        if self.fingerprints.contains(&key) {
            debug!(fingerprint = %key, "duplicate content");
            return Verdict::DuplicateContent;
        }

        if candidate.uuid.is_empty() {
            candidate.uuid = new_uuid();
        }
        self.uuids.insert(candidate.uuid.clone());
        self.fingerprints.insert(key);
        Verdict::Accepted
    }
}
