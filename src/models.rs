// src/models.rs

use crate::error::{RadioLogError, Result};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;

/// Naive layouts accepted as UTC, in the order they are tried.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Am,
    Fm,
    Usb,
    Lsb,
    Cw,
}

impl Band {
    pub const ALL: [Band; 5] = [Band::Am, Band::Fm, Band::Usb, Band::Lsb, Band::Cw];

    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Am => "AM",
            Band::Fm => "FM",
            Band::Usb => "USB",
            Band::Lsb => "LSB",
            Band::Cw => "CW",
        }
    }

    /// AM is tuned in kHz, everything else in MHz.
    pub fn unit(&self) -> &'static str {
        match self {
            Band::Am => "kHz",
            Band::Fm | Band::Usb | Band::Lsb | Band::Cw => "MHz",
        }
    }

    fn precision(&self) -> usize {
        match self {
            Band::Am => 1,
            _ => 3,
        }
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Band {
    type Err = RadioLogError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Band::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RadioLogError::Validation(format!("Unknown band: {:?}", s)))
    }
}

/// A record as it exists before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLogEntry {
    pub uuid: String,
    pub band: Band,
    pub frequency: f64,
    pub callsign: String,
    pub rst: String,
    pub memo: String,
    pub timestamp: DateTime<Utc>,
}

impl NewLogEntry {
    /// Builds a record with a freshly generated identity.
    pub fn new(band: Band, frequency: f64, timestamp: DateTime<Utc>) -> Self {
        NewLogEntry {
            uuid: new_uuid(),
            band,
            frequency,
            callsign: String::new(),
            rst: String::new(),
            memo: String::new(),
            timestamp: timestamp.trunc_subsecs(0),
        }
    }

    pub fn with_callsign(mut self, callsign: impl Into<String>) -> Self {
        self.callsign = callsign.into();
        self
    }

    pub fn with_rst(mut self, rst: impl Into<String>) -> Self {
        self.rst = rst.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// A persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub id: i64,
    pub uuid: String,
    pub band: Band,
    pub frequency: f64,
    pub callsign: String,
    pub rst: String,
    pub memo: String,
    pub timestamp: DateTime<Utc>,
}

impl LogEntry {
    pub fn from_new(id: i64, entry: NewLogEntry) -> Self {
        LogEntry {
            id,
            uuid: entry.uuid,
            band: entry.band,
            frequency: entry.frequency,
            callsign: entry.callsign,
            rst: entry.rst,
            memo: entry.memo,
            timestamp: entry.timestamp,
        }
    }

    pub fn unit(&self) -> &'static str {
        self.band.unit()
    }

    pub fn display_frequency(&self) -> String {
        format_frequency(self.frequency, self.band)
    }

    pub fn display_timestamp(&self) -> String {
        format!("{} UTC", self.timestamp.format("%Y-%m-%d %H:%M"))
    }
}

pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fixed-precision frequency with the band's unit, e.g. `7.100 MHz`.
pub fn format_frequency(frequency: f64, band: Band) -> String {
    format!("{:.*} {}", band.precision(), frequency, band.unit())
}

/// Parses a frequency, mapping anything that is not a finite number to NaN.
pub fn parse_frequency(s: &str) -> f64 {
    match s.trim().parse::<f64>() {
        Ok(f) if f.is_finite() => f,
        _ => f64::NAN,
    }
}

/// Parses an RFC 3339 instant or a naive date-time taken as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc().trunc_subsecs(0))
        .ok_or_else(|| RadioLogError::Validation(format!("Invalid timestamp: {:?}", s)))
}

/// Canonical stored form. Sorts lexicographically in time order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn band_parsing_is_case_insensitive() {
        assert_eq!("usb".parse::<Band>().unwrap(), Band::Usb);
        assert_eq!(" AM ".parse::<Band>().unwrap(), Band::Am);
        assert!(matches!(
            "SSB".parse::<Band>(),
            Err(RadioLogError::Validation(_))
        ));
    }

    #[test]
    fn band_determines_unit() {
        assert_eq!(Band::Am.unit(), "kHz");
        for band in [Band::Fm, Band::Usb, Band::Lsb, Band::Cw] {
            assert_eq!(band.unit(), "MHz");
        }
    }

    #[test]
    fn frequency_display_uses_fixed_precision() {
        assert_eq!(format_frequency(594.0, Band::Am), "594.0 kHz");
        assert_eq!(format_frequency(7.1, Band::Cw), "7.100 MHz");
        assert_eq!(format_frequency(f64::NAN, Band::Fm), "NaN MHz");
    }

    #[test]
    fn frequency_parse_failure_is_nan() {
        assert_eq!(parse_frequency(" 14.074 "), 14.074);
        assert!(parse_frequency("abc").is_nan());
        assert!(parse_frequency("").is_nan());
        assert!(parse_frequency("inf").is_nan());
    }

    #[test]
    fn timestamps_normalize_to_utc_seconds() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-01T12:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2024-03-01T12:30:00.750Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2024-03-01T21:30:00+09:00").unwrap(),
            expected
        );
        assert_eq!(format_timestamp(&expected), "2024-03-01T12:30:00Z");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn new_entries_get_distinct_uuids() {
        let ts = Utc::now();
        let a = NewLogEntry::new(Band::Fm, 80.0, ts);
        let b = NewLogEntry::new(Band::Fm, 80.0, ts);
        assert_ne!(a.uuid, b.uuid);
        assert_eq!(a.callsign, "");
    }
}
