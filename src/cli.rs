// src/cli.rs

use clap::{Parser, Subcommand};
use crate::pagination::DEFAULT_PAGE_SIZE;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "radiolog - A short-wave and amateur-radio logbook for the command line",
    long_about = "radiolog records reception and contact events (band, frequency, callsign, signal report, memo, UTC time), lets you page through them, and exchanges them with other devices as CSV without creating duplicates."
)]
pub struct Cli {
    /// Database file. Defaults to ~/.config/radiolog/radiolog.db
    #[arg(long, global = true, env = "RADIOLOG_DB", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Records shown per page.
    #[arg(long, global = true, env = "RADIOLOG_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Creates the database if needed and backfills fields missing from older records.
    Init,

    /// Records a new log entry and shows the first page.
    Log {
        #[arg(short, long, help = "Band: AM, FM, USB, LSB or CW")]
        band: String,

        #[arg(short, long, help = "Frequency (kHz for AM, MHz otherwise)")]
        freq: String,

        #[arg(short, long, help = "Callsign of the station heard or worked")]
        call: Option<String>,

        #[arg(short, long, help = "Signal report, e.g. 59")]
        rst: Option<String>,

        #[arg(short, long, conflicts_with = "edit", help = "A short free-text memo")]
        memo: Option<String>,

        #[arg(short, long, help = "Write the memo in $EDITOR")]
        edit: bool,

        #[arg(short, long, help = "UTC time (YYYY-MM-DDTHH:MM or RFC 3339). Defaults to now")]
        time: Option<String>,
    },

    /// Shows one page of log entries, newest first.
    List {
        #[arg(short, long, default_value_t = 1, help = "Page number to show")]
        page: usize,
    },

    /// Deletes one or more log entries.
    #[command(verbatim_doc_comment)]
    Del {
        /// A list of log IDs to delete.
        /// Can be a single ID, comma-separated IDs, or a range.
        /// Examples:
        ///   radiolog del 5          (deletes log #5)
        ///   radiolog del 3,5,8      (deletes logs #3, #5, #8)
        ///   radiolog del 7-9        (deletes logs #7, #8, #9)
        #[arg(value_name = "ID_LIST")]
        ids: String,

        #[arg(short, long, default_value_t = 1, help = "Page being viewed when deleting")]
        page: usize,

        #[arg(short, long, help = "Skip the confirmation prompt")]
        yes: bool,
    },

    /// Writes every entry to a CSV file.
    Export {
        #[arg(short, long, help = "Directory to write into. Defaults to the current directory")]
        dir: Option<PathBuf>,

        #[arg(short, long, default_value = "v3", help = "Column set: v1, v2 or v3")]
        schema: String,
    },

    /// Reads entries from a CSV file, skipping ones already present.
    Import {
        #[arg(help = "CSV file to import")]
        file: PathBuf,
    },
}
