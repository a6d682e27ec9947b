// src/error.rs

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RadioLogError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage Error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV format error: {0}")]
    Format(String),

    #[error("Editor exited with a non-zero status")]
    EditorError,
}

pub type Result<T> = std::result::Result<T, RadioLogError>;
