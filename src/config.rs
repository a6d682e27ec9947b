// src/config.rs

use crate::error::{RadioLogError, Result};
use std::path::PathBuf;

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub db_path: PathBuf,
    pub page_size: usize,
}

/// Standard database location (~/.config/radiolog/radiolog.db).
pub fn default_db_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(RadioLogError::HomeDirNotFound)?;
    Ok(home_dir.join(".config/radiolog/radiolog.db"))
}

impl Settings {
    /// `db` comes from `--db` or `RADIOLOG_DB`; without either the default path is used.
    pub fn resolve(db: Option<PathBuf>, page_size: usize) -> Result<Self> {
        if page_size == 0 {
            return Err(RadioLogError::Validation(
                "Page size must be at least 1.".to_string(),
            ));
        }
        let db_path = match db {
            Some(path) => path,
            None => default_db_path()?,
        };
        Ok(Settings { db_path, page_size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let settings = Settings::resolve(Some(PathBuf::from("/tmp/x.db")), 20).unwrap();
        assert_eq!(settings.db_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(settings.page_size, 20);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let err = Settings::resolve(Some(PathBuf::from("x.db")), 0).unwrap_err();
        assert!(matches!(err, RadioLogError::Validation(_)));
    }
}
