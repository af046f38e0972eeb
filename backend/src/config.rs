//! Application configuration
//!
//! Central location for configuration constants, query defaults and
//! the runtime [`AppConfig`] used to locate the database.

use std::path::PathBuf;
use std::time::Duration;

// ===== Listing Defaults =====

/// Page used when the requested page is absent or below 1
pub const DEFAULT_PAGE: i64 = 1;
/// Page size used when the requested size is absent or below 1
pub const DEFAULT_PAGE_SIZE: i64 = 6;

/// Note columns a keyword search may target.
/// Field filters naming anything else are ignored.
pub const SEARCHABLE_FIELDS: &[&str] = &["title", "mood", "tag", "content"];

// ===== Statistics =====

/// Number of moods returned by the mood statistics when no limit is given
pub const DEFAULT_MOOD_LIMIT: i64 = 7;

/// Weekday names in the order statistics are reported (Sunday first)
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

// ===== Attachments =====

/// MIME type reported when nothing more specific can be determined
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// MIME type reported for payloads that sniff as printable UTF-8 text
pub const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Maximum stored filename length in characters
pub const MAX_FILENAME_LENGTH: usize = 255;

/// Name stored when an upload's filename sanitizes to nothing
pub const UNTITLED_FILENAME: &str = "untitled";

// ===== Database =====

/// Default database file name inside the data directory
pub const DEFAULT_DATABASE_FILE: &str = "mash-notes-db.sqlite";

/// Connections in the application pool
pub const POOL_MAX_CONNECTIONS: u32 = 5;

/// How long SQLite waits on a locked database before failing the statement
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Runtime configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub database_file: String,
}

impl AppConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            database_file: DEFAULT_DATABASE_FILE.to_string(),
        }
    }

    /// Build from `MASHNOTES_DATA_DIR` and `MASHNOTES_DB_FILE`, falling back
    /// to `./data` and [`DEFAULT_DATABASE_FILE`].
    pub fn from_env() -> Self {
        let data_dir = std::env::var("MASHNOTES_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        let mut config = Self::new(data_dir);
        if let Ok(file) = std::env::var("MASHNOTES_DB_FILE") {
            if !file.trim().is_empty() {
                config.database_file = file;
            }
        }
        config
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_path_joins_data_dir() {
        let config = AppConfig::new("/tmp/notes");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/notes/mash-notes-db.sqlite")
        );
    }

    #[test]
    fn test_weekdays_start_on_sunday() {
        assert_eq!(WEEKDAY_NAMES[0], "Sunday");
        assert_eq!(WEEKDAY_NAMES[6], "Saturday");
    }
}
