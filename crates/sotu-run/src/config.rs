use anyhow::{Context, Result};
use sotu_store::db::DEFAULT_TABLE;
use sotu_store::files::{DEFAULT_ARCHIVE_FILE, DEFAULT_OUTPUT_DIR};
use sotu_store::{validate_identifier, StoreError};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SQL_SERVER: &str = ".";
pub const DEFAULT_SQL_DATABASE: &str = "STATE_UNION_ADDRESSES";

/// Run configuration loaded from environment variables.
///
/// `SQL_SERVER` is the directory holding the database file and
/// `SQL_DATABASE` its name; the file is `<SQL_SERVER>/<SQL_DATABASE>.db`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub sql_server: String,
    pub sql_database: String,
    pub table: String,
    pub output_dir: PathBuf,
    pub archive_file: PathBuf,
    pub timeout: Duration,
    pub delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sql_server: DEFAULT_SQL_SERVER.to_string(),
            sql_database: DEFAULT_SQL_DATABASE.to_string(),
            table: DEFAULT_TABLE.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            archive_file: PathBuf::from(DEFAULT_ARCHIVE_FILE),
            timeout: Duration::from_secs(30),
            delay: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let timeout = match lookup("SOTU_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse().context("SOTU_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            None => defaults.timeout,
        };
        let delay = match lookup("SOTU_DELAY_MS") {
            Some(v) => Duration::from_millis(
                v.parse().context("SOTU_DELAY_MS must be a whole number of milliseconds")?,
            ),
            None => defaults.delay,
        };

        Ok(Self {
            sql_server: lookup("SQL_SERVER").unwrap_or(defaults.sql_server),
            sql_database: lookup("SQL_DATABASE").unwrap_or(defaults.sql_database),
            table: defaults.table,
            output_dir: lookup("SOTU_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            archive_file: lookup("SOTU_ARCHIVE_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.archive_file),
            timeout,
            delay,
        })
    }

    /// Check the identifiers that end up in SQL text.
    pub fn validate(&self) -> Result<(), StoreError> {
        validate_identifier(&self.sql_database, "database name")?;
        validate_identifier(&self.table, "table name")
    }

    pub fn database_path(&self) -> PathBuf {
        Path::new(&self.sql_server).join(format!("{}.db", self.sql_database))
    }
}
