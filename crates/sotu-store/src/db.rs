use crate::error::StoreError;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use sotu_model::SpeechRecord;
use std::path::Path;

pub const DEFAULT_TABLE: &str = "ADDRESS_TABLE";

/// Whether an upsert created a row or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Inserted,
    Updated,
}

/// SQLite table of speeches keyed on (president, date).
pub struct Database {
    conn: Connection,
    table: String,
}

/// Reject anything that is not `[A-Za-z0-9_]+`.
///
/// Table and database names are interpolated into SQL text, so they are
/// checked before use; every value goes through bound parameters.
pub fn validate_identifier(value: &str, kind: &'static str) -> Result<(), StoreError> {
    let valid = !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier {
            kind,
            value: value.to_string(),
        })
    }
}

impl Database {
    /// Open (creating if needed) the database file and its table.
    pub fn open(path: &Path, table: &str) -> Result<Self, StoreError> {
        validate_identifier(table, "table name")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        tracing::info!(path = %path.display(), table = %table, "Opened database");
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self, StoreError> {
        validate_identifier(table, "table name")?;
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self, StoreError> {
        let db = Self {
            conn,
            table: table.to_string(),
        };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
              NAME_OF_PRESIDENT     TEXT NOT NULL,
              DATE_OF_UNION_ADDRESS DATE NOT NULL,
              LINK_TO_ADDRESS       TEXT NOT NULL UNIQUE,
              FILENAME_ADDRESS      TEXT NOT NULL,
              TEXT_OF_ADDRESS       TEXT NOT NULL,
              UNIQUE (NAME_OF_PRESIDENT, DATE_OF_UNION_ADDRESS)
            );
            "#,
            table = self.table
        ))?;
        Ok(())
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Insert the record, or overwrite the row with the same (president, date).
    pub fn upsert(&self, record: &SpeechRecord) -> rusqlite::Result<UpsertAction> {
        let existed = self.exists(&record.president_name, record.speech_date)?;

        self.conn.execute(
            &format!(
                r#"
                INSERT INTO {table} (
                  NAME_OF_PRESIDENT, DATE_OF_UNION_ADDRESS, LINK_TO_ADDRESS,
                  FILENAME_ADDRESS, TEXT_OF_ADDRESS
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(NAME_OF_PRESIDENT, DATE_OF_UNION_ADDRESS) DO UPDATE SET
                  LINK_TO_ADDRESS=excluded.LINK_TO_ADDRESS,
                  FILENAME_ADDRESS=excluded.FILENAME_ADDRESS,
                  TEXT_OF_ADDRESS=excluded.TEXT_OF_ADDRESS
                "#,
                table = self.table
            ),
            params![
                record.president_name,
                record.speech_date,
                record.source_link,
                record.filename,
                record.speech_text,
            ],
        )?;

        Ok(if existed {
            UpsertAction::Updated
        } else {
            UpsertAction::Inserted
        })
    }

    pub fn exists(&self, president_name: &str, speech_date: NaiveDate) -> rusqlite::Result<bool> {
        let count: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE NAME_OF_PRESIDENT = ?1 AND DATE_OF_UNION_ADDRESS = ?2",
                self.table
            ),
            params![president_name, speech_date],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn get(
        &self,
        president_name: &str,
        speech_date: NaiveDate,
    ) -> rusqlite::Result<Option<SpeechRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT NAME_OF_PRESIDENT, DATE_OF_UNION_ADDRESS, LINK_TO_ADDRESS,
                            FILENAME_ADDRESS, TEXT_OF_ADDRESS
                     FROM {} WHERE NAME_OF_PRESIDENT = ?1 AND DATE_OF_UNION_ADDRESS = ?2",
                    self.table
                ),
                params![president_name, speech_date],
                |row| {
                    Ok(SpeechRecord {
                        president_name: row.get(0)?,
                        speech_date: row.get(1)?,
                        source_link: row.get(2)?,
                        filename: row.get(3)?,
                        speech_text: row.get(4)?,
                    })
                },
            )
            .optional()
    }

    pub fn count(&self) -> rusqlite::Result<usize> {
        let n: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
