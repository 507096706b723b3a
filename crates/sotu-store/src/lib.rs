pub mod db;
pub mod error;
pub mod files;

pub use db::{validate_identifier, Database, UpsertAction};
pub use error::{FileWriteError, PersistError, StoreError};
pub use files::SpeechFiles;

use sotu_model::SpeechRecord;
use std::path::PathBuf;

/// What happened to a record that was fully persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistOutcome {
    pub action: UpsertAction,
    pub path: PathBuf,
}

/// The run's storage: one database connection and one set of output files,
/// opened at startup and released when dropped.
pub struct Store {
    db: Database,
    files: SpeechFiles,
}

impl Store {
    pub fn new(db: Database, files: SpeechFiles) -> Self {
        Self { db, files }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn files(&self) -> &SpeechFiles {
        &self.files
    }

    /// Upsert the database row and write the speech files.
    ///
    /// Both sides are always attempted; a failure on one does not stop the
    /// other.
    pub fn persist(&mut self, record: &SpeechRecord) -> Result<PersistOutcome, PersistError> {
        let db_result = self.db.upsert(record);
        let file_result = self.files.write(record);

        match (db_result, file_result) {
            (Ok(action), Ok(path)) => {
                tracing::info!(
                    speech = %record.label(),
                    action = ?action,
                    path = %path.display(),
                    "Persisted speech"
                );
                Ok(PersistOutcome { action, path })
            }
            (Err(e), Ok(_)) => Err(PersistError::Database(e)),
            (Ok(_), Err(e)) => Err(PersistError::File(e)),
            (Err(database), Err(file)) => Err(PersistError::Both { database, file }),
        }
    }
}
