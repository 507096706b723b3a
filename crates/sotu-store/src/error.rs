use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure while opening the store at startup.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid SQL {kind} '{value}': only letters, digits and underscores are allowed")]
    InvalidIdentifier { kind: &'static str, value: String },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A speech file or the combined archive could not be written.
#[derive(Debug, Error)]
#[error("{}: {source}", path.display())]
pub struct FileWriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// One or both sides of persisting a record failed.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("database write failed: {0}")]
    Database(#[source] rusqlite::Error),

    #[error("file write failed: {0}")]
    File(#[source] FileWriteError),

    #[error("database write failed: {database}; file write failed: {file}")]
    Both {
        database: rusqlite::Error,
        file: FileWriteError,
    },
}
