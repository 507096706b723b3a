use crate::error::{FileWriteError, StoreError};
use sotu_model::SpeechRecord;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "SpeechFiles";
pub const DEFAULT_ARCHIVE_FILE: &str = "CombinedStateOfUnionAddresses.txt";

const ARCHIVE_SEPARATOR_WIDTH: usize = 80;

/// Per-speech text files plus the combined archive for this run.
pub struct SpeechFiles {
    output_dir: PathBuf,
    archive_path: PathBuf,
    archive: File,
}

impl SpeechFiles {
    /// Create the output directory and start a fresh combined archive.
    pub fn open(output_dir: &Path, archive_path: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(output_dir).map_err(|source| StoreError::Io {
            path: output_dir.to_path_buf(),
            source,
        })?;
        if let Some(parent) = archive_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let archive = File::create(archive_path).map_err(|source| StoreError::Io {
            path: archive_path.to_path_buf(),
            source,
        })?;
        tracing::info!(
            output_dir = %output_dir.display(),
            archive = %archive_path.display(),
            "Opened speech output"
        );

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            archive_path: archive_path.to_path_buf(),
            archive,
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Write the speech to its own file (overwriting) and append it to the
    /// combined archive. Returns the path of the individual file.
    pub fn write(&mut self, record: &SpeechRecord) -> Result<PathBuf, FileWriteError> {
        let path = self.output_dir.join(&record.filename);
        fs::write(&path, &record.speech_text).map_err(|source| FileWriteError {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = record.speech_text.len(), "Wrote speech file");

        self.archive
            .write_all(archive_section(record).as_bytes())
            .and_then(|()| self.archive.flush())
            .map_err(|source| FileWriteError {
                path: self.archive_path.clone(),
                source,
            })?;

        Ok(path)
    }
}

/// Header, text and separator for one speech in the combined archive.
pub fn archive_section(record: &SpeechRecord) -> String {
    format!(
        "{}\n\n{}\n\n{}\n\n",
        record.label(),
        record.speech_text,
        "-".repeat(ARCHIVE_SEPARATOR_WIDTH)
    )
}
