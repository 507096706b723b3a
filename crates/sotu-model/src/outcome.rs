use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage at which a page was abandoned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrokenStage {
    Fetch,
    Extraction,
    Normalization,
}

impl fmt::Display for BrokenStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BrokenStage::Fetch => "fetch failure",
            BrokenStage::Extraction => "extraction failure",
            BrokenStage::Normalization => "normalization failure",
        };
        f.write_str(s)
    }
}

/// A source page that was skipped instead of persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenLinkEntry {
    pub source_link: String,
    pub stage: BrokenStage,
    /// Underlying error message.
    pub reason: String,
}

impl fmt::Display for BrokenLinkEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.source_link, self.stage, self.reason)
    }
}

/// A valid record whose database row or file could not be written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistWarning {
    pub source_link: String,
    pub filename: String,
    pub reason: String,
}

impl fmt::Display for PersistWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.source_link, self.filename, self.reason)
    }
}
