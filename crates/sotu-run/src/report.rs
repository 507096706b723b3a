use serde::Serialize;
use sotu_model::{BrokenLinkEntry, PersistWarning};
use std::fmt::Write;

/// A speech that reached both the database and the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistedSpeech {
    pub label: String,
    pub filename: String,
    pub source_link: String,
    pub updated: bool,
}

/// Everything that happened during one walk of the catalog.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub pages: usize,
    pub persisted: Vec<PersistedSpeech>,
    /// Labels of listed entries already in the database.
    pub skipped: Vec<String>,
    pub broken: Vec<BrokenLinkEntry>,
    pub warnings: Vec<PersistWarning>,
}

impl RunReport {
    /// Human-readable summary for the end of a run.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "State of the Union scrape summary");
        let _ = writeln!(out, "{}", "=".repeat(70));
        let _ = writeln!(out, "Pages:      {}", self.pages);
        let _ = writeln!(out, "Persisted:  {}", self.persisted.len());
        let _ = writeln!(out, "Skipped:    {} (already archived)", self.skipped.len());
        let _ = writeln!(out, "Broken:     {}", self.broken.len());
        let _ = writeln!(out, "Warnings:   {}", self.warnings.len());

        if self.broken.is_empty() {
            let _ = writeln!(out, "\nNo broken links encountered.");
        } else {
            let _ = writeln!(out, "\nBroken links:");
            for entry in &self.broken {
                let _ = writeln!(out, "  - {entry}");
            }
        }

        if !self.warnings.is_empty() {
            let _ = writeln!(out, "\nStorage warnings:");
            for warning in &self.warnings {
                let _ = writeln!(out, "  - {warning}");
            }
        }

        out
    }
}
