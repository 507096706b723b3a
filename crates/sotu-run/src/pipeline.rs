use crate::report::{PersistedSpeech, RunReport};
use sotu_acquire::normalize::{normalize_name, parse_speech_date};
use sotu_acquire::{extract, normalize, CatalogEntry, PageSource};
use sotu_model::{speech_label, BrokenLinkEntry, BrokenStage, PersistWarning, SpeechRecord};
use sotu_store::{PersistOutcome, Store, UpsertAction};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Skip listed entries whose (president, date) is already stored.
    pub skip_existing: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
        }
    }
}

/// Where a page currently sits in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Pending,
    Fetched,
    Extracted,
    Normalized,
    Persisted,
    Broken,
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Terminal result for one catalog entry.
#[derive(Debug)]
enum PageOutcome {
    Persisted(SpeechRecord, PersistOutcome),
    Skipped(String),
    Broken(BrokenLinkEntry),
    /// The record was valid but storage failed.
    StorageFailed(PersistWarning),
}

/// Walk the catalog one page at a time and report what happened.
///
/// Page-level failures never abort the run: fetch, extraction and
/// normalization failures become broken links, storage failures become
/// warnings.
pub async fn run<S: PageSource + ?Sized>(
    source: &S,
    store: &mut Store,
    catalog: &[CatalogEntry],
    options: &RunOptions,
) -> RunReport {
    let mut report = RunReport {
        started_at: chrono::Utc::now().to_rfc3339(),
        pages: catalog.len(),
        ..Default::default()
    };

    for (index, entry) in catalog.iter().enumerate() {
        tracing::info!(
            page = index + 1,
            of = catalog.len(),
            speech = %entry.label(),
            "Processing speech"
        );

        match process_page(source, store, entry, options).await {
            PageOutcome::Persisted(record, outcome) => {
                report.persisted.push(PersistedSpeech {
                    label: record.label(),
                    filename: record.filename,
                    source_link: record.source_link,
                    updated: outcome.action == UpsertAction::Updated,
                });
            }
            PageOutcome::Skipped(label) => {
                tracing::warn!(speech = %label, "Duplicate skipped");
                report.skipped.push(label);
            }
            PageOutcome::Broken(broken) => {
                tracing::warn!(url = %broken.source_link, stage = %broken.stage, reason = %broken.reason, "Broken link");
                report.broken.push(broken);
            }
            PageOutcome::StorageFailed(warning) => {
                tracing::error!(url = %warning.source_link, file = %warning.filename, reason = %warning.reason, "Failed to store speech");
                report.warnings.push(warning);
            }
        }
    }

    report.finished_at = chrono::Utc::now().to_rfc3339();
    tracing::info!(
        persisted = report.persisted.len(),
        skipped = report.skipped.len(),
        broken = report.broken.len(),
        warnings = report.warnings.len(),
        "Run complete"
    );
    report
}

async fn process_page<S: PageSource + ?Sized>(
    source: &S,
    store: &mut Store,
    entry: &CatalogEntry,
    options: &RunOptions,
) -> PageOutcome {
    let url = entry.url.as_str();
    let broken = |stage: BrokenStage, reason: String| {
        trace_state(url, PageState::Broken);
        PageOutcome::Broken(BrokenLinkEntry {
            source_link: url.to_string(),
            stage,
            reason,
        })
    };
    trace_state(url, PageState::Pending);

    if options.skip_existing {
        if let Some(label) = already_stored(store, entry) {
            return PageOutcome::Skipped(label);
        }
    }

    let html = match source.fetch(url).await {
        Ok(html) => html,
        Err(e) => return broken(BrokenStage::Fetch, e.to_string()),
    };
    trace_state(url, PageState::Fetched);

    let raw = match extract(&html, &entry.layout, url) {
        Ok(raw) => raw,
        Err(e) => return broken(BrokenStage::Extraction, e.to_string()),
    };
    trace_state(url, PageState::Extracted);

    let record = match normalize(&raw) {
        Ok(record) => record,
        Err(e) => return broken(BrokenStage::Normalization, e.to_string()),
    };
    trace_state(url, PageState::Normalized);

    match store.persist(&record) {
        Ok(outcome) => {
            trace_state(url, PageState::Persisted);
            PageOutcome::Persisted(record, outcome)
        }
        Err(e) => PageOutcome::StorageFailed(PersistWarning {
            source_link: record.source_link,
            filename: record.filename,
            reason: e.to_string(),
        }),
    }
}

/// Label of a listed entry whose key is already in the database.
///
/// Entries whose listing cannot be normalized, or whose lookup fails, are
/// left for the full pipeline to handle.
fn already_stored(store: &Store, entry: &CatalogEntry) -> Option<String> {
    let (speaker, date_text) = entry.listed_fields()?;
    let name = normalize_name(speaker).ok()?;
    let date = parse_speech_date(date_text).ok()?;

    match store.database().exists(&name, date) {
        Ok(true) => Some(speech_label(&name, date)),
        Ok(false) => None,
        Err(e) => {
            tracing::warn!(speech = %entry.label(), error = %e, "Duplicate check failed; scraping anyway");
            None
        }
    }
}

fn trace_state(url: &str, state: PageState) {
    tracing::debug!(url = %url, state = %state, "Page state");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use sotu_acquire::PageLayout;
    use sotu_model::FetchError;
    use sotu_store::db::DEFAULT_TABLE;
    use sotu_store::{Database, SpeechFiles};
    use std::collections::HashMap;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const WASHINGTON_URL: &str = "https://www.presidency.ucsb.edu/documents/first-annual-address-congress-0";

    const WASHINGTON_PAGE: &str = r#"
    <html><body>
    <div class="field-docs-person">
        <h3 class="diet-title"><a href="/people/president/george-washington">George Washington</a></h3>
    </div>
    <div class="field-docs-start-date-time">
        <span class="date-display-single">January 8, 1790</span>
    </div>
    <div class="field-docs-content">
        <p>Fellow-Citizens of the Senate and House of Representatives:</p>
        <p>I embrace with great satisfaction the opportunity which now presents itself.</p>
    </div>
    </body></html>
    "#;

    /// Serves canned responses and remembers every URL requested.
    #[derive(Default)]
    struct StubSource {
        pages: HashMap<String, Result<String, FetchError>>,
        requested: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn page(mut self, url: &str, html: &str) -> Self {
            self.pages.insert(url.to_string(), Ok(html.to_string()));
            self
        }

        fn status(mut self, url: &str, status: u16) -> Self {
            self.pages.insert(
                url.to_string(),
                Err(FetchError::Status {
                    url: url.to_string(),
                    status,
                }),
            );
            self
        }

        fn requested(&self) -> Vec<String> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.requested.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().unwrap_or_else(|| {
                Err(FetchError::Network {
                    url: url.to_string(),
                    message: "no route".into(),
                })
            })
        }
    }

    struct Fixture {
        dir: TempDir,
        store: Store,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let db = Database::open(&dir.path().join("sotu.db"), DEFAULT_TABLE).unwrap();
            let files = SpeechFiles::open(
                &dir.path().join("SpeechFiles"),
                &dir.path().join("combined.txt"),
            )
            .unwrap();
            Self {
                store: Store::new(db, files),
                dir,
            }
        }

        fn out_dir(&self) -> PathBuf {
            self.dir.path().join("SpeechFiles")
        }

        fn speech_files(&self) -> Vec<PathBuf> {
            fs::read_dir(self.out_dir())
                .unwrap()
                .map(|e| e.unwrap().path())
                .collect()
        }

        fn archive(&self) -> String {
            fs::read_to_string(self.dir.path().join("combined.txt")).unwrap()
        }
    }

    fn ucsb(url: &str) -> CatalogEntry {
        CatalogEntry {
            url: url.to_string(),
            layout: PageLayout::presidency_project(),
        }
    }

    fn listed(url: &str, speaker: &str, date: &str) -> CatalogEntry {
        CatalogEntry {
            url: url.to_string(),
            layout: PageLayout::listed(speaker, date),
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_washington_end_to_end() {
        let mut fx = Fixture::new();
        let source = StubSource::default().page(WASHINGTON_URL, WASHINGTON_PAGE);

        let report = run(&source, &mut fx.store, &[ucsb(WASHINGTON_URL)], &RunOptions::default()).await;

        assert_eq!(report.persisted.len(), 1);
        assert!(report.broken.is_empty());

        let files = fx.speech_files();
        assert_eq!(files.len(), 1);
        assert_eq!(file_name(&files[0]), "George_Washington_(January_8_1790).txt");
        let text = fs::read_to_string(&files[0]).unwrap();
        assert!(text.starts_with("Fellow-Citizens of the Senate"));

        let date = NaiveDate::from_ymd_opt(1790, 1, 8).unwrap();
        let row = fx.store.database().get("George Washington", date).unwrap().unwrap();
        assert_eq!(row.source_link, WASHINGTON_URL);
        assert_eq!(row.speech_text, text);
        assert_eq!(fx.store.database().count().unwrap(), 1);

        assert!(fx.archive().starts_with("George Washington (January 8, 1790)\n\n"));
    }

    #[tokio::test]
    async fn test_http_404_is_fetch_failure() {
        let mut fx = Fixture::new();
        let url = "https://www.presidency.ucsb.edu/documents/missing";
        let source = StubSource::default().status(url, 404);

        let report = run(&source, &mut fx.store, &[ucsb(url)], &RunOptions::default()).await;

        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].source_link, url);
        assert_eq!(report.broken[0].stage.to_string(), "fetch failure");
        assert!(report.persisted.is_empty());
        assert_eq!(fx.store.database().count().unwrap(), 0);
        assert!(fx.speech_files().is_empty());
    }

    #[tokio::test]
    async fn test_missing_date_is_extraction_failure() {
        let mut fx = Fixture::new();
        let html = WASHINGTON_PAGE.replace(
            r#"<span class="date-display-single">January 8, 1790</span>"#,
            "",
        );
        let source = StubSource::default().page(WASHINGTON_URL, &html);

        let report = run(&source, &mut fx.store, &[ucsb(WASHINGTON_URL)], &RunOptions::default()).await;

        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].stage, BrokenStage::Extraction);
        assert_eq!(report.broken[0].stage.to_string(), "extraction failure");
        assert_eq!(fx.store.database().count().unwrap(), 0);
        assert!(fx.speech_files().is_empty());
        assert!(fx.archive().is_empty());
    }

    #[tokio::test]
    async fn test_empty_body_is_extraction_failure() {
        let mut fx = Fixture::new();
        let html = r#"<html><body><article><div><div><p>&nbsp;</p></div></div></article></body></html>"#;
        let url = "https://www.infoplease.com/speech/adams-1797";
        let source = StubSource::default().page(url, html);

        let entry = listed(url, "John Adams", "November 22nd, 1797");
        let report = run(&source, &mut fx.store, &[entry], &RunOptions::default()).await;

        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].stage, BrokenStage::Extraction);
        assert!(fx.speech_files().is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_date_is_normalization_failure() {
        let mut fx = Fixture::new();
        let html = WASHINGTON_PAGE.replace("January 8, 1790", "the eighth of January");
        let source = StubSource::default().page(WASHINGTON_URL, &html);

        let report = run(&source, &mut fx.store, &[ucsb(WASHINGTON_URL)], &RunOptions::default()).await;

        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].stage, BrokenStage::Normalization);
        assert!(report.broken[0].reason.contains("the eighth of January"));
        assert_eq!(fx.store.database().count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_broken_page_does_not_stop_run() {
        let mut fx = Fixture::new();
        let missing = "https://www.presidency.ucsb.edu/documents/missing";
        let source = StubSource::default()
            .status(missing, 500)
            .page(WASHINGTON_URL, WASHINGTON_PAGE);

        let catalog = [ucsb(missing), ucsb(WASHINGTON_URL)];
        let report = run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;

        assert_eq!(report.pages, 2);
        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.persisted.len(), 1);
        assert_eq!(source.requested(), vec![missing.to_string(), WASHINGTON_URL.to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_overwrites_instead_of_duplicating() {
        let mut fx = Fixture::new();
        let source = StubSource::default().page(WASHINGTON_URL, WASHINGTON_PAGE);
        let catalog = [ucsb(WASHINGTON_URL)];

        run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;
        let second = run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;

        assert_eq!(second.persisted.len(), 1);
        assert!(second.persisted[0].updated);
        assert_eq!(fx.store.database().count().unwrap(), 1);
        assert_eq!(fx.speech_files().len(), 1);
    }

    #[tokio::test]
    async fn test_listed_entry_already_stored_is_skipped_without_fetch() {
        let mut fx = Fixture::new();
        let url = "https://www.infoplease.com/speech/washington-1790";
        let html = r#"<article><div><div><p>Fellow-Citizens</p></div></div></article>"#;
        let source = StubSource::default().page(url, html);
        let catalog = [listed(url, "George Washington", "January 8th, 1790")];

        let first = run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;
        assert_eq!(first.persisted.len(), 1);

        let second = run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;
        assert!(second.persisted.is_empty());
        assert_eq!(second.skipped, vec!["George Washington (January 8, 1790)".to_string()]);
        assert_eq!(source.requested().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_rescrapes_stored_entries() {
        let mut fx = Fixture::new();
        let url = "https://www.infoplease.com/speech/washington-1790";
        let html = r#"<article><div><div><p>Fellow-Citizens</p></div></div></article>"#;
        let source = StubSource::default().page(url, html);
        let catalog = [listed(url, "George Washington", "January 8th, 1790")];
        let refresh = RunOptions {
            skip_existing: false,
        };

        run(&source, &mut fx.store, &catalog, &RunOptions::default()).await;
        let second = run(&source, &mut fx.store, &catalog, &refresh).await;

        assert_eq!(second.persisted.len(), 1);
        assert!(second.skipped.is_empty());
        assert_eq!(source.requested().len(), 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_warning_not_broken() {
        let mut fx = Fixture::new();
        let source = StubSource::default().page(WASHINGTON_URL, WASHINGTON_PAGE);
        fs::create_dir(fx.out_dir().join("George_Washington_(January_8_1790).txt")).unwrap();

        let report = run(&source, &mut fx.store, &[ucsb(WASHINGTON_URL)], &RunOptions::default()).await;

        assert!(report.broken.is_empty());
        assert!(report.persisted.is_empty());
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].filename, "George_Washington_(January_8_1790).txt");
        assert!(report.warnings[0].reason.contains("file write failed"));
    }
}
