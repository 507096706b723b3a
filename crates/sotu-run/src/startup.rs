use crate::config::Config;
use anyhow::{Context, Result};
use sotu_acquire::{catalog, CatalogEntry, PageSource};
use sotu_store::{Database, SpeechFiles, Store};

/// Which list of speech pages a run walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogChoice {
    /// Fetch and parse the infoplease index at this URL.
    Index(String),
    /// The built-in American Presidency Project pages.
    Builtin,
}

/// Everything a run needs before the first speech page is fetched.
pub struct Startup {
    pub store: Store,
    pub entries: Vec<CatalogEntry>,
}

/// Validate the config, load the catalog, then open the database and
/// output files.
///
/// Storage is opened only once the catalog is in hand, so a failed index
/// fetch leaves the previous run's database and combined archive as they
/// were.
pub async fn start<S: PageSource + ?Sized>(
    source: &S,
    config: &Config,
    choice: &CatalogChoice,
) -> Result<Startup> {
    config.validate()?;

    let entries = match choice {
        CatalogChoice::Index(url) => catalog::load_index(source, url)
            .await
            .context("Failed to fetch main speeches page")?,
        CatalogChoice::Builtin => catalog::builtin(),
    };

    let db_path = config.database_path();
    let db = Database::open(&db_path, &config.table)
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let files = SpeechFiles::open(&config.output_dir, &config.archive_file)
        .context("Failed to prepare output files")?;

    Ok(Startup {
        store: Store::new(db, files),
        entries,
    })
}
