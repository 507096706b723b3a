use crate::extract::{FieldRule, PageLayout};
use crate::fetch::PageSource;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use sotu_model::FetchError;
use url::Url;

pub const INFOPLEASE_BASE_URL: &str = "https://www.infoplease.com";
pub const INFOPLEASE_INDEX_URL: &str =
    "https://www.infoplease.com/primary-sources/government/presidential-speeches/state-union-addresses";

/// Link list on the infoplease index: one `<dt>` per address.
const INDEX_LINK_SELECTOR: &str = "div > dl > dt > span > a";

/// One known speech page and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub url: String,
    pub layout: PageLayout,
}

impl CatalogEntry {
    /// Speaker and date text when the listing already supplied them.
    pub fn listed_fields(&self) -> Option<(&str, &str)> {
        match (&self.layout.speaker, &self.layout.date) {
            (FieldRule::Listed(speaker), FieldRule::Listed(date)) => {
                Some((speaker.as_str(), date.as_str()))
            }
            _ => None,
        }
    }

    /// Short description for logs.
    pub fn label(&self) -> String {
        match self.listed_fields() {
            Some((speaker, date)) => format!("{speaker} ({date})"),
            None => self.url.clone(),
        }
    }
}

/// Pages on the American Presidency Project spanning the archive, readable
/// without the infoplease index.
pub fn builtin() -> Vec<CatalogEntry> {
    [
        "https://www.presidency.ucsb.edu/documents/first-annual-address-congress-0",
        "https://www.presidency.ucsb.edu/documents/second-annual-message-9",
        "https://www.presidency.ucsb.edu/documents/annual-message-the-congress-the-state-the-union-4",
    ]
    .into_iter()
    .map(|url| CatalogEntry {
        url: url.to_string(),
        layout: PageLayout::presidency_project(),
    })
    .collect()
}

/// Fetch the infoplease index page and list every address on it.
pub async fn load_index<S: PageSource + ?Sized>(
    source: &S,
    index_url: &str,
) -> Result<Vec<CatalogEntry>, FetchError> {
    tracing::info!(url = %index_url, "Fetching catalog index");
    let html = source.fetch(index_url).await?;
    let entries = parse_index(&html, index_url);
    tracing::info!(entries = entries.len(), "Parsed catalog index");
    Ok(entries)
}

/// Parse the index page into catalog entries.
///
/// Each link label looks like `George Washington (January 8th, 1790)`; it is
/// split on the last `(`. Links without a parenthesised date, without an
/// href, or whose href cannot be resolved against `base_url` are skipped.
pub fn parse_index(html: &str, base_url: &str) -> Vec<CatalogEntry> {
    let document = Html::parse_document(html);
    let link_sel = Selector::parse(INDEX_LINK_SELECTOR).expect("valid selector");
    let base = Url::parse(base_url).ok();

    let mut entries = Vec::new();
    for link in document.select(&link_sel) {
        let label: String = link.text().collect();
        let Some((speaker, date)) = split_label(&label) else {
            tracing::warn!(label = %label.trim(), "Skipping index link without a date");
            continue;
        };

        let Some(href) = link.value().attr("href") else {
            tracing::warn!(label = %label.trim(), "Skipping index link without href");
            continue;
        };

        let url = match resolve(base.as_ref(), href) {
            Some(url) => url,
            None => {
                tracing::warn!(href = %href, "Skipping unresolvable index link");
                continue;
            }
        };

        entries.push(CatalogEntry {
            url,
            layout: PageLayout::listed(speaker, date),
        });
    }
    entries
}

fn split_label(label: &str) -> Option<(String, String)> {
    let (speaker, rest) = label.rsplit_once('(')?;
    if !rest.contains(')') {
        return None;
    }
    let date = rest.trim().trim_end_matches(')').trim();
    Some((speaker.trim().to_string(), date.to_string()))
}

fn resolve(base: Option<&Url>, href: &str) -> Option<String> {
    match base {
        Some(base) => base.join(href).ok().map(String::from),
        None => Url::parse(href).ok().map(String::from),
    }
}
