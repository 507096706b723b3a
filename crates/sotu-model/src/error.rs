use thiserror::Error;

/// Failure to retrieve a page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request to {url} timed out after {seconds}s")]
    Timeout { url: String, seconds: u64 },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },
}

/// A required structural field could not be located on the page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("speaker not found (selector '{0}')")]
    MissingSpeaker(String),

    #[error("date not found (selector '{0}')")]
    MissingDate(String),

    #[error("speech body is empty (selector '{0}')")]
    EmptyBody(String),
}

/// Extracted fields that cannot be turned into a valid record.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("president name is empty after trimming")]
    EmptyName,

    #[error("unparsable date: '{0}'")]
    UnparsableDate(String),

    #[error("date {date} is before {min_year}")]
    DateOutOfRange { date: String, min_year: i32 },

    #[error("speech text is empty after normalization")]
    EmptyText,
}
