use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Earliest year a State of the Union address can carry.
pub const FIRST_ADDRESS_YEAR: i32 = 1789;

/// Fields pulled out of a speech page before any cleanup.
///
/// Every field was located by a structural query that fails loudly, so a
/// `RawFields` value is always complete; it may still be rejected by
/// normalization (e.g. a date string that does not parse).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFields {
    pub source_link: String,
    pub speaker: String,
    pub date_text: String,
    /// Text of each body node, in document order.
    pub paragraphs: Vec<String>,
}

impl RawFields {
    /// Body text as extracted: paragraphs joined by a single newline.
    pub fn body_text(&self) -> String {
        self.paragraphs.join("\n")
    }
}

/// A validated speech, ready to be written to the database and to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechRecord {
    pub president_name: String,
    pub speech_date: NaiveDate,
    pub source_link: String,
    /// Derived from `president_name` and `speech_date`; see [`speech_filename`].
    pub filename: String,
    pub speech_text: String,
}

impl SpeechRecord {
    /// Human-readable key, e.g. "George Washington (January 8, 1790)".
    pub fn label(&self) -> String {
        speech_label(&self.president_name, self.speech_date)
    }
}

/// "George Washington (January 8, 1790)".
pub fn speech_label(president_name: &str, speech_date: NaiveDate) -> String {
    format!(
        "{} ({} {}, {})",
        president_name,
        month_name(speech_date),
        speech_date.day(),
        speech_date.year()
    )
}

/// Derive the archive filename for a speech.
///
/// `George Washington` + 1790-01-08 becomes
/// `George_Washington_(January_8_1790).txt`. Commas are dropped, spaces become
/// underscores, and path separators are removed so the result is always a
/// single path component.
pub fn speech_filename(president_name: &str, speech_date: NaiveDate) -> String {
    let stem: String = speech_label(president_name, speech_date)
        .chars()
        .filter(|c| !matches!(c, ',' | '/' | '\\'))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}.txt")
}

fn month_name(date: NaiveDate) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January", "February", "March", "April", "May", "June",
        "July", "August", "September", "October", "November", "December",
    ];
    MONTHS[date.month0() as usize]
}
