use chrono::{Datelike, NaiveDate};
use regex::Regex;
use sotu_model::{speech_filename, NormalizationError, RawFields, SpeechRecord, FIRST_ADDRESS_YEAR};
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

/// Characters that carry no text and are dropped outright.
const INVISIBLE: &[char] = &['\u{200b}', '\u{200c}', '\u{200d}', '\u{2060}', '\u{feff}', '\u{ad}'];

/// Punctuation stripped from either end of a speaker name.
const TITLE_PUNCTUATION: &[char] = &[
    '"', '\'', '\u{201c}', '\u{201d}', '\u{2018}', '\u{2019}', ':', ';', ',', '.', '-',
    '\u{2013}', '\u{2014}', '(', ')', '[', ']', '*',
];

const DATE_FORMATS: &[&str] = &["%B %d %Y", "%d %B %Y", "%Y-%m-%d"];

/// Turn extracted fields into a validated record.
pub fn normalize(raw: &RawFields) -> Result<SpeechRecord, NormalizationError> {
    let president_name = normalize_name(&raw.speaker)?;
    let speech_date = parse_speech_date(&raw.date_text)?;

    let speech_text = normalize_paragraphs(&raw.paragraphs);
    if speech_text.is_empty() {
        return Err(NormalizationError::EmptyText);
    }

    let filename = speech_filename(&president_name, speech_date);

    Ok(SpeechRecord {
        president_name,
        speech_date,
        source_link: raw.source_link.clone(),
        filename,
        speech_text,
    })
}

/// Collapse whitespace within a single paragraph.
///
/// Applies Unicode NFC, drops zero-width characters and soft hyphens, and
/// reduces every run of whitespace (including non-breaking spaces) to a
/// single space.
pub fn collapse_whitespace(input: &str) -> String {
    let nfc: String = input.nfc().filter(|c| !INVISIBLE.contains(c)).collect();
    nfc.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapse each paragraph on its own, drop the ones left empty, and join the
/// rest with a single newline. Line breaks inside a paragraph become spaces.
pub fn normalize_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> String {
    paragraphs
        .iter()
        .map(|p| collapse_whitespace(p.as_ref()))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Trim whitespace and title punctuation from a speaker name.
///
/// A trailing period is kept when it closes an initial or a generational
/// suffix ("Jr.", "Sr.").
pub fn normalize_name(input: &str) -> Result<String, NormalizationError> {
    let collapsed = collapse_whitespace(input);
    let trimmed = collapsed.trim_matches(is_title_trim);
    if trimmed.is_empty() {
        return Err(NormalizationError::EmptyName);
    }

    let mut name = trimmed.to_string();
    let had_period = collapsed
        .trim_end_matches(|c: char| is_title_trim(c) && c != '.')
        .ends_with('.');
    if had_period && keeps_period(name.rsplit(' ').next().unwrap_or_default()) {
        name.push('.');
    }
    Ok(name)
}

fn is_title_trim(c: char) -> bool {
    c.is_whitespace() || TITLE_PUNCTUATION.contains(&c)
}

fn keeps_period(word: &str) -> bool {
    matches!(word, "Jr" | "Sr") || (word.chars().count() == 1 && word.chars().all(char::is_uppercase))
}

/// Parse a free-text date such as "January 8, 1790" or "December 8th, 1801".
pub fn parse_speech_date(input: &str) -> Result<NaiveDate, NormalizationError> {
    let cleaned = clean_date_text(input);

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&cleaned, fmt).ok())
        .ok_or_else(|| NormalizationError::UnparsableDate(input.trim().to_string()))?;

    if date.year() < FIRST_ADDRESS_YEAR {
        return Err(NormalizationError::DateOutOfRange {
            date: date.to_string(),
            min_year: FIRST_ADDRESS_YEAR,
        });
    }
    Ok(date)
}

/// "Friday, January 8th, 1790" -> "January 8 1790"; "Sept. 3, 1901" -> "Sep 3 1901".
fn clean_date_text(input: &str) -> String {
    static ORDINAL: OnceLock<Regex> = OnceLock::new();
    let ordinal = ORDINAL.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").expect("valid ordinal regex")
    });

    let collapsed = collapse_whitespace(input);
    let without_ordinals = ordinal.replace_all(&collapsed, "$1");
    let tokens: Vec<String> = without_ordinals
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .map(|t| t.trim_end_matches('.'))
        .map(|t| if t.eq_ignore_ascii_case("sept") { "Sep".to_string() } else { t.to_string() })
        .collect();

    let tokens = match tokens.first() {
        Some(first) if is_weekday(first) => &tokens[1..],
        _ => &tokens[..],
    };
    tokens.join(" ")
}

fn is_weekday(token: &str) -> bool {
    const WEEKDAYS: [&str; 7] = [
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
    ];
    WEEKDAYS.contains(&token.to_lowercase().as_str())
}
