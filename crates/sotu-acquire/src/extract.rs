use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use sotu_model::{ExtractionError, RawFields};
use std::ops::Deref;

/// Where a single field of a speech page comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum FieldRule {
    /// Text of the first element matching this CSS selector.
    Css(String),
    /// Text already known from the catalog listing that linked to the page.
    Listed(String),
}

/// The structural shape of a speech page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLayout {
    pub speaker: FieldRule,
    pub date: FieldRule,
    /// CSS selector matching every paragraph of the speech body.
    pub body: String,
}

impl PageLayout {
    /// Document pages on the American Presidency Project (presidency.ucsb.edu).
    pub fn presidency_project() -> Self {
        Self {
            speaker: FieldRule::Css("div.field-docs-person h3.diet-title a".into()),
            date: FieldRule::Css(
                "div.field-docs-start-date-time span.date-display-single".into(),
            ),
            body: "div.field-docs-content p".into(),
        }
    }

    /// Infoplease speech pages. Speaker and date are only printed on the
    /// index page, so they travel with the catalog entry.
    pub fn listed(speaker: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            speaker: FieldRule::Listed(speaker.into()),
            date: FieldRule::Listed(date.into()),
            body: "article div div p".into(),
        }
    }
}

/// Pull speaker, date and body paragraphs out of a speech page.
///
/// A field that cannot be located is an error; nothing is defaulted.
pub fn extract(
    html: &str,
    layout: &PageLayout,
    source_link: &str,
) -> Result<RawFields, ExtractionError> {
    let document = Html::parse_document(html);

    let speaker = resolve_field(&document, &layout.speaker)?
        .ok_or_else(|| ExtractionError::MissingSpeaker(rule_label(&layout.speaker)))?;
    let date_text = resolve_field(&document, &layout.date)?
        .ok_or_else(|| ExtractionError::MissingDate(rule_label(&layout.date)))?;

    let body_sel = parse_selector(&layout.body)?;
    let paragraphs: Vec<String> = document
        .select(&body_sel)
        .map(element_text)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .collect();

    if paragraphs.is_empty() {
        return Err(ExtractionError::EmptyBody(layout.body.clone()));
    }

    tracing::debug!(
        speaker = %speaker,
        date = %date_text,
        paragraphs = paragraphs.len(),
        "Extracted speech fields"
    );

    Ok(RawFields {
        source_link: source_link.to_string(),
        speaker,
        date_text,
        paragraphs,
    })
}

/// `Ok(None)` when the field is absent or blank.
fn resolve_field(document: &Html, rule: &FieldRule) -> Result<Option<String>, ExtractionError> {
    let text = match rule {
        FieldRule::Listed(text) => text.trim().to_string(),
        FieldRule::Css(selector) => {
            let sel = parse_selector(selector)?;
            match document.select(&sel).next() {
                Some(element) => element_text(element).trim().to_string(),
                None => return Ok(None),
            }
        }
    };
    Ok(if text.is_empty() { None } else { Some(text) })
}

fn rule_label(rule: &FieldRule) -> String {
    match rule {
        FieldRule::Css(selector) => selector.clone(),
        FieldRule::Listed(_) => "catalog listing".to_string(),
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(selector).map_err(|e| ExtractionError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

fn element_text(element: ElementRef) -> String {
    let mut text = String::new();
    collect_text(*element, &mut text);
    text
}

/// Collect all text under a node, skipping script/style and turning `<br>`
/// into a space.
fn collect_text(node: NodeRef<Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(t) => out.push_str(t.deref()),
            Node::Element(elem) => match elem.name() {
                "br" => out.push(' '),
                "script" | "style" | "noscript" => {}
                _ => collect_text(child, out),
            },
            _ => {}
        }
    }
}
