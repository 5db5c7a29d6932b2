//! Turns raw front matter into a validated [`Document`].
//!
//! ## Required fields
//!
//! `title` and `date` must be present. A blank title counts as absent.
//!
//! ## Timestamps
//!
//! Accepted forms, tried in order:
//!
//! ```text
//! 2024-05-10T08:30:00+02:00      RFC 3339, offset kept
//! 2024-05-10T08:30:00[.123]      no offset → UTC
//! 2024-05-10 08:30:00            no offset → UTC
//! 2024-05-10T08:30 / 2024-05-10 08:30
//! 2024-05-10 08:30:00 +0200
//! 2024-05-10                     midnight UTC
//! ```
//!
//! ## Defaulting
//!
//! `publishdate` falls back to `date`, `lastmod` falls back to the
//! (possibly defaulted) `publishdate`, so a post with only `date` gets all
//! three set to the same instant.
//!
//! ## Derived fields
//!
//! - **slug**: explicit `slug`, else the slugified title, else the file stem.
//! - **summary**: explicit `summary`, else the text before `<!--more-->`,
//!   else the first paragraph cut to `summary_length` words.
//! - **word_count** / **reading_time**: counted over the plain text of the
//!   Markdown body at 213 words per minute.

use crate::error::ErrorKind;
use crate::frontmatter::RawMetadata;
use crate::permalink::slugify;
use crate::types::{Document, SeriesRef, file_stem};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;

/// Marker separating a hand-picked summary from the rest of the body.
pub const SUMMARY_DIVIDER: &str = "<!--more-->";

const WORDS_PER_MINUTE: usize = 213;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("invalid date in `{field}`: {value}")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid `series` value: {0}")]
    InvalidSeries(String),
}

impl NormalizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NormalizeError::MissingField(_) => ErrorKind::MissingRequiredField,
            NormalizeError::InvalidDate { .. } => ErrorKind::InvalidDate,
            NormalizeError::InvalidSeries(_) => ErrorKind::MalformedFrontMatter,
        }
    }
}

/// Knobs that affect normalization, taken from the site config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeSettings {
    /// Maximum words in an auto-generated summary.
    pub summary_length: usize,
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        Self { summary_length: 70 }
    }
}

/// Parse a timestamp in any of the accepted front matter forms.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt);
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

fn read_date(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Option<DateTime<FixedOffset>>, NormalizeError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => parse_timestamp(s)
            .map(Some)
            .ok_or_else(|| NormalizeError::InvalidDate {
                field,
                value: s.clone(),
            }),
        Some(other) => Err(NormalizeError::InvalidDate {
            field,
            value: other.to_string(),
        }),
    }
}

fn read_series(value: Option<&Value>) -> Result<Option<String>, NormalizeError> {
    let key = match value {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(Value::Array(items)) if items.len() == 1 => match &items[0] {
            Value::String(s) => s,
            other => return Err(NormalizeError::InvalidSeries(other.to_string())),
        },
        Some(other) => return Err(NormalizeError::InvalidSeries(other.to_string())),
    };
    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

/// Trim, drop blanks, and drop repeats (case-sensitive, first one wins).
fn dedup_terms(terms: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Validate `raw` and build the immutable document for `id`.
pub fn normalize(
    id: &str,
    raw: RawMetadata,
    body: &str,
    settings: &NormalizeSettings,
) -> Result<Document, NormalizeError> {
    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingField("title"))?;

    let date = read_date("date", raw.date.as_ref())?.ok_or(NormalizeError::MissingField("date"))?;
    let publishdate = read_date("publishdate", raw.publishdate.as_ref())?.unwrap_or(date);
    let lastmod = read_date("lastmod", raw.lastmod.as_ref())?.unwrap_or(publishdate);
    let expirydate = read_date("expirydate", raw.expirydate.as_ref())?;

    let series = read_series(raw.series.as_ref())?.map(|key| SeriesRef {
        key,
        order: raw.series_order,
    });

    let slug = resolve_slug(id, raw.slug.as_deref(), &title);

    let text = BodyText::extract(body);
    let summary = raw
        .summary
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| derive_summary(body, &text, settings.summary_length));

    Ok(Document {
        id: id.to_string(),
        title,
        slug,
        date,
        publishdate,
        lastmod,
        expirydate,
        tags: dedup_terms(raw.tags),
        categories: dedup_terms(raw.categories),
        summary,
        draft: raw.draft.unwrap_or(false),
        series,
        word_count: text.word_count,
        reading_time: text.word_count.div_ceil(WORDS_PER_MINUTE),
        extra: raw.extra,
        body: body.to_string(),
    })
}

fn resolve_slug(id: &str, explicit: Option<&str>, title: &str) -> String {
    let stem = file_stem(id);
    [explicit.map(slugify), Some(slugify(title)), Some(slugify(stem))]
        .into_iter()
        .flatten()
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| stem.to_string())
}

fn derive_summary(body: &str, text: &BodyText, max_words: usize) -> Option<String> {
    if let Some((before, _)) = body.split_once(SUMMARY_DIVIDER) {
        let lead = BodyText::extract(before).plain;
        let lead = collapse_whitespace(&lead);
        if !lead.is_empty() {
            return Some(lead);
        }
    }

    let paragraph = text.first_paragraph.as_deref()?;
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    if words.len() > max_words {
        Some(format!("{}…", words[..max_words].join(" ")))
    } else {
        Some(words.join(" "))
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Plain text view of a Markdown body.
struct BodyText {
    plain: String,
    first_paragraph: Option<String>,
    word_count: usize,
}

impl BodyText {
    fn extract(markdown: &str) -> Self {
        let mut plain = String::new();
        let mut paragraph = String::new();
        let mut first_paragraph = None;
        let mut in_paragraph = false;

        for event in Parser::new(markdown) {
            match event {
                Event::Start(Tag::Paragraph) => {
                    in_paragraph = true;
                    paragraph.clear();
                }
                Event::End(TagEnd::Paragraph) => {
                    in_paragraph = false;
                    plain.push(' ');
                    if first_paragraph.is_none() {
                        let text = collapse_whitespace(&paragraph);
                        if !text.is_empty() {
                            first_paragraph = Some(text);
                        }
                    }
                }
                Event::End(
                    TagEnd::Heading(_) | TagEnd::CodeBlock | TagEnd::Item | TagEnd::TableCell,
                ) => plain.push(' '),
                Event::Text(t) | Event::Code(t) => {
                    plain.push_str(&t);
                    if in_paragraph {
                        paragraph.push_str(&t);
                    }
                }
                Event::SoftBreak | Event::HardBreak => {
                    plain.push(' ');
                    if in_paragraph {
                        paragraph.push(' ');
                    }
                }
                _ => {}
            }
        }

        let word_count = plain.split_whitespace().count();
        Self {
            plain,
            first_paragraph,
            word_count,
        }
    }
}
