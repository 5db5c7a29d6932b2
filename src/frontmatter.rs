//! Front matter extraction.
//!
//! Every post starts with a metadata header fenced by a delimiter line:
//!
//! ```text
//! ---                         +++
//! title: "My Post"            title = "My Post"
//! date: 2024-05-10            date = 2024-05-10
//! tags: [azure, bicep]        tags = ["azure", "bicep"]
//! ---                         +++
//!
//! Body in Markdown.           Body in Markdown.
//! ```
//!
//! `---` selects YAML, `+++` selects TOML. Both are lowered into a
//! format-neutral JSON value first and deserialized into [`RawMetadata`]
//! from there, so the normalizer sees the same shapes regardless of the
//! source syntax. TOML's native datetimes become their RFC 3339 text on the
//! way, which is the same form YAML produces for an unquoted date.
//!
//! Nothing here validates *content* (missing title, bad dates). That is the
//! normalizer's job. This module only fails when the header cannot be read
//! as a key/value mapping at all.

use crate::error::ErrorKind;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrontMatterError {
    #[error("front matter must start with a `---` or `+++` line")]
    MissingOpeningDelimiter,
    #[error("front matter opened with `{0}` is never closed")]
    Unterminated(&'static str),
    #[error("YAML front matter error: {0}")]
    Yaml(String),
    #[error("TOML front matter error: {0}")]
    Toml(String),
    #[error("front matter is not a key/value mapping")]
    NotAMapping,
    #[error("invalid front matter field: {0}")]
    InvalidField(String),
}

impl FrontMatterError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::MalformedFrontMatter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Toml,
}

impl Format {
    pub fn delimiter(&self) -> &'static str {
        match self {
            Format::Yaml => "---",
            Format::Toml => "+++",
        }
    }
}

/// Metadata exactly as written, before any validation or defaulting.
///
/// Timestamps stay as raw values so the normalizer can tell "absent" from
/// "present but unparseable". Keys the pipeline does not know about land in
/// `extra`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawMetadata {
    #[serde(deserialize_with = "scalar_text")]
    pub title: Option<String>,
    pub date: Option<Value>,
    #[serde(alias = "publishDate", alias = "pubdate", alias = "published")]
    pub publishdate: Option<Value>,
    #[serde(alias = "lastMod", alias = "modified")]
    pub lastmod: Option<Value>,
    #[serde(alias = "expiryDate", alias = "unpublishdate")]
    pub expirydate: Option<Value>,
    #[serde(deserialize_with = "one_or_many")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "one_or_many")]
    pub categories: Vec<String>,
    pub summary: Option<String>,
    pub draft: Option<bool>,
    pub slug: Option<String>,
    pub series: Option<Value>,
    #[serde(alias = "series_weight")]
    pub series_order: Option<u32>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A scalar written where text is expected: `2024` and `true` read as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl Scalar {
    fn into_text(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// Accept `tags: azure` as well as `tags: [azure, bicep]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s.into_text()],
        Some(OneOrMany::Many(v)) => v.into_iter().map(Scalar::into_text).collect(),
    })
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_text))
}

/// Split a document into `(format, header, body)`.
///
/// The opening delimiter must be the first non-blank line; a UTF-8 BOM is
/// skipped. The closing delimiter must sit alone on its own line. Leading
/// blank lines of the body are dropped, the rest is returned verbatim.
pub fn split_front_matter(text: &str) -> Result<(Format, &str, &str), FrontMatterError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let text = text.trim_start_matches(['\r', '\n']);

    let mut lines = text.split_inclusive('\n');
    let first = lines
        .next()
        .ok_or(FrontMatterError::MissingOpeningDelimiter)?;
    let format = match first.trim_end() {
        "---" => Format::Yaml,
        "+++" => Format::Toml,
        _ => return Err(FrontMatterError::MissingOpeningDelimiter),
    };

    let header_start = first.len();
    let mut offset = header_start;
    for line in lines {
        if line.trim_end() == format.delimiter() {
            let header = &text[header_start..offset];
            let body = text[offset + line.len()..].trim_start_matches(['\r', '\n']);
            return Ok((format, header, body));
        }
        offset += line.len();
    }

    Err(FrontMatterError::Unterminated(format.delimiter()))
}

/// Parse the front matter header of `text` and return it with the body.
pub fn parse_front_matter(text: &str) -> Result<(RawMetadata, &str), FrontMatterError> {
    let (format, header, body) = split_front_matter(text)?;

    if header.trim().is_empty() {
        return Ok((RawMetadata::default(), body));
    }

    let value = match format {
        Format::Yaml => serde_yaml::from_str::<Value>(header)
            .map_err(|e| FrontMatterError::Yaml(e.to_string()))?,
        Format::Toml => {
            let table: toml::Table = header
                .parse()
                .map_err(|e: toml::de::Error| FrontMatterError::Toml(e.message().to_string()))?;
            toml_to_json(toml::Value::Table(table))
        }
    };

    let raw = match value {
        Value::Null => RawMetadata::default(),
        Value::Object(_) => serde_json::from_value(value)
            .map_err(|e| FrontMatterError::InvalidField(e.to_string()))?,
        _ => return Err(FrontMatterError::NotAMapping),
    };

    Ok((raw, body))
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // split_front_matter
    // =========================================================================

    #[test]
    fn split_yaml() {
        let text = "---\ntitle: Hello\n---\n\nBody text.\n";
        let (format, header, body) = split_front_matter(text).unwrap();
        assert_eq!(format, Format::Yaml);
        assert_eq!(header, "title: Hello\n");
        assert_eq!(body, "Body text.\n");
    }

    #[test]
    fn split_toml() {
        let text = "+++\ntitle = \"Hello\"\n+++\nBody";
        let (format, header, body) = split_front_matter(text).unwrap();
        assert_eq!(format, Format::Toml);
        assert_eq!(header, "title = \"Hello\"\n");
        assert_eq!(body, "Body");
    }

    #[test]
    fn split_tolerates_bom_and_crlf() {
        let text = "\u{feff}---\r\ntitle: Hello\r\n---\r\nBody";
        let (_, header, body) = split_front_matter(text).unwrap();
        assert_eq!(header, "title: Hello\r\n");
        assert_eq!(body, "Body");
    }

    #[test]
    fn horizontal_rule_in_body_is_not_a_delimiter() {
        let text = "---\ntitle: Hello\n---\nIntro\n\n---\n\nMore";
        let (_, _, body) = split_front_matter(text).unwrap();
        assert_eq!(body, "Intro\n\n---\n\nMore");
    }

    #[test]
    fn missing_opening_delimiter() {
        let err = split_front_matter("# Just markdown\n").unwrap_err();
        assert_eq!(err, FrontMatterError::MissingOpeningDelimiter);
        assert_eq!(err.kind(), ErrorKind::MalformedFrontMatter);
    }

    #[test]
    fn empty_text_is_missing_delimiter() {
        assert_eq!(
            split_front_matter("").unwrap_err(),
            FrontMatterError::MissingOpeningDelimiter
        );
    }

    #[test]
    fn unterminated_header() {
        let err = split_front_matter("---\ntitle: Hello\nBody").unwrap_err();
        assert_eq!(err, FrontMatterError::Unterminated("---"));
    }

    #[test]
    fn delimiters_must_match() {
        let err = split_front_matter("---\ntitle: Hello\n+++\nBody").unwrap_err();
        assert_eq!(err, FrontMatterError::Unterminated("---"));
    }

    // =========================================================================
    // parse_front_matter
    // =========================================================================

    #[test]
    fn parse_yaml_fields() {
        let text = r#"---
title: "Deploying Bicep"
date: 2024-05-10
tags: ["Azure", "Bicep", "Azure"]
draft: true
summary: Short version.
---
Body"#;
        let (raw, body) = parse_front_matter(text).unwrap();
        assert_eq!(raw.title.as_deref(), Some("Deploying Bicep"));
        assert_eq!(raw.date, Some(Value::String("2024-05-10".into())));
        assert_eq!(raw.tags, vec!["Azure", "Bicep", "Azure"]);
        assert_eq!(raw.draft, Some(true));
        assert_eq!(raw.summary.as_deref(), Some("Short version."));
        assert_eq!(body, "Body");
    }

    #[test]
    fn parse_toml_native_datetime_becomes_text() {
        let text = "+++\ntitle = \"Hello\"\ndate = 2024-05-10T08:30:00+02:00\n+++\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(
            raw.date,
            Some(Value::String("2024-05-10T08:30:00+02:00".into()))
        );
    }

    #[test]
    fn parse_toml_local_date() {
        let text = "+++\ntitle = \"Hello\"\ndate = 2024-05-10\n+++\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.date, Some(Value::String("2024-05-10".into())));
    }

    #[test]
    fn single_tag_string_is_accepted() {
        let text = "---\ntitle: Hello\ntags: azure\n---\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.tags, vec!["azure"]);
    }

    #[test]
    fn numeric_tags_and_title_read_as_text() {
        let text = "---\ntitle: 2024\ntags: [2024, azure, true]\ncategories: 7\n---\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.title.as_deref(), Some("2024"));
        assert_eq!(raw.tags, vec!["2024", "azure", "true"]);
        assert_eq!(raw.categories, vec!["7"]);
    }

    #[test]
    fn numeric_toml_tags_read_as_text() {
        let text = "+++\ntitle = \"Year in review\"\ntags = [2024, \"azure\"]\n+++\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.tags, vec!["2024", "azure"]);
    }

    #[test]
    fn date_key_aliases() {
        let text = "---\ntitle: Hello\npublishDate: 2024-01-02\nmodified: 2024-01-03\nexpiryDate: 2025-01-01\n---\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.publishdate, Some(Value::String("2024-01-02".into())));
        assert_eq!(raw.lastmod, Some(Value::String("2024-01-03".into())));
        assert_eq!(raw.expirydate, Some(Value::String("2025-01-01".into())));
    }

    #[test]
    fn unknown_keys_are_preserved() {
        let text = "---\ntitle: Hello\nauthor: Jane\ncover:\n  image: cover.png\n---\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.extra.get("author"), Some(&Value::String("Jane".into())));
        assert_eq!(raw.extra["cover"]["image"], Value::String("cover.png".into()));
        assert!(!raw.extra.contains_key("title"));
    }

    #[test]
    fn empty_header_gives_empty_record() {
        let (raw, body) = parse_front_matter("---\n---\nBody").unwrap();
        assert_eq!(raw, RawMetadata::default());
        assert_eq!(body, "Body");
    }

    #[test]
    fn series_fields() {
        let text = "---\ntitle: Part 2\nseries: landing-zones\nseries_order: 2\n---\n";
        let (raw, _) = parse_front_matter(text).unwrap();
        assert_eq!(raw.series, Some(Value::String("landing-zones".into())));
        assert_eq!(raw.series_order, Some(2));
    }

    #[test]
    fn invalid_yaml_is_malformed() {
        let err = parse_front_matter("---\ntitle: [unclosed\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedFrontMatter);
    }

    #[test]
    fn invalid_toml_is_malformed() {
        let err = parse_front_matter("+++\ntitle = \n+++\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Toml(_)));
    }

    #[test]
    fn scalar_header_is_not_a_mapping() {
        let err = parse_front_matter("---\njust a sentence\n---\n").unwrap_err();
        assert_eq!(err, FrontMatterError::NotAMapping);
    }

    #[test]
    fn wrongly_typed_field_is_malformed() {
        let err = parse_front_matter("---\ntitle: Hello\ndraft: maybe\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidField(_)));
    }

    #[test]
    fn nested_tag_list_is_malformed() {
        let err = parse_front_matter("---\ntitle: Hello\ntags: [[a, b]]\n---\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::InvalidField(_)));
    }
}
