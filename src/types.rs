//! Shared types used across all pipeline stages.
//!
//! A [`SourceDocument`] enters the pipeline, is parsed and normalized into a
//! [`Document`], and leaves it inside the site manifest. Documents are
//! immutable once normalized; later stages only read them.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A content file as handed over by file discovery: relative path plus raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    /// Path relative to the content root, `/`-separated (e.g. `posts/my-post.md`).
    pub id: String,
    /// Full file contents, front matter included.
    pub text: String,
}

impl SourceDocument {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }

    /// File name without extension (`posts/my-post.md` → `my-post`).
    pub fn stem(&self) -> &str {
        file_stem(&self.id)
    }
}

/// Series membership declared in a document's front matter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRef {
    pub key: String,
    /// Explicit position within the series; documents without one are
    /// ordered by publish date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
}

/// A fully normalized blog post.
///
/// Every timestamp keeps the offset it was written with so permalinks use
/// the author's calendar day, while comparisons happen on the instant.
/// A renderer can read a manifest entry straight back into a `Document`;
/// the entry's extra `permalink` key is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub date: DateTime<FixedOffset>,
    pub publishdate: DateTime<FixedOffset>,
    pub lastmod: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expirydate: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesRef>,
    pub word_count: usize,
    /// Estimated reading time in whole minutes.
    pub reading_time: usize,
    /// Front matter keys the pipeline does not interpret, passed through to
    /// the renderer untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
    pub body: String,
}

impl Document {
    /// File name without extension.
    pub fn stem(&self) -> &str {
        file_stem(&self.id)
    }

    /// First directory of the id, or `""` for top-level files.
    pub fn section(&self) -> &str {
        match self.id.split_once('/') {
            Some((section, _)) => section,
            None => "",
        }
    }
}

pub(crate) fn file_stem(id: &str) -> &str {
    let name = id.rsplit('/').next().unwrap_or(id);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(dot) => &name[..dot],
    }
}
