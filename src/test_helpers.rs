//! Shared test utilities for the blog-manifest test suite.
//!
//! Builders for already-normalized documents (so stage tests don't go through
//! the front matter parser) and lookup helpers that panic with the list of
//! what *was* there when something is missing.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let report = build(&[post("posts/a.md", "A", "2024-05-10")], &config, at("2024-06-01")).unwrap();
//! let doc = find_document(&report.manifest, "posts/a.md");
//! assert_eq!(doc.permalink, "/blog/2024/05/10/a");
//! ```

use chrono::{DateTime, FixedOffset};
use std::collections::BTreeMap;

use crate::manifest::{PublishedDocument, SiteManifest};
use crate::normalize::parse_timestamp;
use crate::taxonomy::Series;
use crate::types::{Document, SeriesRef, SourceDocument};

// =========================================================================
// Builders
// =========================================================================

/// Parse a timestamp or panic.
pub fn at(raw: &str) -> DateTime<FixedOffset> {
    parse_timestamp(raw).unwrap_or_else(|| panic!("bad test timestamp '{raw}'"))
}

/// A normalized document whose publish date equals its date.
pub fn document(id: &str, title: &str, date: &str) -> Document {
    document_at(id, title, date, date)
}

/// A normalized document with separate date and publish date.
pub fn document_at(id: &str, title: &str, date: &str, publishdate: &str) -> Document {
    let date = at(date);
    let publishdate = at(publishdate);
    Document {
        id: id.to_string(),
        title: title.to_string(),
        slug: crate::permalink::slugify(title),
        date,
        publishdate,
        lastmod: publishdate,
        expirydate: None,
        tags: Vec::new(),
        categories: Vec::new(),
        summary: None,
        draft: false,
        series: None,
        word_count: 0,
        reading_time: 0,
        extra: BTreeMap::new(),
        body: String::new(),
    }
}

/// Attach a front matter series declaration to `doc`.
pub fn in_series(mut doc: Document, key: &str, order: Option<u32>) -> Document {
    doc.series = Some(SeriesRef {
        key: key.to_string(),
        order,
    });
    doc
}

/// A YAML-front-matter source file with the given title and date.
pub fn post(id: &str, title: &str, date: &str) -> SourceDocument {
    SourceDocument::new(
        id,
        format!("---\ntitle: \"{title}\"\ndate: {date}\n---\nBody of {title}.\n"),
    )
}

/// A source file with extra YAML front matter lines.
pub fn post_with(id: &str, title: &str, date: &str, extra_yaml: &str) -> SourceDocument {
    SourceDocument::new(
        id,
        format!("---\ntitle: \"{title}\"\ndate: {date}\n{extra_yaml}\n---\nBody of {title}.\n"),
    )
}

// =========================================================================
// Manifest lookups (panic with a clear message on miss)
// =========================================================================

/// Find a published document by id. Panics if not found.
pub fn find_document<'a>(manifest: &'a SiteManifest, id: &str) -> &'a PublishedDocument {
    manifest
        .documents
        .iter()
        .find(|d| d.document.id == id)
        .unwrap_or_else(|| {
            let ids = document_ids(manifest);
            panic!("document '{id}' not found. Available: {ids:?}")
        })
}

/// Find a series by key. Panics if not found.
pub fn find_series<'a>(manifest: &'a SiteManifest, key: &str) -> &'a Series {
    manifest
        .series
        .iter()
        .find(|s| s.key == key)
        .unwrap_or_else(|| {
            let keys: Vec<&str> = manifest.series.iter().map(|s| s.key.as_str()).collect();
            panic!("series '{key}' not found. Available: {keys:?}")
        })
}

// =========================================================================
// Bulk extractors
// =========================================================================

/// All document ids in manifest order.
pub fn document_ids(manifest: &SiteManifest) -> Vec<&str> {
    manifest
        .documents
        .iter()
        .map(|d| d.document.id.as_str())
        .collect()
}

/// Ids listed under a tag, in index order. Empty when the tag is absent.
pub fn tag_ids<'a>(manifest: &'a SiteManifest, tag: &str) -> Vec<&'a str> {
    manifest
        .tags
        .get(tag)
        .map(|ids| ids.iter().map(String::as_str).collect())
        .unwrap_or_default()
}
