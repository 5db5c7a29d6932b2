//! The site manifest: everything a renderer needs, in one immutable value.
//!
//! ## Output Structure
//!
//! ```json
//! {
//!   "build_time": "2024-06-01T00:00:00Z",
//!   "permalink_pattern": "/blog/:year/:month/:day/:slug",
//!   "documents": [ { "id": "posts/a.md", "title": "...", "permalink": "/blog/2024/05/10/a", ... } ],
//!   "tags": { "azure": ["posts/a.md"] },
//!   "categories": {},
//!   "series": [ { "key": "zones", "documents": ["posts/a.md"] } ]
//! }
//! ```
//!
//! Serialization is deterministic: documents are in a fixed order, every map
//! is sorted, so identical inputs produce byte-identical JSON and the same
//! [`SiteManifest::fingerprint`].

use crate::taxonomy::{Series, TaxonomyIndex};
use crate::types::Document;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A published document with its resolved URL path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedDocument {
    #[serde(flatten)]
    pub document: Document,
    pub permalink: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteManifest {
    pub build_time: DateTime<FixedOffset>,
    pub permalink_pattern: String,
    /// Newest first by publish date, ties by id.
    pub documents: Vec<PublishedDocument>,
    pub tags: TaxonomyIndex,
    pub categories: TaxonomyIndex,
    /// Sorted by key.
    pub series: Vec<Series>,
}

impl SiteManifest {
    pub fn document(&self, id: &str) -> Option<&PublishedDocument> {
        self.documents.iter().find(|d| d.document.id == id)
    }

    pub fn series(&self, key: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.key == key)
    }

    /// The series `id` belongs to, if any.
    pub fn series_of(&self, id: &str) -> Option<&Series> {
        self.series
            .iter()
            .find(|s| s.documents.iter().any(|d| d == id))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// SHA-256 hex digest of [`to_json`](Self::to_json).
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        let json = self.to_json()?;
        let digest = Sha256::digest(json.as_bytes());
        Ok(format!("{:x}", digest))
    }
}

/// Newest first by publish instant; equal instants fall back to id.
pub fn manifest_order(a: &Document, b: &Document) -> std::cmp::Ordering {
    b.publishdate
        .cmp(&a.publishdate)
        .then_with(|| a.id.cmp(&b.id))
}
