//! Turning a set of source documents into a site manifest.
//!
//! ```text
//!            ┌── parse → normalize ──┐
//! sources ───┼── parse → normalize ──┼──▶ filter → order → permalinks → indexes ──▶ manifest
//!            └── parse → normalize ──┘
//!              (parallel, per doc)        (after all documents are in)
//! ```
//!
//! Per-document work runs on rayon's global pool and never touches shared
//! state. A document that fails is recorded in the [`BuildReport`] and the
//! rest of the build goes on without it. Everything after the barrier needs
//! the whole set: ordering, permalink collision checks, and the indexes.
//!
//! Problems that make the whole set meaningless (two files claiming the same
//! id, an unusable permalink pattern, colliding permalinks) fail the build
//! with a [`BuildError`] instead.

use crate::config::SiteConfig;
use crate::error::{DocumentError, DocumentFailure};
use crate::filter::{ExclusionReason, Visibility, visibility};
use crate::frontmatter::parse_front_matter;
use crate::manifest::{PublishedDocument, SiteManifest, manifest_order};
use crate::normalize::{NormalizeSettings, normalize};
use crate::permalink::{PermalinkError, resolve_all};
use crate::scan::ScannedContent;
use crate::taxonomy::{group_series, index_terms};
use crate::types::{Document, SourceDocument};
use chrono::{DateTime, FixedOffset};
use rayon::prelude::*;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Duplicate document id: {0}")]
    DuplicateId(String),
    #[error(transparent)]
    Permalink(#[from] PermalinkError),
}

impl BuildError {
    pub fn kind(&self) -> Option<crate::error::ErrorKind> {
        match self {
            BuildError::DuplicateId(_) => None,
            BuildError::Permalink(e) => e.kind(),
        }
    }
}

/// A document left out of the manifest on purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub id: String,
    pub reason: ExclusionReason,
}

/// Result of a build that got as far as producing a manifest.
#[derive(Debug)]
pub struct BuildReport {
    pub manifest: SiteManifest,
    /// Documents that could not be parsed or normalized, sorted by id.
    pub failures: Vec<DocumentFailure>,
    /// Valid documents held back by the publication filter, sorted by id.
    pub excluded: Vec<Exclusion>,
}

impl BuildReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Parse and normalize one source document.
pub fn load_document(
    source: &SourceDocument,
    settings: &NormalizeSettings,
) -> Result<Document, DocumentError> {
    let (raw, body) = parse_front_matter(&source.text)?;
    Ok(normalize(&source.id, raw, body, settings)?)
}

/// Run every stage over `sources` at `build_time`.
pub fn build(
    sources: &[SourceDocument],
    config: &SiteConfig,
    build_time: DateTime<FixedOffset>,
) -> Result<BuildReport, BuildError> {
    let pattern = config.permalink()?;
    check_unique_ids(sources)?;

    let settings = config.normalize_settings();
    let loaded: Vec<(&str, Result<Document, DocumentError>)> = sources
        .par_iter()
        .map(|source| (source.id.as_str(), load_document(source, &settings)))
        .collect();

    let mut documents = Vec::with_capacity(loaded.len());
    let mut failures = Vec::new();
    for (id, result) in loaded {
        match result {
            Ok(doc) => documents.push(doc),
            Err(error) => {
                warn!(id = %id, kind = %error.kind(), "{error}");
                failures.push(DocumentFailure {
                    id: id.to_string(),
                    error,
                });
            }
        }
    }
    failures.sort_by(|a, b| a.id.cmp(&b.id));

    let mut published = Vec::with_capacity(documents.len());
    let mut excluded = Vec::new();
    for doc in documents {
        match visibility(&doc, build_time, &config.publish) {
            Visibility::Included => published.push(doc),
            Visibility::Excluded(reason) => {
                debug!(id = %doc.id, %reason, "excluded from manifest");
                excluded.push(Exclusion { id: doc.id, reason });
            }
        }
    }
    excluded.sort_by(|a, b| a.id.cmp(&b.id));

    published.sort_by(manifest_order);

    let permalinks = resolve_all(&published, &pattern)?;
    let tags = index_terms(&published, |d| d.tags.as_slice());
    let categories = index_terms(&published, |d| d.categories.as_slice());
    let series = group_series(&published, &config.series);

    info!(
        sources = sources.len(),
        published = published.len(),
        excluded = excluded.len(),
        failed = failures.len(),
        "built manifest"
    );

    let manifest = SiteManifest {
        build_time,
        permalink_pattern: pattern.as_str().to_string(),
        documents: published
            .into_iter()
            .zip(permalinks)
            .map(|(document, permalink)| PublishedDocument {
                document,
                permalink,
            })
            .collect(),
        tags,
        categories,
        series,
    };

    Ok(BuildReport {
        manifest,
        failures,
        excluded,
    })
}

/// [`build`] over a scanned content tree. Files the scan could not read join
/// the report's failures.
pub fn build_content(
    content: &ScannedContent,
    config: &SiteConfig,
    build_time: DateTime<FixedOffset>,
) -> Result<BuildReport, BuildError> {
    let mut report = build(&content.documents, config, build_time)?;
    report.failures.extend(content.unreadable.iter().cloned());
    report.failures.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(report)
}

fn check_unique_ids(sources: &[SourceDocument]) -> Result<(), BuildError> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    for source in sources {
        *seen.entry(source.id.as_str()).or_default() += 1;
    }
    match seen.into_iter().find(|(_, count)| *count > 1) {
        Some((id, _)) => Err(BuildError::DuplicateId(id.to_string())),
        None => Ok(()),
    }
}
