//! Tag and category indexes, and series groupings.
//!
//! Both run after filtering and ordering, over published documents only.
//! Index order follows the order documents are fed in, which the pipeline
//! makes newest first.

use crate::config::SeriesDefinition;
use crate::types::Document;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, warn};

/// Term → ids of the documents carrying it, in first-seen order.
pub type TaxonomyIndex = BTreeMap<String, Vec<String>>;

/// Build a term index in one pass.
///
/// `terms` picks the terms of a document (its tags, its categories, ...).
/// A document appears at most once under each term.
pub fn index_terms<'a, F>(docs: &'a [Document], terms: F) -> TaxonomyIndex
where
    F: Fn(&'a Document) -> &'a [String],
{
    let mut index = TaxonomyIndex::new();
    for doc in docs {
        for term in terms(doc) {
            let ids = index.entry(term.clone()).or_default();
            // A document's terms are visited together, so a repeat is always last.
            if ids.last() != Some(&doc.id) {
                ids.push(doc.id.clone());
            }
        }
    }
    index
}

/// An ordered run of posts meant to be read in sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub key: String,
    /// Member ids in reading order.
    pub documents: Vec<String>,
}

impl Series {
    /// Previous and next member around `id`. `None` on both sides when `id`
    /// is not a member.
    pub fn neighbors(&self, id: &str) -> (Option<&str>, Option<&str>) {
        let Some(pos) = self.documents.iter().position(|d| d == id) else {
            return (None, None);
        };
        let prev = pos
            .checked_sub(1)
            .and_then(|p| self.documents.get(p))
            .map(String::as_str);
        let next = self.documents.get(pos + 1).map(String::as_str);
        (prev, next)
    }

    /// 1-based position of `id` within the series.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.documents.iter().position(|d| d == id).map(|p| p + 1)
    }
}

/// Group published documents into the configured series, sorted by key.
///
/// Ordered series take exactly the listed ids that are published. Auto
/// series take documents declaring the key in front matter, unless they are
/// already listed in an ordered series.
pub fn group_series(
    docs: &[Document],
    definitions: &BTreeMap<String, SeriesDefinition>,
) -> Vec<Series> {
    let by_id: HashMap<&str, &Document> = docs.iter().map(|d| (d.id.as_str(), d)).collect();

    let listed: HashSet<&str> = definitions
        .values()
        .filter_map(|def| match def {
            SeriesDefinition::Ordered(ids) => Some(ids),
            SeriesDefinition::Auto(_) => None,
        })
        .flatten()
        .map(String::as_str)
        .collect();

    for doc in docs {
        if let Some(series) = &doc.series {
            match unused_declaration(doc, definitions) {
                Some(UnusedDeclaration::Undeclared) => {
                    warn!(id = %doc.id, series = %series.key, "series not declared in config, ignoring")
                }
                Some(UnusedDeclaration::NotListed) => {
                    warn!(id = %doc.id, series = %series.key, "not listed in ordered series, ignoring")
                }
                None => {}
            }
        }
    }

    definitions
        .iter()
        .map(|(key, definition)| {
            let documents = match definition {
                SeriesDefinition::Ordered(ids) => ordered_members(key, ids, &by_id),
                SeriesDefinition::Auto(_) => auto_members(key, docs, &listed),
            };
            Series {
                key: key.clone(),
                documents,
            }
        })
        .collect()
}

/// A front matter `series:` that does not make the document a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UnusedDeclaration {
    /// The key has no `[series]` entry.
    Undeclared,
    /// The key names an ordered series whose list leaves the document out.
    NotListed,
}

fn unused_declaration(
    doc: &Document,
    definitions: &BTreeMap<String, SeriesDefinition>,
) -> Option<UnusedDeclaration> {
    let series = doc.series.as_ref()?;
    match definitions.get(&series.key) {
        None => Some(UnusedDeclaration::Undeclared),
        Some(SeriesDefinition::Ordered(ids)) if !ids.contains(&doc.id) => {
            Some(UnusedDeclaration::NotListed)
        }
        Some(_) => None,
    }
}

fn ordered_members(key: &str, ids: &[String], by_id: &HashMap<&str, &Document>) -> Vec<String> {
    ids.iter()
        .filter(|id| {
            let published = by_id.contains_key(id.as_str());
            if !published {
                debug!(series = %key, id = %id, "series member is not published, skipping");
            }
            published
        })
        .cloned()
        .collect()
}

fn auto_members(key: &str, docs: &[Document], listed: &HashSet<&str>) -> Vec<String> {
    let mut members: Vec<&Document> = docs
        .iter()
        .filter(|d| d.series.as_ref().is_some_and(|s| s.key == key))
        .filter(|d| {
            let explicit = listed.contains(d.id.as_str());
            if explicit {
                debug!(series = %key, id = %d.id, "listed in an ordered series, skipping");
            }
            !explicit
        })
        .collect();

    // Explicit positions first, then publish date, then id.
    members.sort_by(|a, b| {
        let order = |d: &Document| d.series.as_ref().and_then(|s| s.order);
        match (order(a), order(b)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
        .then(a.publishdate.cmp(&b.publishdate))
        .then_with(|| a.id.cmp(&b.id))
    });

    members.into_iter().map(|d| d.id.clone()).collect()
}
