//! Publication eligibility.
//!
//! A document is published unless one of these holds at build time:
//!
//! - it is a draft,
//! - its publish date is still in the future,
//! - its expiry date has passed.
//!
//! Each rule can be lifted from the `[publish]` config section (or the
//! matching CLI flag) to preview unpublished content.

use crate::config::PublishConfig;
use crate::types::Document;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    Draft,
    Scheduled,
    Expired,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExclusionReason::Draft => "draft",
            ExclusionReason::Scheduled => "scheduled for later",
            ExclusionReason::Expired => "expired",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Included,
    Excluded(ExclusionReason),
}

impl Visibility {
    pub fn is_included(&self) -> bool {
        matches!(self, Visibility::Included)
    }
}

/// Decide whether `doc` is published at `build_time`.
///
/// A publish date equal to the build time counts as published; an expiry
/// date equal to the build time counts as expired.
pub fn visibility(
    doc: &Document,
    build_time: DateTime<FixedOffset>,
    publish: &PublishConfig,
) -> Visibility {
    if doc.draft && !publish.drafts {
        return Visibility::Excluded(ExclusionReason::Draft);
    }
    if doc.publishdate > build_time && !publish.future {
        return Visibility::Excluded(ExclusionReason::Scheduled);
    }
    if let Some(expiry) = doc.expirydate
        && expiry <= build_time
        && !publish.expired
    {
        return Visibility::Excluded(ExclusionReason::Expired);
    }
    Visibility::Included
}
