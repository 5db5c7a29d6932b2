//! CLI output formatting for build results.
//!
//! # Information-First Display
//!
//! Every published post leads with its positional index and title, followed
//! by where it will live. The source file and the taxonomy it joined are
//! shown as indented context lines, so the report reads as a content
//! inventory while still pointing back at files.
//!
//! # Output Format
//!
//! ```text
//! Documents
//! 001 Azure Landing Zones → /blog/2024/05/10/azure-landing-zones
//!     Source: posts/azure-landing-zones.md
//!     Tags: azure, bicep
//!     Series: zones (2/3)
//!
//! Excluded
//!     posts/next-week.md: scheduled for later
//!
//! Failed
//!     posts/broken.md: missing required field `date`
//!
//! Tags
//!     azure (4)
//!
//! Series
//!     zones (3 posts)
//!
//! Published 12 documents, excluded 1, failed 1
//! ```
//!
//! # Architecture
//!
//! `format_*` functions return `Vec<String>` for testability and `print_*`
//! wrappers write to stdout. Format functions are pure.

use crate::manifest::SiteManifest;
use crate::permalink::PermalinkError;
use crate::pipeline::{BuildError, BuildReport};
use crate::taxonomy::TaxonomyIndex;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

// ============================================================================
// Build report
// ============================================================================

/// Format the full build report.
pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = format_documents(&report.manifest);

    if !report.excluded.is_empty() {
        lines.push(String::new());
        lines.push("Excluded".to_string());
        for exclusion in &report.excluded {
            lines.push(format!("{}{}: {}", indent(1), exclusion.id, exclusion.reason));
        }
    }

    if !report.failures.is_empty() {
        lines.push(String::new());
        lines.push("Failed".to_string());
        for failure in &report.failures {
            lines.push(format!("{}{}", indent(1), failure));
        }
    }

    lines.extend(format_index_section("Tags", &report.manifest.tags));
    lines.extend(format_index_section("Categories", &report.manifest.categories));

    if !report.manifest.series.is_empty() {
        lines.push(String::new());
        lines.push("Series".to_string());
        for series in &report.manifest.series {
            lines.push(format!(
                "{}{} ({})",
                indent(1),
                series.key,
                plural(series.documents.len(), "post")
            ));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Published {}, excluded {}, failed {}",
        plural(report.manifest.documents.len(), "document"),
        report.excluded.len(),
        report.failures.len()
    ));
    lines
}

fn format_documents(manifest: &SiteManifest) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];
    for (i, published) in manifest.documents.iter().enumerate() {
        let doc = &published.document;
        lines.push(format!(
            "{} {} → {}",
            format_index(i + 1),
            doc.title,
            published.permalink
        ));
        lines.push(format!("{}Source: {}", indent(1), doc.id));
        if !doc.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), doc.tags.join(", ")));
        }
        if let Some(series) = manifest.series_of(&doc.id)
            && let Some(pos) = series.position(&doc.id)
        {
            lines.push(format!(
                "{}Series: {} ({}/{})",
                indent(1),
                series.key,
                pos,
                series.documents.len()
            ));
        }
    }
    lines
}

fn format_index_section(heading: &str, index: &TaxonomyIndex) -> Vec<String> {
    if index.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), heading.to_string()];
    for (term, ids) in index {
        lines.push(format!("{}{} ({})", indent(1), term, ids.len()));
    }
    lines
}

/// Format a whole-build failure.
///
/// Collisions get one line per path so each clash is easy to find.
pub fn format_build_error(error: &BuildError) -> Vec<String> {
    match error {
        BuildError::Permalink(PermalinkError::Collision(collisions)) => {
            let mut lines = vec!["Permalink collision".to_string()];
            for collision in collisions {
                lines.push(format!("{}{}", indent(1), collision.path));
                for id in &collision.ids {
                    lines.push(format!("{}{}", indent(2), id));
                }
            }
            lines
        }
        other => vec![other.to_string()],
    }
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

pub fn print_build_error(error: &BuildError) {
    for line in format_build_error(error) {
        eprintln!("{}", line);
    }
}
