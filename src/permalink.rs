//! Canonical URL paths for published documents.
//!
//! A pattern is a `/`-separated path where segments starting with `:` are
//! substituted per document:
//!
//! | Token | Value |
//! |-------|-------|
//! | `:year` | publish year, 4 digits |
//! | `:month` | publish month, 2 digits |
//! | `:day` | publish day, 2 digits |
//! | `:slug` | document slug |
//! | `:filename` | slugified file stem |
//! | `:section` | first directory of the document id |
//!
//! Date tokens use the publish date in the offset it was written with, so a
//! post dated `2024-05-10T23:30:00-05:00` lands under `/2024/05/10/` even
//! though that instant is already the 11th in UTC.
//!
//! Two published documents resolving to the same path is a hard error. One
//! of them would otherwise be unreachable, and guessing a suffix would
//! silently change a URL the author never chose.

use crate::error::ErrorKind;
use crate::types::Document;
use chrono::Datelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PermalinkError {
    #[error("unknown permalink token `:{0}`")]
    UnknownToken(String),
    #[error("permalink pattern is empty")]
    EmptyPattern,
    #[error("{}", format_collisions(.0))]
    Collision(Vec<Collision>),
}

impl PermalinkError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            PermalinkError::Collision(_) => Some(ErrorKind::PermalinkCollision),
            _ => None,
        }
    }
}

/// Several documents claiming the same path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub path: String,
    /// Offending document ids, sorted.
    pub ids: Vec<String>,
}

fn format_collisions(collisions: &[Collision]) -> String {
    let details: Vec<String> = collisions
        .iter()
        .map(|c| format!("{} <- {}", c.path, c.ids.join(", ")))
        .collect();
    format!("permalink collision: {}", details.join("; "))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year,
    Month,
    Day,
    Slug,
    Filename,
    Section,
}

impl Token {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "year" => Token::Year,
            "month" => Token::Month,
            "day" => Token::Day,
            "slug" => Token::Slug,
            "filename" => Token::Filename,
            "section" => Token::Section,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Token(Token),
}

/// A parsed permalink pattern such as `/blog/:year/:month/:day/:slug`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PermalinkPattern {
    pub fn parse(pattern: &str) -> Result<Self, PermalinkError> {
        let segments = pattern
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) => Token::parse(name)
                    .map(Segment::Token)
                    .ok_or_else(|| PermalinkError::UnknownToken(name.to_string())),
                None => Ok(Segment::Literal(s.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        if segments.is_empty() {
            return Err(PermalinkError::EmptyPattern);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Substitute every token for `doc`. Always starts with `/`, never ends
    /// with one, and drops segments that substitute to nothing.
    pub fn resolve(&self, doc: &Document) -> String {
        let date = doc.publishdate;
        let mut path = String::new();
        for segment in &self.segments {
            let value = match segment {
                Segment::Literal(text) => text.clone(),
                Segment::Token(Token::Year) => format!("{:04}", date.year()),
                Segment::Token(Token::Month) => format!("{:02}", date.month()),
                Segment::Token(Token::Day) => format!("{:02}", date.day()),
                Segment::Token(Token::Slug) => doc.slug.clone(),
                Segment::Token(Token::Filename) => slugify(doc.stem()),
                Segment::Token(Token::Section) => slugify(doc.section()),
            };
            if !value.is_empty() {
                path.push('/');
                path.push_str(&value);
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        path
    }
}

impl fmt::Display for PermalinkPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// URL-safe slug: lowercase, anything that is not alphanumeric becomes `-`,
/// runs of `-` collapse to one, and leading/trailing `-` are trimmed.
///
/// ```
/// use blog_manifest::permalink::slugify;
/// assert_eq!(slugify("My Post!!"), "my-post");
/// assert_eq!(slugify("  Azure -- Bicep & ARM "), "azure-bicep-arm");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Resolve every document's permalink, in input order.
///
/// Fails with every collision found, not just the first.
pub fn resolve_all(
    docs: &[Document],
    pattern: &PermalinkPattern,
) -> Result<Vec<String>, PermalinkError> {
    let paths: Vec<String> = docs.iter().map(|d| pattern.resolve(d)).collect();

    let mut claimed: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (path, doc) in paths.iter().zip(docs) {
        claimed.entry(path.as_str()).or_default().push(doc.id.as_str());
    }

    let collisions: Vec<Collision> = claimed
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .map(|(path, mut ids)| {
            ids.sort_unstable();
            Collision {
                path: path.to_string(),
                ids: ids.into_iter().map(String::from).collect(),
            }
        })
        .collect();

    if collisions.is_empty() {
        Ok(paths)
    } else {
        Err(PermalinkError::Collision(collisions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{document, document_at};

    const BLOG: &str = "/blog/:year/:month/:day/:slug";

    // =========================================================================
    // slugify
    // =========================================================================

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("My Post!!"), "my-post");
        assert_eq!(slugify("--Hello   World--"), "hello-world");
        assert_eq!(slugify("C# & .NET 8"), "c-net-8");
    }

    #[test]
    fn slugify_keeps_unicode_letters() {
        assert_eq!(slugify("Ünïcödé Straße"), "ünïcödé-straße");
    }

    #[test]
    fn slugify_of_punctuation_is_empty() {
        assert_eq!(slugify("!!! ???"), "");
    }

    // =========================================================================
    // Pattern parsing
    // =========================================================================

    #[test]
    fn parse_known_tokens() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        assert_eq!(pattern.as_str(), BLOG);
        assert_eq!(pattern.segments.len(), 5);
    }

    #[test]
    fn unknown_token_rejected() {
        let err = PermalinkPattern::parse("/:year/:weekday/:slug").unwrap_err();
        assert_eq!(err, PermalinkError::UnknownToken("weekday".into()));
        assert_eq!(err.kind(), None);
    }

    #[test]
    fn empty_pattern_rejected() {
        assert_eq!(
            PermalinkPattern::parse("//").unwrap_err(),
            PermalinkError::EmptyPattern
        );
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    #[test]
    fn resolve_blog_pattern() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        let doc = document("posts/a.md", "My Post!!", "2024-05-10");
        assert_eq!(pattern.resolve(&doc), "/blog/2024/05/10/my-post");
    }

    #[test]
    fn resolve_is_deterministic() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        let doc = document("posts/a.md", "Stable", "2024-05-10");
        let first = pattern.resolve(&doc);
        for _ in 0..10 {
            assert_eq!(pattern.resolve(&doc), first);
        }
    }

    #[test]
    fn date_tokens_use_publish_date_in_its_own_offset() {
        let pattern = PermalinkPattern::parse("/:year/:month/:day/:slug").unwrap();
        let doc = document_at("posts/late.md", "Late", "2024-01-01", "2024-12-31T23:30:00-05:00");
        assert_eq!(pattern.resolve(&doc), "/2024/12/31/late");
    }

    #[test]
    fn filename_and_section_tokens() {
        let pattern = PermalinkPattern::parse("/:section/:filename/").unwrap();
        let doc = document("posts/My_Draft.md", "Anything", "2024-05-10");
        assert_eq!(pattern.resolve(&doc), "/posts/my-draft");
    }

    #[test]
    fn empty_section_segment_dropped() {
        let pattern = PermalinkPattern::parse("/:section/:slug").unwrap();
        let doc = document("about.md", "About", "2024-05-10");
        assert_eq!(pattern.resolve(&doc), "/about");
    }

    // =========================================================================
    // Collisions
    // =========================================================================

    #[test]
    fn distinct_paths_resolve_in_order() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        let docs = vec![
            document("posts/a.md", "First", "2024-05-10"),
            document("posts/b.md", "Second", "2024-05-10"),
        ];
        let paths = resolve_all(&docs, &pattern).unwrap();
        assert_eq!(
            paths,
            vec!["/blog/2024/05/10/first", "/blog/2024/05/10/second"]
        );
    }

    #[test]
    fn same_title_same_day_collides() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        let docs = vec![
            document("posts/z.md", "My Post!!", "2024-05-10"),
            document("posts/a.md", "My Post!!", "2024-05-10"),
        ];
        let err = resolve_all(&docs, &pattern).unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::PermalinkCollision));
        assert_eq!(
            err,
            PermalinkError::Collision(vec![Collision {
                path: "/blog/2024/05/10/my-post".into(),
                ids: vec!["posts/a.md".into(), "posts/z.md".into()],
            }])
        );
        assert!(err.to_string().contains("posts/a.md, posts/z.md"));
    }

    #[test]
    fn same_title_different_day_is_fine() {
        let pattern = PermalinkPattern::parse(BLOG).unwrap();
        let docs = vec![
            document("posts/a.md", "My Post", "2024-05-10"),
            document("posts/b.md", "My Post", "2024-05-11"),
        ];
        assert!(resolve_all(&docs, &pattern).is_ok());
    }

    #[test]
    fn every_collision_is_reported() {
        let pattern = PermalinkPattern::parse("/:slug").unwrap();
        let docs = vec![
            document("a.md", "One", "2024-01-01"),
            document("b.md", "One", "2024-02-01"),
            document("c.md", "Two", "2024-01-01"),
            document("d.md", "Two", "2024-02-01"),
            document("e.md", "Three", "2024-01-01"),
        ];
        let PermalinkError::Collision(collisions) = resolve_all(&docs, &pattern).unwrap_err()
        else {
            panic!("expected a collision");
        };
        let paths: Vec<&str> = collisions.iter().map(|c| c.path.as_str()).collect();
        assert_eq!(paths, vec!["/one", "/two"]);
    }
}
