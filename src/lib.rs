//! # Blog Manifest
//!
//! A content pipeline for Markdown blogs. Posts carry their metadata in a
//! front matter header; the pipeline validates it, decides what is
//! published, assigns every post a permanent URL, groups posts by tag,
//! category and series, and writes it all out as one JSON manifest for a
//! renderer to consume.
//!
//! # Architecture: Fork, Then Join
//!
//! ```text
//! 1. Scan       content/   →  [(id, text)]        (filesystem → source documents)
//! 2. Load       each doc   →  Document            (parse + normalize, in parallel)
//! 3. Assemble   all docs   →  manifest.json       (filter, order, permalinks, indexes)
//! ```
//!
//! Loading a document only ever looks at that document, so step 2 runs on
//! rayon's pool with no shared state. Step 3 needs the whole set: ordering,
//! collision checks and indexes are all questions about every post at once.
//!
//! A bad post does not stop the build. It is reported with its id and the
//! reason, and the manifest is built from everything else. Only problems
//! that make the manifest itself wrong (duplicate ids, colliding permalinks)
//! fail the whole build.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks the content directory, yields sorted source documents |
//! | [`frontmatter`] | Splits `---` YAML / `+++` TOML headers from the body |
//! | [`normalize`] | Required fields, timestamps, defaults, slugs, summaries |
//! | [`filter`] | Draft / scheduled / expired decisions against the build time |
//! | [`permalink`] | Pattern parsing, slugify, path resolution, collision detection |
//! | [`taxonomy`] | Tag and category indexes, series grouping and navigation |
//! | [`manifest`] | The serialized output and its fingerprint |
//! | [`pipeline`] | Runs every stage and collects per-document failures |
//! | [`config`] | `config.toml` loading, validation, and merging over stock defaults |
//! | [`types`] | Shared document types |
//! | [`error`] | Error categories shared by the stages |
//! | [`output`] | CLI output formatting for build reports |
//!
//! # Design Decisions
//!
//! ## Collisions Are Errors
//!
//! Two posts resolving to the same permalink fail the build. Appending `-2`
//! would make one post's URL depend on which file sorts first, and a URL
//! that silently changes between builds breaks every inbound link.
//!
//! ## Timestamps Keep Their Offset
//!
//! Dates are stored with the offset the author wrote. Publication checks
//! compare instants, while permalinks use the calendar day the author saw.
//!
//! ## Config Is a Value
//!
//! [`config::SiteConfig`] is loaded once and passed by reference into
//! [`pipeline::build`]. Nothing reads configuration from global state, so
//! tests can build any number of sites side by side.

pub mod config;
pub mod error;
pub mod filter;
pub mod frontmatter;
pub mod manifest;
pub mod normalize;
pub mod output;
pub mod permalink;
pub mod pipeline;
pub mod scan;
pub mod taxonomy;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
