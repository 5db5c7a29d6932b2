//! Content discovery.
//!
//! Walks the content root and hands every post to the pipeline as a
//! [`SourceDocument`].
//!
//! ## Directory Structure
//!
//! ```text
//! content/                         # Content root
//! ├── config.toml                  # Site configuration (optional)
//! ├── about.md                     # id: about.md
//! ├── posts/
//! │   ├── azure-landing-zones.md   # id: posts/azure-landing-zones.md
//! │   ├── _index.md                # Leading underscore = skipped
//! │   └── 2024/
//! │       └── bicep-modules.markdown
//! ├── .obsidian/                   # Hidden = skipped, with everything inside
//! └── images/diagram.png           # Not Markdown = skipped
//! ```
//!
//! ## Naming Conventions
//!
//! - **Ids** are paths relative to the root with `/` separators, whatever
//!   the platform
//! - **Output order** is lexical by id, so scans of the same tree always
//!   produce the same list
//!
//! A file that cannot be read as UTF-8 text is a per-document failure, the
//! same as a post with broken front matter. It is listed in
//! [`ScannedContent::unreadable`] and the scan carries on.

use crate::error::{DocumentError, DocumentFailure};
use crate::types::SourceDocument;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Content root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Everything found under the content root, both sets sorted by id.
#[derive(Debug, Default)]
pub struct ScannedContent {
    pub documents: Vec<SourceDocument>,
    /// Markdown files whose bytes could not be read as text.
    pub unreadable: Vec<DocumentFailure>,
}

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

pub fn scan(root: &Path) -> Result<ScannedContent, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }

    let mut content = ScannedContent::default();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }
        let id = relative_id(root, entry.path());
        match fs::read_to_string(entry.path()) {
            Ok(text) => content.documents.push(SourceDocument::new(id, text)),
            Err(e) => {
                let error = DocumentError::Unreadable(e.to_string());
                warn!(id = %id, kind = %error.kind(), "{error}");
                content.unreadable.push(DocumentFailure { id, error });
            }
        }
    }

    content.documents.sort_by(|a, b| a.id.cmp(&b.id));
    content.unreadable.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(content)
}

/// Hidden entries and `_`-prefixed entries are not content.
fn is_skipped(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.') || name.starts_with('_'))
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| MARKDOWN_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn relative_id(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
