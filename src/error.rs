//! Error taxonomy shared by every stage.
//!
//! Each stage owns its own `thiserror` enum. [`ErrorKind`] classifies them
//! into the failure categories a build report distinguishes, and
//! [`DocumentError`] is what a single document can fail with before the
//! whole-set stages run.

use crate::frontmatter::FrontMatterError;
use crate::normalize::NormalizeError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedFrontMatter,
    MissingRequiredField,
    InvalidDate,
    PermalinkCollision,
    Unreadable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedFrontMatter => "malformed front matter",
            ErrorKind::MissingRequiredField => "missing required field",
            ErrorKind::InvalidDate => "invalid date",
            ErrorKind::PermalinkCollision => "permalink collision",
            ErrorKind::Unreadable => "unreadable file",
        };
        f.write_str(name)
    }
}

/// Why a single document was dropped from the build.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error(transparent)]
    FrontMatter(#[from] FrontMatterError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error("could not read file: {0}")]
    Unreadable(String),
}

impl DocumentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DocumentError::FrontMatter(e) => e.kind(),
            DocumentError::Normalize(e) => e.kind(),
            DocumentError::Unreadable(_) => ErrorKind::Unreadable,
        }
    }
}

/// A per-document failure, recorded in the build report instead of
/// aborting the build.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentFailure {
    pub id: String,
    pub error: DocumentError,
}

impl fmt::Display for DocumentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.error)
    }
}
