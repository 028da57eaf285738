//! Content loading errors

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::FrontMatterError;

/// Files that resolved to the same slug
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlugConflict {
    pub slug: String,
    pub files: Vec<PathBuf>,
}

impl fmt::Display for SlugConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files: Vec<_> = self.files.iter().map(|p| p.display().to_string()).collect();
        write!(f, "`{}` <- [{}]", self.slug, files.join(", "))
    }
}

/// Errors raised while building the post collection
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("{}: malformed front-matter: {source}", .path.display())]
    MalformedFrontMatter {
        path: PathBuf,
        #[source]
        source: FrontMatterError,
    },

    #[error("{}: invalid date {value:?} (expected YYYY-MM-DD)", .path.display())]
    InvalidDate { path: PathBuf, value: String },

    #[error("{}: file name does not produce a usable slug", .path.display())]
    EmptySlug { path: PathBuf },

    #[error("duplicate slugs: {}", format_conflicts(.conflicts))]
    DuplicateSlug { conflicts: Vec<SlugConflict> },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Attach the offending file to a parser error
    pub fn front_matter(path: PathBuf, err: FrontMatterError) -> Self {
        match err {
            FrontMatterError::InvalidDate(value) => Self::InvalidDate { path, value },
            source => Self::MalformedFrontMatter { path, source },
        }
    }

    /// File the error is about, if it concerns a single file
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::MalformedFrontMatter { path, .. }
            | Self::InvalidDate { path, .. }
            | Self::EmptySlug { path }
            | Self::Io { path, .. } => Some(path),
            Self::DuplicateSlug { .. } => None,
        }
    }
}

fn format_conflicts(conflicts: &[SlugConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
