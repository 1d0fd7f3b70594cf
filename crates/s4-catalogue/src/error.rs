//! Error types for s4-catalogue

use std::fmt;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Classification of a catalogue load failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// Malformed document or a value of the wrong type
    SchemaError,
    /// Two conflicting entities share a name
    DuplicateName,
    /// A reference to a flag or architecture that cannot be resolved
    DanglingReference,
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SchemaError => write!(f, "schema error"),
            Self::DuplicateName => write!(f, "duplicate name"),
            Self::DanglingReference => write!(f, "dangling reference"),
        }
    }
}

/// A fatal problem found while loading catalogue documents
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} in {document}: {detail}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    /// Label of the document the problem was found in
    pub document: String,
    pub detail: String,
}

impl LoadError {
    pub fn schema(document: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::SchemaError, document, detail)
    }

    pub fn duplicate(document: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::DuplicateName, document, detail)
    }

    pub fn dangling(document: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::DanglingReference, document, detail)
    }

    fn new(kind: LoadErrorKind, document: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            kind,
            document: document.into(),
            detail: detail.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalogue document not found at {path}")]
    DocumentNotFound { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
