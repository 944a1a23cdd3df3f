//! Error taxonomy shared by every persistence component.
//!
//! Three families, each carrying a discriminant, the offending path and an
//! optional cause:
//! - [`LoadError`] -- raised by load orchestration and format loaders
//! - [`ImportError`] -- raised by the importer while pulling in resources
//! - [`DumpError`] -- raised by the write side
//!
//! Re-wrapping keeps the inner error as `source`, so the full chain stays
//! walkable via [`PersistError::chain`].

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Boxed cause attached to a wrapping error.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Load family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadErrorKind {
    ImportError = 1,
    ParseError = 2,
    NotSupported = 3,
    RequirementMissing = 4,
}

impl LoadErrorKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for LoadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ImportError => "import error",
            Self::ParseError => "parse error",
            Self::NotSupported => "not supported",
            Self::RequirementMissing => "requirement missing",
        })
    }
}

/// A resource could not be loaded.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct LoadError {
    pub kind: LoadErrorKind,
    pub path: Option<PathBuf>,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl LoadError {
    fn new(kind: LoadErrorKind, path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
            source: None,
        }
    }

    pub fn import_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::ImportError, path, message)
    }

    pub fn parse_error(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::ParseError, path, message)
    }

    pub fn not_supported(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::NotSupported, path, message)
    }

    pub fn requirement_missing(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self::new(LoadErrorKind::RequirementMissing, path, message)
    }

    /// Attaches the error that caused this one.
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u8 {
        self.kind.code()
    }

    /// The cause, if it is an [`ImportError`].
    pub fn import_cause(&self) -> Option<&ImportError> {
        self.source.as_deref()?.downcast_ref::<ImportError>()
    }
}

// ---------------------------------------------------------------------------
// Import family
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportErrorKind {
    NotExists = 1,
    MergeError = 2,
    RecursionError = 3,
}

impl ImportErrorKind {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ImportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotExists => "not exists",
            Self::MergeError => "merge error",
            Self::RecursionError => "recursion error",
        })
    }
}

/// An imported resource could not be pulled into its importer.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ImportError {
    pub kind: ImportErrorKind,
    pub path: PathBuf,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl ImportError {
    fn new(kind: ImportErrorKind, path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn not_exists(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!("Unable to import `{}`, file not exists", path.display());
        Self::new(ImportErrorKind::NotExists, path, message)
    }

    /// `actual` names the type that was found where a mapping was expected.
    pub fn merge(path: impl Into<PathBuf>, actual: &str) -> Self {
        let path = path.into();
        let message = format!(
            "Unable to merge configuration, `mapping` type expected, `{actual}` got, in `{}`",
            path.display()
        );
        Self::new(ImportErrorKind::MergeError, path, message)
    }

    pub fn recursion(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let message = format!(
            "Unable to import `{}`, it is already being loaded (import cycle)",
            path.display()
        );
        Self::new(ImportErrorKind::RecursionError, path, message)
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u8 {
        self.kind.code()
    }
}

// ---------------------------------------------------------------------------
// Dump family
// ---------------------------------------------------------------------------

/// A document could not be written.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DumpError {
    pub path: Option<PathBuf>,
    pub message: String,
    #[source]
    pub source: Option<BoxError>,
}

impl DumpError {
    pub fn new(path: Option<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn code(&self) -> u8 {
        0
    }
}

// ---------------------------------------------------------------------------
// Unified error
// ---------------------------------------------------------------------------

/// Any failure surfaced by a persistence operation.
///
/// `Io` is the raw filesystem failure a load-contract implementation reports
/// when it cannot read its resource. The importer turns `NotFound` into
/// [`ImportErrorKind::NotExists`]; other I/O failures pass through untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PersistError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error("I/O error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Path of the resource this error originates from, if known.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Load(e) => e.path.as_deref(),
            Self::Import(e) => Some(&e.path),
            Self::Dump(e) => e.path.as_deref(),
            Self::Io { path, .. } => Some(path),
        }
    }

    /// Walks this error and every cause below it, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &(dyn StdError + 'static)> {
        let first: &(dyn StdError + 'static) = match self {
            Self::Load(e) => e,
            Self::Import(e) => e,
            Self::Dump(e) => e,
            Self::Io { .. } => self,
        };
        std::iter::successors(Some(first), |&e| e.source())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

pub type PersistResult<T> = Result<T, PersistError>;
