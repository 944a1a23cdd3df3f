//! Capabilities supplied by format implementations and callers.

use crate::error::{DumpError, PersistResult};
use crate::types::{Document, FileGraph, Loaded, ResolvedImport};
use serde_json::Value;
use std::path::Path;

/// Reads and parses one resource.
///
/// Implementations report a missing resource as [`PersistError::Io`] with a
/// `NotFound` kind; translating that into an import failure is the
/// importer's job. Formats with their own imports are expected to run the
/// load orchestration before returning, so `Loaded::graph` already covers
/// everything the resource pulled in.
///
/// [`PersistError::Io`]: crate::PersistError::Io
pub trait Load {
    /// Pure predicate used to pick a loader for a path.
    fn supports(&self, path: &Path) -> bool;

    fn load(&self, path: &Path) -> PersistResult<Loaded>;
}

/// Writes a document to a resource.
pub trait Dump {
    fn dump(&self, path: &Path, data: &Value) -> Result<(), DumpError>;
}

/// Pulls resolved resources into a base document.
///
/// Imported content is lower precedence than `content`.
pub trait Import {
    fn import(
        &self,
        content: Document,
        resources: &[ResolvedImport],
    ) -> PersistResult<(Document, FileGraph)>;
}

/// Combines two documents; `right` takes precedence over `left`.
pub trait Merge {
    fn merge(&self, left: Document, right: Document) -> Document;
}

impl<F> Merge for F
where
    F: Fn(Document, Document) -> Document,
{
    fn merge(&self, left: Document, right: Document) -> Document {
        self(left, right)
    }
}
