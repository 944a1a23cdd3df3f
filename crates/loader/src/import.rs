//! Default importer: load each resource, check its shape, merge it under
//! the importing document.

use persist_core::types::value_kind;
use persist_core::{
    Document, FileGraph, Import, ImportError, ImportKind, Load, Merge, PersistError,
    PersistResult, ResolvedImport,
};
use serde_json::Value;
use std::io;

/// Loads resources through a [`Load`] and folds them in with a [`Merge`].
///
/// Holds no synchronization; use one instance per load operation.
pub struct DefaultImport<'a> {
    load: &'a dyn Load,
    merge: &'a dyn Merge,
}

impl<'a> DefaultImport<'a> {
    pub fn new(load: &'a dyn Load, merge: &'a dyn Merge) -> Self {
        Self { load, merge }
    }
}

impl Import for DefaultImport<'_> {
    /// Resources are processed in order. Each one is merged as `left`, with
    /// the document accumulated so far as `right`, so the importing file
    /// always wins.
    ///
    /// # Panics
    ///
    /// On a [`ImportKind::Directory`] resource; directory import is not
    /// implemented.
    fn import(
        &self,
        mut content: Document,
        resources: &[ResolvedImport],
    ) -> PersistResult<(Document, FileGraph)> {
        let mut graph = FileGraph::new();

        for resource in resources {
            if resource.kind == ImportKind::Directory {
                unimplemented!("directory import is not implemented yet");
            }

            let loaded = match self.load.load(&resource.path) {
                Ok(loaded) => loaded,
                Err(PersistError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    return Err(ImportError::not_exists(resource.path.clone())
                        .with_source(source)
                        .into());
                }
                Err(e) => return Err(e),
            };

            let imported = match loaded.content {
                Value::Object(map) => map,
                other => {
                    return Err(ImportError::merge(resource.path.clone(), value_kind(&other)).into());
                }
            };

            tracing::debug!(
                path = %resource.path.display(),
                keys = imported.len(),
                files = loaded.graph.len(),
                "imported resource"
            );

            for file in graph.union(loaded.graph) {
                tracing::warn!(path = %file.display(), "dependency graph entry overwritten");
            }
            content = self.merge.merge(imported, content);
        }

        Ok((content, graph))
    }
}
