//! File-backed loader: picks a [`Format`] by extension, reads the file and
//! runs [`do_load`] on its imports with itself as the nested loader.

use crate::format::{Format, JsonFormat, TomlFormat};
use crate::import::DefaultImport;
use crate::load::{absolute, do_load, import_failure, resolve_import};
use crate::merge::DeepMerge;
use persist_core::{
    DumpError, Dump, FileGraph, ImportDeclaration, ImportError, Load, LoadError, Loaded, Merge,
    PersistError, PersistResult,
};
use serde_json::Value;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads and dumps documents on the local filesystem.
///
/// Tracks the files currently being loaded so an import cycle fails with
/// [`ImportErrorKind::RecursionError`] instead of recursing forever. That
/// state makes the loader `!Sync`: use one per thread.
///
/// ```ignore
/// let loader = FileLoader::new();
/// let loaded = loader.load(Path::new("config/app.toml"))?;
/// ```
///
/// [`ImportErrorKind::RecursionError`]: persist_core::ImportErrorKind::RecursionError
pub struct FileLoader {
    formats: Vec<Box<dyn Format>>,
    merge: Box<dyn Merge>,
    loading: RefCell<Vec<PathBuf>>,
}

impl FileLoader {
    /// JSON and TOML formats with [`DeepMerge`].
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> FileLoaderBuilder {
        FileLoaderBuilder::default()
    }

    /// The first registered format that handles `path`.
    pub fn format_for(&self, path: &Path) -> Option<&dyn Format> {
        self.formats
            .iter()
            .map(Box::as_ref)
            .find(|format| format.supports(path))
    }

    fn load_file(&self, format: &dyn Format, path: &Path) -> PersistResult<Loaded> {
        let text = fs::read_to_string(path).map_err(|e| PersistError::io(path, e))?;
        let parsed = format.parse(path, &text)?;

        tracing::debug!(
            path = %path.display(),
            format = format.name(),
            imports = parsed.imports.len(),
            "parsed"
        );

        let content = match parsed.content {
            Value::Object(map) => map,
            other => return Ok(Loaded::new(other, FileGraph::with_root(path))),
        };

        check_imports(path, &parsed.imports)?;

        let importer = DefaultImport::new(self, self.merge.as_ref());
        let (content, graph) = do_load(content, &parsed.imports, path, &importer)?;
        Ok(Loaded::new(Value::Object(content), graph))
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Marks a file as in progress until dropped, unwinding included.
struct LoadingEntry<'a> {
    stack: &'a RefCell<Vec<PathBuf>>,
}

impl<'a> LoadingEntry<'a> {
    fn push(stack: &'a RefCell<Vec<PathBuf>>, path: PathBuf) -> Self {
        stack.borrow_mut().push(path);
        Self { stack }
    }
}

impl Drop for LoadingEntry<'_> {
    fn drop(&mut self) {
        self.stack.borrow_mut().pop();
    }
}

/// Fails with a load `ImportError` caused by `NotExists` for the first
/// declaration that does not exist as its declared kind.
fn check_imports(filename: &Path, imports: &[ImportDeclaration]) -> Result<(), LoadError> {
    for declaration in imports {
        let path = resolve_import(filename, declaration);
        if !declaration.kind.matches(&path) {
            return Err(import_failure(filename, ImportError::not_exists(path)));
        }
    }
    Ok(())
}

impl Load for FileLoader {
    fn supports(&self, path: &Path) -> bool {
        self.format_for(path).is_some()
    }

    fn load(&self, path: &Path) -> PersistResult<Loaded> {
        let path = absolute(path);
        let format = self.format_for(&path).ok_or_else(|| {
            LoadError::not_supported(
                Some(path.clone()),
                format!("No format registered for `{}`", path.display()),
            )
        })?;

        // Symlinked directories can reach the same file under endless
        // lexical paths, so revisits are detected on the canonical one.
        let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if self.loading.borrow().contains(&key) {
            return Err(ImportError::recursion(path).into());
        }

        let result = {
            let _entry = LoadingEntry::push(&self.loading, key);
            self.load_file(format, &path)
        };

        if let Ok(loaded) = &result {
            if self.loading.borrow().is_empty() {
                tracing::info!(
                    path = %path.display(),
                    files = loaded.graph.len(),
                    "loaded"
                );
            }
        }
        result
    }
}

impl Dump for FileLoader {
    fn dump(&self, path: &Path, data: &Value) -> Result<(), DumpError> {
        let format = self.format_for(path).ok_or_else(|| {
            DumpError::new(
                Some(path.to_path_buf()),
                format!("No format registered for `{}`", path.display()),
            )
        })?;

        let text = format.encode(data).map_err(|e| {
            DumpError::new(
                Some(path.to_path_buf()),
                format!("Unable to encode `{}` as {}: {e}", path.display(), format.name()),
            )
            .with_source(e)
        })?;

        let write_error = |e: std::io::Error| {
            DumpError::new(
                Some(path.to_path_buf()),
                format!("Unable to write `{}`: {e}", path.display()),
            )
            .with_source(e)
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }
        fs::write(path, text).map_err(write_error)?;

        tracing::debug!(path = %path.display(), format = format.name(), "dumped");
        Ok(())
    }
}

/// Registers extra formats and a custom merge for a [`FileLoader`].
///
/// Formats added here are consulted before the built-in JSON and TOML ones.
#[derive(Default)]
pub struct FileLoaderBuilder {
    formats: Vec<Box<dyn Format>>,
    merge: Option<Box<dyn Merge>>,
}

impl FileLoaderBuilder {
    pub fn format(mut self, format: impl Format + 'static) -> Self {
        self.formats.push(Box::new(format));
        self
    }

    pub fn merge(mut self, merge: impl Merge + 'static) -> Self {
        self.merge = Some(Box::new(merge));
        self
    }

    pub fn build(self) -> FileLoader {
        let mut formats = self.formats;
        formats.push(Box::new(JsonFormat));
        formats.push(Box::new(TomlFormat));
        FileLoader {
            formats,
            merge: self.merge.unwrap_or_else(|| Box::new(DeepMerge)),
            loading: RefCell::new(Vec::new()),
        }
    }
}
