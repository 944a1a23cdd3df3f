//! Load orchestration: resolve a file's imports, then delegate to an importer.

use persist_core::{
    Document, FileGraph, Import, ImportDeclaration, ImportError, LoadError, PersistError,
    PersistResult, ResolvedImport,
};
use std::path::{Component, Path, PathBuf};

/// Resolves a declaration against the directory of `filename`.
///
/// The result is absolute and lexically normalized (`.` and `..` removed),
/// so the same declaration always yields the same path for a given
/// absolute `filename`.
pub fn resolve_import(filename: &Path, declaration: &ImportDeclaration) -> PathBuf {
    let dir = filename.parent().unwrap_or_else(|| Path::new(""));
    absolute(&dir.join(&declaration.path))
}

/// Makes `path` absolute against the working directory and normalizes it.
pub fn absolute(path: &Path) -> PathBuf {
    let joined;
    let path = if path.is_absolute() {
        path
    } else {
        joined = std::env::current_dir().unwrap_or_default().join(path);
        joined.as_path()
    };

    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Re-tags an import failure as a load failure of `filename`.
pub(crate) fn import_failure(filename: &Path, inner: ImportError) -> LoadError {
    let message = format!(
        "Unable to load `{}` as unable to perform import `{}`",
        filename.display(),
        inner.path.display()
    );
    LoadError::import_error(Some(inner.path.clone()), message).with_source(inner)
}

/// Resolves `imports` of `filename` and merges them under `content`.
///
/// Returns the merged document and a graph holding `filename -> [resolved
/// imports]` plus whatever the importer discovered. Import failures come
/// back as [`LoadErrorKind::ImportError`] with the import failure as
/// source; any other failure passes through unchanged.
///
/// # Panics
///
/// If a resolved import does not exist as its declared kind. Callers must
/// only pass declarations they have checked.
///
/// [`LoadErrorKind::ImportError`]: persist_core::LoadErrorKind::ImportError
pub fn do_load<I>(
    content: Document,
    imports: &[ImportDeclaration],
    filename: &Path,
    importer: &I,
) -> PersistResult<(Document, FileGraph)>
where
    I: Import + ?Sized,
{
    let mut graph = FileGraph::with_root(filename);

    let mut resolved = Vec::with_capacity(imports.len());
    for declaration in imports {
        let path = resolve_import(filename, declaration);
        assert!(
            declaration.kind.matches(&path),
            "`{}` declares {} import `{}` which does not exist as a {}",
            filename.display(),
            declaration.kind,
            path.display(),
            declaration.kind,
        );
        tracing::debug!(
            filename = %filename.display(),
            kind = %declaration.kind,
            path = %path.display(),
            "resolved import"
        );
        graph.add_import(filename, path.clone());
        resolved.push(ResolvedImport {
            kind: declaration.kind,
            path,
        });
    }

    if resolved.is_empty() {
        return Ok((content, graph));
    }

    let (content, nested) = importer
        .import(content, &resolved)
        .map_err(|e| match e {
            PersistError::Import(inner) => import_failure(filename, inner).into(),
            other => other,
        })?;

    for file in graph.union(nested) {
        tracing::warn!(
            filename = %filename.display(),
            path = %file.display(),
            "dependency graph entry overwritten"
        );
    }

    Ok((content, graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use persist_core::{ImportErrorKind, ImportKind, LoadErrorKind};
    use serde_json::json;
    use std::cell::RefCell;
    use std::fs;
    use std::io;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(map) => map,
            other => panic!("not a mapping: {other}"),
        }
    }

    type Reply = fn(Document, &[ResolvedImport]) -> PersistResult<(Document, FileGraph)>;

    /// Records what it was asked to import and replies with a canned result.
    struct RecordingImport {
        seen: RefCell<Vec<ResolvedImport>>,
        reply: Reply,
    }

    impl RecordingImport {
        fn new(reply: Reply) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                reply,
            }
        }
    }

    impl Import for RecordingImport {
        fn import(
            &self,
            content: Document,
            resources: &[ResolvedImport],
        ) -> PersistResult<(Document, FileGraph)> {
            self.seen.borrow_mut().extend_from_slice(resources);
            (self.reply)(content, resources)
        }
    }

    fn leaf_graphs(
        content: Document,
        resources: &[ResolvedImport],
    ) -> PersistResult<(Document, FileGraph)> {
        let mut graph = FileGraph::new();
        for r in resources {
            graph.union(FileGraph::with_root(&r.path));
        }
        Ok((content, graph))
    }

    #[test]
    fn no_imports_returns_content_unchanged() {
        let importer = RecordingImport::new(|_, _| panic!("importer must not run"));
        let content = doc(json!({"a": 1}));
        let (out, graph) =
            do_load(content.clone(), &[], Path::new("/etc/app/main.json"), &importer).unwrap();

        assert_eq!(out, content);
        assert_eq!(graph, FileGraph::with_root("/etc/app/main.json"));
        assert!(importer.seen.borrow().is_empty());
    }

    #[test]
    fn imports_resolve_against_declaring_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("conf")).unwrap();
        fs::write(dir.path().join("base.json"), "{}").unwrap();
        fs::write(dir.path().join("conf/db.json"), "{}").unwrap();
        let main = dir.path().join("conf/main.json");

        let imports = vec![
            ImportDeclaration::file("../base.json"),
            ImportDeclaration::file("./db.json"),
        ];
        let importer = RecordingImport::new(leaf_graphs);
        let (_, graph) = do_load(Document::new(), &imports, &main, &importer).unwrap();

        let base = absolute(&dir.path().join("base.json"));
        let db = absolute(&dir.path().join("conf/db.json"));
        assert_eq!(graph.imports_of(&main), Some(&[base.clone(), db.clone()][..]));
        assert!(graph.contains(&base));
        assert!(graph.contains(&db));
        assert_eq!(graph.len(), 3);

        let seen = importer.seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].path, base);
        assert_eq!(seen[0].kind, ImportKind::File);
        assert_eq!(seen[1].path, db);
    }

    #[test]
    fn resolution_is_idempotent() {
        let declaration = ImportDeclaration::file("../shared/./base.toml");
        let filename = Path::new("/srv/app/conf/main.toml");
        let first = resolve_import(filename, &declaration);
        let second = resolve_import(filename, &declaration);
        assert_eq!(first, second);
        assert_eq!(first, PathBuf::from("/srv/app/shared/base.toml"));
    }

    #[test]
    fn absolute_declarations_are_kept() {
        let declaration = ImportDeclaration::file("/opt/defaults.json");
        let resolved = resolve_import(Path::new("/srv/app/main.json"), &declaration);
        assert_eq!(resolved, PathBuf::from("/opt/defaults.json"));
    }

    #[test]
    fn import_failure_becomes_load_import_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gone.json"), "{}").unwrap();
        let main = dir.path().join("main.json");

        let importer = RecordingImport::new(|_, resources| {
            let not_found = io::Error::new(io::ErrorKind::NotFound, "removed");
            Err(ImportError::not_exists(resources[0].path.clone())
                .with_source(not_found)
                .into())
        });
        let err = do_load(
            Document::new(),
            &[ImportDeclaration::file("gone.json")],
            &main,
            &importer,
        )
        .unwrap_err();

        let gone = absolute(&dir.path().join("gone.json"));
        let PersistError::Load(load) = &err else {
            panic!("expected load error, got {err:?}");
        };
        assert_eq!(load.kind, LoadErrorKind::ImportError);
        assert_eq!(load.path.as_deref(), Some(gone.as_path()));
        assert!(load.message.contains(&main.display().to_string()));
        assert!(load.message.contains(&gone.display().to_string()));

        let cause = load.import_cause().expect("import cause");
        assert_eq!(cause.kind, ImportErrorKind::NotExists);
        assert_eq!(cause.path, gone);
    }

    #[test]
    fn load_errors_from_nested_files_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();

        let importer = RecordingImport::new(|_, resources| {
            Err(LoadError::parse_error(Some(resources[0].path.clone()), "bad json").into())
        });
        let err = do_load(
            Document::new(),
            &[ImportDeclaration::file("bad.json")],
            &dir.path().join("main.json"),
            &importer,
        )
        .unwrap_err();

        assert!(matches!(err, PersistError::Load(ref e) if e.kind == LoadErrorKind::ParseError));
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn missing_declared_file_is_a_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        let importer = RecordingImport::new(leaf_graphs);
        let _ = do_load(
            Document::new(),
            &[ImportDeclaration::file("missing.json")],
            &dir.path().join("main.json"),
            &importer,
        );
    }

    #[test]
    #[should_panic(expected = "does not exist")]
    fn kind_mismatch_is_a_contract_violation() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("plain.json"), "{}").unwrap();
        let importer = RecordingImport::new(leaf_graphs);
        let _ = do_load(
            Document::new(),
            &[ImportDeclaration::directory("plain.json")],
            &dir.path().join("main.json"),
            &importer,
        );
    }
}
