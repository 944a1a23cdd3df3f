//! Data model: documents, import declarations and the file dependency graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A string-keyed document -- the payload being assembled.
pub type Document = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Imports
// ---------------------------------------------------------------------------

/// What an import declaration points at.
///
/// `Directory` is recognised but cannot be imported yet; attempting it is a
/// defect, not a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportKind {
    File,
    Directory,
}

impl ImportKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Directory => "directory",
        }
    }

    /// Whether `path` exists as this kind of filesystem entry.
    pub fn matches(self, path: &Path) -> bool {
        match self {
            Self::File => path.is_file(),
            Self::Directory => path.is_dir(),
        }
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "directory" => Ok(Self::Directory),
            other => Err(format!("unknown import kind `{other}`")),
        }
    }
}

/// An import as written in a file: relative to the declaring file's directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImportDeclaration {
    pub kind: ImportKind,
    pub path: PathBuf,
}

impl ImportDeclaration {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ImportKind::File,
            path: path.into(),
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            kind: ImportKind::Directory,
            path: path.into(),
        }
    }
}

/// An import whose path is absolute and known to match its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedImport {
    pub kind: ImportKind,
    pub path: PathBuf,
}

/// Output of the load contract: parsed content plus the graph the resource
/// discovered while loading its own imports.
///
/// `content` is not guaranteed to be a mapping; the importer rejects
/// anything else before merging.
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub content: Value,
    pub graph: FileGraph,
}

impl Loaded {
    pub fn new(content: Value, graph: FileGraph) -> Self {
        Self { content, graph }
    }
}

/// Human-readable type name of a JSON value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "mapping",
    }
}

// ---------------------------------------------------------------------------
// Dependency graph
// ---------------------------------------------------------------------------

/// Absolute file path -> ordered files it directly imports.
///
/// Serialized as a plain mapping so it can be cached by callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileGraph {
    edges: BTreeMap<PathBuf, Vec<PathBuf>>,
}

impl FileGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// A graph holding only `path -> []`.
    pub fn with_root(path: impl Into<PathBuf>) -> Self {
        let mut graph = Self::new();
        graph.edges.insert(path.into(), Vec::new());
        graph
    }

    pub fn add_import(&mut self, from: impl Into<PathBuf>, to: impl Into<PathBuf>) {
        self.edges.entry(from.into()).or_default().push(to.into());
    }

    /// Plain union, last writer wins. Returns the keys that were overwritten.
    pub fn union(&mut self, other: FileGraph) -> Vec<PathBuf> {
        let mut collisions = Vec::new();
        for (file, imports) in other.edges {
            if self.edges.contains_key(&file) {
                collisions.push(file.clone());
            }
            self.edges.insert(file, imports);
        }
        collisions
    }

    pub fn imports_of(&self, path: &Path) -> Option<&[PathBuf]> {
        self.edges.get(path).map(Vec::as_slice)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.edges.contains_key(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.edges.keys().map(PathBuf::as_path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[PathBuf])> {
        self.edges.iter().map(|(k, v)| (k.as_path(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Every file whose content depends on `changed`, directly or through
    /// other imports. Includes `changed` itself when it is a key.
    pub fn affected_by(&self, changed: &Path) -> BTreeSet<PathBuf> {
        // Reverse edges: imported -> importers.
        let mut importers: BTreeMap<&Path, Vec<&Path>> = BTreeMap::new();
        for (file, imports) in &self.edges {
            for imported in imports {
                importers.entry(imported.as_path()).or_default().push(file);
            }
        }

        let mut affected = BTreeSet::new();
        if self.contains(changed) {
            affected.insert(changed.to_path_buf());
        }
        let mut stack = vec![changed];
        while let Some(current) = stack.pop() {
            for &importer in importers.get(current).into_iter().flatten() {
                if affected.insert(importer.to_path_buf()) {
                    stack.push(importer);
                }
            }
        }
        affected
    }
}

impl From<BTreeMap<PathBuf, Vec<PathBuf>>> for FileGraph {
    fn from(edges: BTreeMap<PathBuf, Vec<PathBuf>>) -> Self {
        Self { edges }
    }
}
