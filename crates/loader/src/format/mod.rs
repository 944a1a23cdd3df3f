//! Serialization formats and import-declaration extraction.
//!
//! Every format decodes into a [`serde_json::Value`]. Imports are declared
//! under the reserved top-level [`IMPORT_KEY`]:
//!
//! ```json
//! { "@import": ["base.json", { "file": "db.toml" }], "debug": true }
//! ```

pub mod json;
pub mod toml;

pub use self::json::JsonFormat;
pub use self::toml::TomlFormat;

use persist_core::error::BoxError;
use persist_core::types::value_kind;
use persist_core::{ImportDeclaration, ImportKind, LoadError};
use serde_json::Value;
use std::path::Path;

/// Reserved top-level key holding a document's import declarations.
pub const IMPORT_KEY: &str = "@import";

/// A decoded document with its import declarations split off.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    pub content: Value,
    pub imports: Vec<ImportDeclaration>,
}

/// One on-disk representation of a document.
pub trait Format {
    fn name(&self) -> &'static str;

    /// Lower-case file extensions handled by this format, without the dot.
    fn extensions(&self) -> &'static [&'static str];

    fn decode(&self, text: &str) -> Result<Value, BoxError>;

    fn encode(&self, data: &Value) -> Result<String, BoxError>;

    fn supports(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Decodes `text` read from `path` and extracts its imports.
    fn parse(&self, path: &Path, text: &str) -> Result<Parsed, LoadError> {
        let content = self.decode(text).map_err(|e| {
            LoadError::parse_error(
                Some(path.to_path_buf()),
                format!("Unable to parse `{}` as {}: {e}", path.display(), self.name()),
            )
            .with_source(e)
        })?;
        split_imports(path, content)
    }
}

/// Removes [`IMPORT_KEY`] from a mapping document and parses its entries.
///
/// Non-mapping documents carry no imports and are returned untouched.
pub fn split_imports(path: &Path, mut content: Value) -> Result<Parsed, LoadError> {
    let raw = match &mut content {
        Value::Object(map) => map.remove(IMPORT_KEY),
        _ => None,
    };

    let imports = match raw {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| declaration(path, item))
            .collect::<Result<_, _>>()?,
        Some(other) => {
            return Err(invalid(
                path,
                format!("`{IMPORT_KEY}` must be an array, `{}` got", value_kind(&other)),
            ))
        }
    };

    Ok(Parsed { content, imports })
}

fn declaration(path: &Path, item: Value) -> Result<ImportDeclaration, LoadError> {
    match item {
        Value::String(target) => Ok(ImportDeclaration::file(target)),
        Value::Object(map) if map.len() == 1 => match map.into_iter().next() {
            Some((kind, Value::String(target))) => {
                let kind: ImportKind = kind.parse().map_err(|e: String| invalid(path, e))?;
                Ok(ImportDeclaration {
                    kind,
                    path: target.into(),
                })
            }
            Some((kind, other)) => Err(invalid(
                path,
                format!("`{kind}` import target must be a string, `{}` got", value_kind(&other)),
            )),
            None => Err(invalid(path, "empty import declaration".to_string())),
        },
        other => Err(invalid(
            path,
            format!(
                "import declaration must be a string or a single-entry mapping, `{}` got",
                value_kind(&other)
            ),
        )),
    }
}

fn invalid(path: &Path, detail: String) -> LoadError {
    LoadError::parse_error(
        Some(path.to_path_buf()),
        format!("Invalid imports in `{}`: {detail}", path.display()),
    )
}
