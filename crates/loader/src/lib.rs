//! Import resolution, document merging, and file-backed loaders.
//!
//! [`do_load`] resolves a file's import declarations and hands them to an
//! [`Import`](persist_core::Import) implementation; [`DefaultImport`] loads
//! and merges each resource; [`FileLoader`] ties both to real files through
//! the registered [`Format`]s.

pub mod file;
pub mod format;
pub mod import;
pub mod load;
pub mod merge;

pub use file::{FileLoader, FileLoaderBuilder};
pub use format::{Format, JsonFormat, Parsed, TomlFormat, IMPORT_KEY};
pub use import::DefaultImport;
pub use load::{do_load, resolve_import};
pub use merge::DeepMerge;
