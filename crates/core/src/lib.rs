//! Contracts, data model, and error taxonomy for layered configuration loading.
//!
//! Foundation crate -- no filesystem access. Parsers, merge strategies and
//! the import orchestration live in `persist-loader`.

pub mod contract;
pub mod error;
pub mod types;

pub use contract::{Dump, Import, Load, Merge};
pub use error::{
    DumpError, ImportError, ImportErrorKind, LoadError, LoadErrorKind, PersistError,
    PersistResult,
};
pub use types::{Document, FileGraph, ImportDeclaration, ImportKind, Loaded, ResolvedImport};
