//! Core types, configuration, and error handling for deltacov.
//!
//! This crate provides the shared foundation used by all other deltacov crates:
//! - [`DeltacovError`]: unified error type using `thiserror`
//! - [`DeltacovConfig`]: configuration loaded from `.deltacov.toml`
//! - The change-set data model: [`RevisionRef`], [`FileDiffEntry`],
//!   [`MethodInfo`], [`ClassInfo`], [`ChangeSet`], [`Diagnostic`]

mod config;
mod error;
mod types;

pub use config::{DeltacovConfig, DiffConfig, ExcludeConfig, RepositoryConfig};
pub use error::DeltacovError;
pub use types::{
    ChangeKind, ChangeSet, ClassChange, ClassInfo, Diagnostic, DiagnosticKind, FileDiffEntry,
    LineEdit, LineRange, MethodChange, MethodInfo, OutputFormat, RevisionKind, RevisionRef,
};

/// A convenience `Result` type for deltacov operations.
pub type Result<T> = std::result::Result<T, DeltacovError>;
