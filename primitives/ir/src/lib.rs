// SPDX-License-Identifier: CC0-1.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! MIML Intermediate Representation
//!
//! This crate defines the data shared by every compiler stage:
//!
//! - [`DocumentTree`]: the working tree threaded through the pipeline, a
//!   closed set of [`Section`]s keyed by their top-level name
//! - [`ModuleTable`] / [`Module`]: what expansion recovers from C headers
//! - [`Parameter`], [`CType`], [`EventKey`]: the small grammars the
//!   validator checks and the backends render

use thiserror::Error;

pub mod ctype;
pub mod document;
pub mod event_key;
pub mod module;

pub use ctype::CType;
pub use document::{DocumentTree, OutputNames, Section, SectionKind, SourceEntry};
pub use event_key::{is_identifier, EventKey};
pub use module::{EventKind, Hook, Module, ModuleTable, Parameter};

/// Errors raised while building or decoding IR values.
#[derive(Debug, Error)]
pub enum IrError {
    /// Failed to read a document from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
    /// The document is not well-formed YAML.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// JSON serialization error.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    /// A known section holds a value of the wrong shape.
    #[error("Malformed `{section}` section: {source}")]
    Section {
        /// Section name as written in the document.
        section: String,
        /// Underlying decode error.
        source: serde_yaml::Error,
    },
    /// The document root is not a non-empty mapping.
    #[error("Document root must be a non-empty mapping")]
    NotAMapping,
    /// A declared type does not match the restricted C type grammar.
    #[error("Illegal type `{0}`")]
    InvalidType(String),
    /// A `<module>.<event>` key does not match its grammar.
    #[error("Illegal syntax `{0}`, expected <module>.<event>")]
    InvalidEventKey(String),
    /// A module name was inserted twice into a module table.
    #[error("Module `{0}` is defined more than once")]
    DuplicateModule(String),
}

/// Result alias for IR operations.
pub type Result<T> = std::result::Result<T, IrError>;
