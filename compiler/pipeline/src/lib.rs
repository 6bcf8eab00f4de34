#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Staged wiring compiler.
//!
//! A [`Driver`] runs a fixed sequence of [`Stage`]s over one shared
//! [`ir::DocumentTree`]:
//!
//! - `expansion` - resolve `sources` headers into the module table
//! - `validation` - cross-check messages against the module table
//! - `generation` - run the selected backends over the validated tree
//! - `driver` - sequencing, diagnostics, unhandled-content detection
//! - `orchestration` - loading documents and writing artifacts
//!
//! Each stage reports structural defects as diagnostics; the driver halts
//! before the next stage whenever one of them is an error.

use thiserror::Error;

pub mod driver;
pub mod expansion;
pub mod generation;
pub mod orchestration;
pub mod stage;
pub mod validation;

pub use driver::{Driver, RunReport, Terminal};
pub use expansion::{assign_names, ExpansionStage};
pub use generation::GenerationStage;
pub use orchestration::{compile, compile_with, extractor_for, load_document, write_artifacts};
pub use stage::{Stage, StageOutcome};
pub use validation::ValidationStage;

/// Convenient result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that stop a run before any stage can report diagnostics.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The wiring document could not be loaded.
    #[error(transparent)]
    Document(#[from] ir::IrError),
    /// Analysis could not be set up.
    #[error(transparent)]
    Analysis(#[from] analysis::AnalysisError),
    /// The header extractor could not be set up.
    #[error(transparent)]
    Extract(#[from] cheader::ExtractError),
    /// A backend failed on a tree that passed validation.
    #[error(transparent)]
    Backend(#[from] codegen_backend::BackendError),
    /// I/O error while writing artifacts.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
