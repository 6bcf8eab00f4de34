#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
//! Collection of utilities for the `mimlc` command line driver.

use codegen_backend::Artifact;
use thiserror::Error;

/// Errors that stop `mimlc` before or after the pipeline runs.
#[derive(Debug, Error)]
pub enum CompilerError {
    /// The tool configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    /// The pipeline could not run.
    #[error(transparent)]
    Pipeline(#[from] pipeline::PipelineError),
    /// The module table could not be serialized.
    #[error(transparent)]
    Document(#[from] ir::IrError),
    /// I/O error while preparing the output directory.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for `mimlc` operations.
pub type Result<T> = std::result::Result<T, CompilerError>;

/// Artifact selection flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    /// Generated C source
    pub code: bool,
    /// Companion header
    pub header: bool,
    /// Makefile fragment
    pub make: bool,
    /// Graphviz wiring graph
    pub dot: bool,
}

impl Selection {
    /// Artifacts to generate. With no flag set, code and make.
    pub fn artifacts(self) -> Vec<Artifact> {
        if self == Self::default() {
            return vec![Artifact::Code, Artifact::Make];
        }
        [
            (self.code, Artifact::Code),
            (self.header, Artifact::Header),
            (self.make, Artifact::Make),
            (self.dot, Artifact::Dot),
        ]
        .into_iter()
        .filter_map(|(on, artifact)| on.then_some(artifact))
        .collect()
    }
}
