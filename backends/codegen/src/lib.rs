#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! MIML Codegen Backends
//!
//! Backends turn a validated [`WiringGraph`] into text for one artifact
//! each: the generated C source, its companion header, the Makefile
//! fragment, and a Graphviz view of the wiring. Every backend writes into a
//! [`LayeredOutput`] so independent sections land in a fixed order.

use ir::OutputNames;
use thiserror::Error;

pub mod c_header;
pub mod c_source;
pub mod dot;
pub mod graph;
pub mod layered;
pub mod make;

pub use c_header::HeaderBackend;
pub use c_source::CodeBackend;
pub use dot::DotBackend;
pub use graph::{Dispatcher, WiringGraph};
pub use layered::{level, Artifact, LayeredOutput};
pub use make::MakeBackend;

/// Backend result containing generated text
#[derive(Debug)]
pub struct BackendResult {
    /// Generated sections
    pub output: LayeredOutput,
    /// Backend metadata
    pub metadata: BackendMetadata,
}

/// Backend metadata
#[derive(Debug)]
pub struct BackendMetadata {
    /// Backend name
    pub backend_name: String,
    /// Total lines generated
    pub total_lines: usize,
}

#[derive(Debug, Error)]
/// Errors raised by the codegen backends.
pub enum BackendError {
    /// A message key that validation should have rejected.
    #[error("message `{0}` does not resolve to a sender")]
    UnresolvedSender(String),
    /// A receiver key that validation should have rejected.
    #[error("message `{message}`: receiver `{receiver}` does not resolve")]
    UnresolvedReceiver {
        /// Sender key of the message
        message: String,
        /// Receiver key that failed
        receiver: String,
    },
}

/// Result alias for the backends.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Command-line settings the Makefile regeneration rule repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Regeneration {
    /// Configuration file passed with `-g`
    pub config_file: Option<String>,
    /// Output directory passed with `-o`
    pub output_dir: Option<String>,
}

/// Build settings shared by all backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Artifact file names
    pub names: OutputNames,
    /// Path of the wiring document
    pub main_miml: String,
    /// Framework root holding the `mimlc` binary
    pub framework: String,
    /// Whether the companion header is generated in this run
    pub emit_header: bool,
    /// Whether the wiring graph is generated in this run
    pub emit_dot: bool,
    /// Settings repeated by the regeneration rule
    pub regeneration: Regeneration,
}

impl BuildContext {
    /// Settings with default file names and framework root.
    pub fn new(main_miml: impl Into<String>) -> Self {
        Self {
            names: OutputNames::default(),
            main_miml: main_miml.into(),
            framework: ".".to_string(),
            emit_header: false,
            emit_dot: false,
            regeneration: Regeneration::default(),
        }
    }
}

/// Common trait for all backends
pub trait Backend {
    /// Generate sections from a validated wiring graph
    fn generate(&self, graph: &WiringGraph<'_>, ctx: &BuildContext) -> Result<BackendResult>;

    /// Get backend name
    fn name(&self) -> &str;

    /// Get backend description
    fn description(&self) -> &str;

    /// Wrap generated sections with metadata
    fn finish(&self, output: LayeredOutput) -> BackendResult {
        let total_lines = output.line_count();
        BackendResult {
            output,
            metadata: BackendMetadata { backend_name: self.name().to_string(), total_lines },
        }
    }
}
