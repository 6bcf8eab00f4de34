#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Annotated C header extraction.
//!
//! Recovers the signatures of function declarations that carry one of the
//! four wiring annotations (`MIML_INIT`, `MIML_FINAL`, `MIML_SENDER`,
//! `MIML_RECEIVER`, or their expanded `__attribute__((miml(kind)))` form).
//!
//! Headers are either scanned directly or, when configured, run through the
//! system C preprocessor first. Either way every extracted [`Signature`]
//! records the file and line it came from.

use std::fmt;

use thiserror::Error;

mod conditional;
mod cpp;
mod extractor;
mod lexer;
mod parser;

pub use cpp::Preprocessor;
pub use extractor::{Extractor, Signatures};

/// Errors raised while reading or parsing a header
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The header could not be read
    #[error("{file}: {source}")]
    Io {
        /// Header path
        file: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The external preprocessor could not be found or failed
    #[error("{file}: preprocessor failed: {message}")]
    Preprocessor {
        /// Header path
        file: String,
        /// Preprocessor stderr or lookup failure
        message: String,
    },

    /// The header is not lexically or structurally well formed
    #[error("{file}:{line}: syntax error: {message}")]
    Syntax {
        /// File the error was found in
        file: String,
        /// 1-based line
        line: u32,
        /// What went wrong
        message: String,
    },

    /// An annotated function does not return `void`
    #[error("{file}:{line}: {kind} function {function} must return void, found '{found}'")]
    ReturnType {
        /// File declaring the function
        file: String,
        /// 1-based line
        line: u32,
        /// Annotation on the function
        kind: AnnotationKind,
        /// Function name
        function: String,
        /// Declared return type
        found: String,
    },

    /// A final hook declares parameters
    #[error("{file}: final function {function} must take no arguments")]
    FinalArguments {
        /// File declaring the function
        file: String,
        /// Function name
        function: String,
    },

    /// An annotation could not be understood
    #[error("{file}:{line}: malformed annotation: {message}")]
    MalformedAnnotation {
        /// File containing the annotation
        file: String,
        /// 1-based line
        line: u32,
        /// What went wrong
        message: String,
    },

    /// An annotated declarator uses C the extractor does not model
    #[error("{file}:{line}: unsupported declarator in {function}: {message}")]
    UnsupportedDeclarator {
        /// File declaring the function
        file: String,
        /// 1-based line
        line: u32,
        /// Function name, or `?` when it could not be determined
        function: String,
        /// What is not supported
        message: String,
    },
}

/// Result type for header extraction
pub type Result<T> = std::result::Result<T, ExtractError>;

/// Role an annotation assigns to a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationKind {
    /// Called once at startup.
    Init,
    /// Called once at exit.
    Final,
    /// An event the module emits.
    Sender,
    /// An event the module accepts.
    Receiver,
}

impl AnnotationKind {
    /// All kinds, in the order their definitions are passed to `cpp`.
    pub const ALL: [AnnotationKind; 4] =
        [AnnotationKind::Init, AnnotationKind::Final, AnnotationKind::Sender, AnnotationKind::Receiver];

    /// The argument of the `miml(...)` attribute.
    pub const fn name(self) -> &'static str {
        match self {
            AnnotationKind::Init => "init",
            AnnotationKind::Final => "final",
            AnnotationKind::Sender => "sender",
            AnnotationKind::Receiver => "receiver",
        }
    }

    /// Parse the argument of a `miml(...)` attribute.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The macro a header writes, e.g. `MIML_SENDER`.
    pub fn macro_name(self) -> String { format!("MIML_{}", self.name().to_uppercase()) }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// One extracted parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedParam {
    /// Rendered type, e.g. `const char *`.
    pub ctype: String,
    /// Declared name, absent for abstract declarators.
    pub name: Option<String>,
}

/// One annotated function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Function name.
    pub name: String,
    /// Declared return type, storage specifiers removed.
    pub return_type: String,
    /// Parameters in declaration order; empty for `(void)`.
    pub params: Vec<ExtractedParam>,
    /// Which annotation the declaration carries.
    pub kind: AnnotationKind,
    /// File the declaration was found in.
    pub file: String,
    /// 1-based line of the declaration's first token.
    pub line: u32,
}

/// Location of a header, used in error messages.
pub(crate) fn display_path(path: &std::path::Path) -> String { path.display().to_string() }
