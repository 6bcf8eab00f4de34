#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! MIML Compiler Analysis
//!
//! This crate provides the checks that run between expansion and
//! generation, and the diagnostics collector every stage reports into.
//! Structural defects never abort a check early: they are accumulated so
//! one pass reports the complete set.

use std::fmt;

use thiserror::Error;

pub mod grammar;
pub mod validator;

pub use grammar::Grammar;
pub use validator::WiringValidator;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Reported, does not halt the pipeline
    Warning,
    /// Halts the pipeline after the current stage
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// One reported defect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// How serious it is
    pub severity: Severity,
    /// Stage that reported it
    pub stage: String,
    /// Human readable description
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.stage, self.severity, self.message)
    }
}

/// Diagnostics collected during a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// An empty collector
    pub fn new() -> Self { Self::default() }

    /// Record an error
    pub fn error(&mut self, stage: &str, message: impl Into<String>) {
        self.push(Severity::Error, stage, message.into());
    }

    /// Record a warning
    pub fn warning(&mut self, stage: &str, message: impl Into<String>) {
        self.push(Severity::Warning, stage, message.into());
    }

    fn push(&mut self, severity: Severity, stage: &str, message: String) {
        self.items.push(Diagnostic { severity, stage: stage.to_string(), message });
    }

    /// Number of errors
    pub fn error_count(&self) -> usize { self.count(Severity::Error) }

    /// Number of warnings
    pub fn warning_count(&self) -> usize { self.count(Severity::Warning) }

    fn count(&self, severity: Severity) -> usize {
        self.items.iter().filter(|d| d.severity == severity).count()
    }

    /// Whether any error was recorded
    pub fn has_errors(&self) -> bool { self.error_count() > 0 }

    /// Append another report
    pub fn merge(&mut self, other: Diagnostics) { self.items.extend(other.items); }

    /// Diagnostics in the order they were reported
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> { self.items.iter() }

    /// Error messages only
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter(|d| d.severity == Severity::Error).map(|d| d.message.as_str())
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize { self.items.len() }

    /// Whether nothing was reported
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter { self.items.into_iter() }
}

#[derive(Debug, Error)]
/// Errors raised while setting up analysis.
pub enum AnalysisError {
    /// A format grammar failed to compile.
    #[error("invalid grammar: {0}")]
    Grammar(#[from] regex::Error),
}

/// Result alias for analysis setup.
pub type Result<T> = std::result::Result<T, AnalysisError>;
