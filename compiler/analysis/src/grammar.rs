//! Format grammars for file names and tokens that end up in generated
//! C and Makefile text.

use regex::Regex;

use crate::Result;

/// Compiled format grammars.
#[derive(Debug, Clone)]
pub struct Grammar {
    include: Regex,
    object: Regex,
}

impl Grammar {
    /// Compile the grammars.
    pub fn new() -> Result<Self> {
        Ok(Self {
            include: Regex::new(r"^[\w./-]+\.h$")?,
            object: Regex::new(r"^[\w./-]+\.o$")?,
        })
    }

    /// Header names usable in `#include "..."` and make prerequisites.
    pub fn is_include(&self, s: &str) -> bool { self.include.is_match(s) }

    /// Object file names usable in make rules.
    pub fn is_object(&self, s: &str) -> bool { self.object.is_match(s) }

    /// C identifiers, by the same rule event keys are parsed with.
    pub fn is_identifier(&self, s: &str) -> bool { ir::is_identifier(s) }
}
