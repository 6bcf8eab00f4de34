// SPDX-License-Identifier: CC0-1.0

//! Restricted C type grammar.
//!
//! Parameter types crossing a wiring edge must be spelled as
//! `[const] [unsigned|signed] <identifier> [*]`. Anything richer (function
//! pointers, multi-word bases such as `long long`, tagged `struct` names)
//! is rejected so that the generated dispatchers can forward arguments
//! without understanding the type.

use std::fmt;
use std::str::FromStr;

use crate::{is_identifier, IrError};

/// Sign qualifier on an integer base type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    /// `signed`
    Signed,
    /// `unsigned`
    Unsigned,
}

/// A parsed declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CType {
    is_const: bool,
    sign: Option<Signedness>,
    base: String,
    pointer: bool,
}

impl CType {
    /// The base identifier with qualifiers and pointer marker stripped.
    pub fn base(&self) -> &str { &self.base }

    /// Whether the declared type carried a pointer (or array) marker.
    pub fn is_pointer(&self) -> bool { self.pointer }

    /// Whether the declared type was `const` qualified.
    pub fn is_const(&self) -> bool { self.is_const }

    /// Sign qualifier, if one was written.
    pub fn sign(&self) -> Option<Signedness> { self.sign }

    /// Two types are compatible across a wiring edge when their base
    /// identifiers agree.
    pub fn compatible_with(&self, other: &CType) -> bool { self.base == other.base }
}

impl FromStr for CType {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spaced = s.replace('*', " * ");
        let mut tokens = spaced.split_whitespace().peekable();
        let invalid = || IrError::InvalidType(s.to_string());

        let is_const = tokens.next_if_eq(&"const").is_some();
        let sign = match tokens.peek().copied() {
            Some("unsigned") => {
                tokens.next();
                Some(Signedness::Unsigned)
            }
            Some("signed") => {
                tokens.next();
                Some(Signedness::Signed)
            }
            _ => None,
        };

        let base = tokens.next().ok_or_else(invalid)?;
        if !is_identifier(base) || matches!(base, "const" | "unsigned" | "signed") {
            return Err(invalid());
        }
        let pointer = tokens.next_if_eq(&"*").is_some();
        if tokens.next().is_some() {
            return Err(invalid());
        }

        Ok(CType { is_const, sign, base: base.to_string(), pointer })
    }
}

impl fmt::Display for CType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_const {
            f.write_str("const ")?;
        }
        match self.sign {
            Some(Signedness::Unsigned) => f.write_str("unsigned ")?,
            Some(Signedness::Signed) => f.write_str("signed ")?,
            None => {}
        }
        f.write_str(&self.base)?;
        if self.pointer {
            f.write_str(" *")?;
        }
        Ok(())
    }
}
