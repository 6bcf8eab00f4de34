// SPDX-License-Identifier: CC0-1.0

//! `<module>.<event>` keys used by the `messages` section.

use std::fmt;
use std::str::FromStr;

use crate::IrError;

/// Returns true when `s` is a C identifier (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A reference to one event declared by one module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    /// Module name, as listed in `sources`.
    pub module: String,
    /// Sender or receiver function name inside that module.
    pub event: String,
}

impl FromStr for EventKey {
    type Err = IrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((module, event)) if is_identifier(module) && is_identifier(event) =>
                Ok(EventKey { module: module.to_string(), event: event.to_string() }),
            _ => Err(IrError::InvalidEventKey(s.to_string())),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("_arg1"));
        assert!(is_identifier("ADIS"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("1abc"));
        assert!(!is_identifier("a-b"));
    }

    #[test]
    fn test_event_key() {
        let key: EventKey = "ADIS.adis_out".parse().expect("valid key");
        assert_eq!(key.module, "ADIS");
        assert_eq!(key.event, "adis_out");
        assert_eq!(key.to_string(), "ADIS.adis_out");

        for bad in ["ADIS", "ADIS.", ".out", "A.b.c", "A b.c"] {
            assert!(bad.parse::<EventKey>().is_err(), "`{}` should be rejected", bad);
        }
    }
}
