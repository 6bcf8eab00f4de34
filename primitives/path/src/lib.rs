// SPDX-License-Identifier: CC0-1.0

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Path utilities for locating module headers.
//!
//! Headers named in a wiring document are looked up on an ordered list of
//! search directories; the first directory that contains the file wins and
//! the working directory is always tried last.

pub mod search_path;

// Re-export for convenience
pub use search_path::*;
