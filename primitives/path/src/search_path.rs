// SPDX-License-Identifier: CC0-1.0

//! Ordered header search path.

use std::path::Path;

use thiserror::Error;

/// Errors raised while resolving a header.
#[derive(Debug, Error)]
pub enum PathError {
    /// No search directory contains the file.
    #[error("Could not find header file: {file} (searched: {})", searched.join(", "))]
    NotFound {
        /// File name as written in the document.
        file: String,
        /// Directories that were tried, in order.
        searched: Vec<String>,
    },
}

/// A header located on the search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    /// Search directory that matched (`""` for the working directory).
    pub dir: String,
    /// `dir` joined with the file name.
    pub full_path: String,
}

/// Ordered list of search directories.
///
/// The empty string stands for the current working directory and is always
/// the last entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<String>,
}

impl SearchPath {
    /// Build a search path from configured directories, appending the
    /// working directory fallback.
    pub fn new<I, S>(dirs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut dirs: Vec<String> = dirs.into_iter().map(Into::into).collect();
        dirs.retain(|d| !d.is_empty());
        dirs.push(String::new());
        Self { dirs }
    }

    /// Directories in lookup order.
    pub fn dirs(&self) -> &[String] { &self.dirs }

    /// Find the first directory containing `file`.
    pub fn resolve(&self, file: &str) -> Result<ResolvedHeader, PathError> {
        for dir in &self.dirs {
            let full_path = join(dir, file);
            if Path::new(&full_path).is_file() {
                tracing::debug!("resolved {} to {}", file, full_path);
                return Ok(ResolvedHeader { dir: dir.clone(), full_path });
            }
        }
        Err(PathError::NotFound {
            file: file.to_string(),
            searched: self
                .dirs
                .iter()
                .map(|d| if d.is_empty() { ".".to_string() } else { d.clone() })
                .collect(),
        })
    }
}

/// Join a search directory and a file name the way lookups do: an empty
/// directory leaves the file name untouched.
pub fn join(dir: &str, file: &str) -> String {
    if dir.is_empty() {
        file.to_string()
    } else {
        Path::new(dir).join(file).to_string_lossy().into_owned()
    }
}
