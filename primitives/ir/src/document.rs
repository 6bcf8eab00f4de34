// SPDX-License-Identifier: CC0-1.0

//! The document tree threaded through the compiler stages.
//!
//! A wiring document is a YAML mapping. Its top-level keys are decoded into
//! a closed set of [`Section`] variants; anything the compiler does not know
//! about is kept verbatim as [`Section::Unrecognized`] so the driver can
//! report it instead of silently ignoring it.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{IrError, ModuleTable, Result};

/// One `[moduleName, headerPath]` entry of the `sources` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct SourceEntry {
    /// Module name used by `messages` keys.
    pub module: String,
    /// Header file, looked up on the search path.
    pub header: String,
}

impl SourceEntry {
    /// Create a source entry.
    pub fn new(module: impl Into<String>, header: impl Into<String>) -> Self {
        Self { module: module.into(), header: header.into() }
    }
}

impl From<(String, String)> for SourceEntry {
    fn from((module, header): (String, String)) -> Self { Self { module, header } }
}

impl From<SourceEntry> for (String, String) {
    fn from(s: SourceEntry) -> Self { (s.module, s.header) }
}

/// File names of the generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputNames {
    /// Generated C source.
    pub code: String,
    /// Generated companion header.
    pub header: String,
    /// Generated build fragment.
    pub make: String,
    /// Generated Graphviz wiring graph.
    pub dot: String,
}

impl Default for OutputNames {
    fn default() -> Self {
        Self {
            code: "main.c".to_string(),
            header: "main.h".to_string(),
            make: "Makefile.miml".to_string(),
            dot: "wiring.dot".to_string(),
        }
    }
}

/// Names of the sections the compiler understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    /// `sources`: ordered `[module, header]` pairs.
    Sources,
    /// `messages`: sender key to receiver keys.
    Messages,
    /// `include`: header search path.
    Include,
    /// `framework`: framework root used by the regeneration rule.
    Framework,
    /// `filenames`: output artifact names.
    Filenames,
    /// `mainmiml`: path of the wiring document itself.
    MainMiml,
    /// `modules`: the module table produced by expansion.
    Modules,
}

impl SectionKind {
    /// Sections a user may write in a wiring document.
    pub const DOCUMENT: [SectionKind; 5] = [
        SectionKind::Sources,
        SectionKind::Messages,
        SectionKind::Include,
        SectionKind::Framework,
        SectionKind::Filenames,
    ];

    /// Top-level key of the section.
    pub const fn name(self) -> &'static str {
        match self {
            SectionKind::Sources => "sources",
            SectionKind::Messages => "messages",
            SectionKind::Include => "include",
            SectionKind::Framework => "framework",
            SectionKind::Filenames => "filenames",
            SectionKind::MainMiml => "mainmiml",
            SectionKind::Modules => "modules",
        }
    }

    /// Resolve a top-level key written in a document.
    pub fn from_document_key(key: &str) -> Option<Self> {
        Self::DOCUMENT.into_iter().find(|kind| kind.name() == key)
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// A decoded top-level section.
#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    /// Module sources, in declaration order.
    Sources(Vec<SourceEntry>),
    /// Wiring entries, sender key to receiver keys, in document order.
    Messages(IndexMap<String, Vec<String>>),
    /// Header search directories.
    Include(Vec<String>),
    /// Framework root.
    Framework(String),
    /// Output artifact names.
    Filenames(OutputNames),
    /// Path of the wiring document.
    MainMiml(String),
    /// Expanded module table.
    Modules(ModuleTable),
    /// A key no stage knows how to handle.
    Unrecognized(serde_yaml::Value),
}

impl Section {
    /// The section kind, or `None` for unrecognized content.
    pub fn kind(&self) -> Option<SectionKind> {
        match self {
            Section::Sources(_) => Some(SectionKind::Sources),
            Section::Messages(_) => Some(SectionKind::Messages),
            Section::Include(_) => Some(SectionKind::Include),
            Section::Framework(_) => Some(SectionKind::Framework),
            Section::Filenames(_) => Some(SectionKind::Filenames),
            Section::MainMiml(_) => Some(SectionKind::MainMiml),
            Section::Modules(_) => Some(SectionKind::Modules),
            Section::Unrecognized(_) => None,
        }
    }

    fn decode(kind: SectionKind, value: serde_yaml::Value) -> Result<Self> {
        Ok(match kind {
            SectionKind::Sources => Section::Sources(decode_value(kind, value)?),
            SectionKind::Messages => Section::Messages(decode_value(kind, value)?),
            SectionKind::Include => Section::Include(decode_value(kind, value)?),
            SectionKind::Framework => Section::Framework(decode_value(kind, value)?),
            SectionKind::Filenames => Section::Filenames(decode_value(kind, value)?),
            SectionKind::MainMiml => Section::MainMiml(decode_value(kind, value)?),
            SectionKind::Modules => Section::Modules(decode_value(kind, value)?),
        })
    }
}

fn decode_value<T: DeserializeOwned>(kind: SectionKind, value: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(value)
        .map_err(|source| IrError::Section { section: kind.name().to_string(), source })
}

/// The shared working tree: top-level key to section, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentTree {
    sections: IndexMap<String, Section>,
}

impl DocumentTree {
    /// An empty tree.
    pub fn new() -> Self { Self::default() }

    /// Parse a wiring document.
    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let root: serde_yaml::Value = serde_yaml::from_str(s)?;
        let mapping = match root {
            serde_yaml::Value::Mapping(mapping) if !mapping.is_empty() => mapping,
            _ => return Err(IrError::NotAMapping),
        };

        let mut tree = DocumentTree::new();
        for (key, value) in mapping {
            let name = match key {
                serde_yaml::Value::String(name) => name,
                other => serde_yaml::to_string(&other)?.trim_end().to_string(),
            };
            let section = match SectionKind::from_document_key(&name) {
                Some(kind) => Section::decode(kind, value)?,
                None => Section::Unrecognized(value),
            };
            tree.sections.insert(name, section);
        }
        Ok(tree)
    }

    /// Read and parse a wiring document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&contents)
    }

    /// Insert or replace a known section under its canonical key.
    pub fn insert(&mut self, section: Section) {
        if let Some(kind) = section.kind() {
            self.sections.insert(kind.name().to_string(), section);
        }
    }

    /// Insert a known section only if the document did not already set it.
    pub fn insert_default(&mut self, section: Section) {
        if let Some(kind) = section.kind() {
            self.sections.entry(kind.name().to_string()).or_insert(section);
        }
    }

    /// Look up a section by kind.
    pub fn get(&self, kind: SectionKind) -> Option<&Section> { self.sections.get(kind.name()) }

    /// Top-level keys, in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> { self.sections.keys().map(String::as_str) }

    /// `(key, section)` pairs, in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// The `sources` section, or an empty slice.
    pub fn sources(&self) -> &[SourceEntry] {
        match self.get(SectionKind::Sources) {
            Some(Section::Sources(sources)) => sources,
            _ => &[],
        }
    }

    /// The `messages` section, if present.
    pub fn messages(&self) -> Option<&IndexMap<String, Vec<String>>> {
        match self.get(SectionKind::Messages) {
            Some(Section::Messages(messages)) => Some(messages),
            _ => None,
        }
    }

    /// The `include` section, or an empty slice.
    pub fn include(&self) -> &[String] {
        match self.get(SectionKind::Include) {
            Some(Section::Include(dirs)) => dirs,
            _ => &[],
        }
    }

    /// The `framework` section, if present.
    pub fn framework(&self) -> Option<&str> {
        match self.get(SectionKind::Framework) {
            Some(Section::Framework(root)) => Some(root),
            _ => None,
        }
    }

    /// The `filenames` section, if present.
    pub fn filenames(&self) -> Option<&OutputNames> {
        match self.get(SectionKind::Filenames) {
            Some(Section::Filenames(names)) => Some(names),
            _ => None,
        }
    }

    /// The `mainmiml` section, if present.
    pub fn main_miml(&self) -> Option<&str> {
        match self.get(SectionKind::MainMiml) {
            Some(Section::MainMiml(path)) => Some(path),
            _ => None,
        }
    }

    /// The `modules` section, if expansion has run.
    pub fn modules(&self) -> Option<&ModuleTable> {
        match self.get(SectionKind::Modules) {
            Some(Section::Modules(table)) => Some(table),
            _ => None,
        }
    }
}
