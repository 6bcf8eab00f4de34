// SPDX-License-Identifier: CC0-1.0

//! Module records recovered from annotated C headers.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{IrError, Result};

/// One `(type, name)` pair of a sender or receiver signature.
///
/// Serialized as a two element sequence, `[type, name]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Parameter {
    /// Declared type as extracted from the header (e.g. `unsigned char *`).
    pub ctype: String,
    /// Source name, or a synthesized one when the header omitted it.
    pub name: String,
}

impl Parameter {
    /// Create a parameter from a type and a name.
    pub fn new(ctype: impl Into<String>, name: impl Into<String>) -> Self {
        Self { ctype: ctype.into(), name: name.into() }
    }
}

impl From<(String, String)> for Parameter {
    fn from((ctype, name): (String, String)) -> Self { Self { ctype, name } }
}

impl From<Parameter> for (String, String) {
    fn from(p: Parameter) -> Self { (p.ctype, p.name) }
}

/// An init or final hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hook {
    /// C function name.
    pub function: String,
    /// Init hooks declared as `(int argc, char *argv[])` receive the
    /// program arguments.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub forwards_args: bool,
}

impl Hook {
    /// A hook called without arguments.
    pub fn plain(function: impl Into<String>) -> Self {
        Self { function: function.into(), forwards_args: false }
    }
}

/// Which of a module's event maps an event lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Events the module emits.
    Sender,
    /// Events the module accepts.
    Receiver,
}

impl EventKind {
    /// Lower-case label used in diagnostics.
    pub fn label(self) -> &'static str {
        match self {
            EventKind::Sender => "sender",
            EventKind::Receiver => "receiver",
        }
    }
}

/// Everything the wiring compiler knows about one C module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Init hook, called in module declaration order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<Hook>,
    /// Final hook, called in reverse module declaration order.
    #[serde(rename = "final", default, skip_serializing_if = "Option::is_none")]
    pub final_hook: Option<Hook>,
    /// Build artifact for the module (`<name>.o`).
    pub object: String,
    /// Header name as written in the `sources` section.
    pub include: String,
    /// Header path as resolved on the search path.
    pub path: String,
    /// Sender events, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub senders: IndexMap<String, Vec<Parameter>>,
    /// Receiver events, in declaration order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub receivers: IndexMap<String, Vec<Parameter>>,
}

impl Module {
    /// An empty module for a resolved header.
    pub fn new(
        include: impl Into<String>,
        path: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            init: None,
            final_hook: None,
            object: object.into(),
            include: include.into(),
            path: path.into(),
            senders: IndexMap::new(),
            receivers: IndexMap::new(),
        }
    }

    /// The sender or receiver map.
    pub fn events(&self, kind: EventKind) -> &IndexMap<String, Vec<Parameter>> {
        match kind {
            EventKind::Sender => &self.senders,
            EventKind::Receiver => &self.receivers,
        }
    }

    /// Mutable access to the sender or receiver map.
    pub fn events_mut(&mut self, kind: EventKind) -> &mut IndexMap<String, Vec<Parameter>> {
        match kind {
            EventKind::Sender => &mut self.senders,
            EventKind::Receiver => &mut self.receivers,
        }
    }
}

/// Modules keyed by name, in `sources` order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleTable {
    modules: IndexMap<String, Module>,
}

impl ModuleTable {
    /// An empty table.
    pub fn new() -> Self { Self::default() }

    /// Add a module; names must be unique.
    pub fn insert(&mut self, name: impl Into<String>, module: Module) -> Result<()> {
        let name = name.into();
        if self.modules.contains_key(&name) {
            return Err(IrError::DuplicateModule(name));
        }
        self.modules.insert(name, module);
        Ok(())
    }

    /// Look a module up by name.
    pub fn get(&self, name: &str) -> Option<&Module> { self.modules.get(name) }

    /// Whether a module of that name was loaded.
    pub fn contains(&self, name: &str) -> bool { self.modules.contains_key(name) }

    /// Modules in declaration order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Module)> {
        self.modules.iter().map(|(name, module)| (name.as_str(), module))
    }

    /// Number of modules.
    pub fn len(&self) -> usize { self.modules.len() }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool { self.modules.is_empty() }

    /// YAML rendering, stable for identical tables.
    pub fn to_yaml(&self) -> Result<String> { Ok(serde_yaml::to_string(self)?) }

    /// Pretty JSON rendering, stable for identical tables.
    pub fn to_json_pretty(&self) -> Result<String> { Ok(serde_json::to_string_pretty(self)?) }

    /// Decode a table from YAML.
    pub fn from_yaml_str(s: &str) -> Result<Self> { Ok(serde_yaml::from_str(s)?) }
}
