//! Level-ordered output buffers, one per artifact.

use std::collections::BTreeMap;

use ir::OutputNames;

/// Ordering levels used by the backends. Lower levels print first.
pub mod level {
    /// Banner, system includes, include guards.
    pub const PREAMBLE: u32 = 0;
    /// Module header includes.
    pub const INCLUDES: u32 = 10;
    /// Init and final sequencing.
    pub const LIFECYCLE: u32 = 20;
    /// Dispatcher functions and prototypes.
    pub const DISPATCH: u32 = 30;
    /// Run-loop boilerplate.
    pub const RUNTIME: u32 = 40;
    /// Closing lines such as `#endif`.
    pub const TRAILER: u32 = 90;
}

/// A generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Artifact {
    /// Generated C source
    Code,
    /// Companion header
    Header,
    /// Makefile fragment
    Make,
    /// Graphviz wiring graph
    Dot,
}

impl Artifact {
    /// The configured file name for this artifact.
    pub fn file_name(self, names: &OutputNames) -> &str {
        match self {
            Artifact::Code => &names.code,
            Artifact::Header => &names.header,
            Artifact::Make => &names.make,
            Artifact::Dot => &names.dot,
        }
    }
}

/// Lines keyed by artifact, then by level.
///
/// Rendering walks levels in ascending order and keeps insertion order
/// within a level, so output is stable regardless of which wiring entry
/// produced a line first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayeredOutput {
    artifacts: BTreeMap<Artifact, BTreeMap<u32, Vec<String>>>,
}

impl LayeredOutput {
    /// Empty output.
    pub fn new() -> Self { Self::default() }

    /// Append one line.
    pub fn push(&mut self, artifact: Artifact, level: u32, line: impl Into<String>) {
        self.artifacts.entry(artifact).or_default().entry(level).or_default().push(line.into());
    }

    /// Append each line of a multi-line block.
    pub fn push_block(&mut self, artifact: Artifact, level: u32, block: &str) {
        for line in block.lines() {
            self.push(artifact, level, line);
        }
    }

    /// Move every line of `other` in after the lines already present.
    pub fn merge(&mut self, other: LayeredOutput) {
        for (artifact, levels) in other.artifacts {
            let mine = self.artifacts.entry(artifact).or_default();
            for (level, lines) in levels {
                mine.entry(level).or_default().extend(lines);
            }
        }
    }

    /// Artifacts that received at least one line.
    pub fn artifacts(&self) -> impl Iterator<Item = Artifact> + '_ {
        self.artifacts.keys().copied()
    }

    /// Render one artifact, newline terminated.
    pub fn render(&self, artifact: Artifact) -> Option<String> {
        let levels = self.artifacts.get(&artifact)?;
        let mut text = String::new();
        for line in levels.values().flatten() {
            text.push_str(line);
            text.push('\n');
        }
        Some(text)
    }

    /// Total number of lines across artifacts.
    pub fn line_count(&self) -> usize {
        self.artifacts.values().flat_map(BTreeMap::values).map(Vec::len).sum()
    }
}
