//! The interface every compiler stage implements.

use analysis::Diagnostics;
use codegen_backend::LayeredOutput;
use ir::{DocumentTree, Section, SectionKind};

use crate::Result;

/// What a stage hands back to the driver.
#[derive(Debug, Default)]
pub struct StageOutcome {
    /// Sections to merge into the tree, replacing any of the same kind.
    pub sections: Vec<Section>,
    /// Sections of the input tree this stage dealt with.
    pub consumed: Vec<SectionKind>,
    /// Defects found.
    pub diagnostics: Diagnostics,
    /// Generated artifacts, for stages that generate.
    pub output: Option<LayeredOutput>,
}

impl StageOutcome {
    /// An outcome that consumed `kinds` and produced nothing yet.
    pub fn consuming(kinds: &[SectionKind]) -> Self {
        Self { consumed: kinds.to_vec(), ..Self::default() }
    }
}

/// A compiler stage.
///
/// Stages read the tree they are handed and describe their effect in a
/// [`StageOutcome`]; only the driver mutates the tree.
pub trait Stage {
    /// Name used in diagnostics and logs
    fn name(&self) -> &str;

    /// Description of what this stage does
    fn description(&self) -> &str;

    /// Section kinds this stage knows how to handle
    fn handles(&self) -> &[SectionKind];

    /// Run the stage. `Err` is reserved for failures that are not defects
    /// of the input.
    fn handle(&self, tree: &DocumentTree) -> Result<StageOutcome>;
}
