//! Validation stage: adapts [`WiringValidator`] to the driver.

use analysis::{Diagnostics, WiringValidator};
use indexmap::IndexMap;
use ir::{DocumentTree, ModuleTable, SectionKind};

use crate::{Result, Stage, StageOutcome};

/// Cross-checks messages against the expanded module table.
#[derive(Debug, Clone)]
pub struct ValidationStage {
    validator: WiringValidator,
}

impl ValidationStage {
    /// Stage name used in diagnostics
    pub const NAME: &'static str = "Validate";

    /// Create the stage, compiling its grammars.
    pub fn new() -> Result<Self> { Ok(Self { validator: WiringValidator::new()? }) }
}

impl Stage for ValidationStage {
    fn name(&self) -> &str { Self::NAME }

    fn description(&self) -> &str { "Checks messages, modules and signatures for consistency" }

    fn handles(&self) -> &[SectionKind] { &[SectionKind::Modules, SectionKind::Messages] }

    fn handle(&self, tree: &DocumentTree) -> Result<StageOutcome> {
        let empty_modules = ModuleTable::new();
        let empty_messages = IndexMap::new();
        let modules = tree.modules().unwrap_or(&empty_modules);
        let messages = tree.messages().unwrap_or(&empty_messages);

        let mut diagnostics = Diagnostics::new();
        for error in self.validator.validate(modules, messages) {
            diagnostics.error(Self::NAME, error);
        }
        logging::trace(
            "validate",
            &format!("{} message(s), {} error(s)", messages.len(), diagnostics.error_count()),
        );

        let mut outcome = StageOutcome::consuming(self.handles());
        outcome.diagnostics = diagnostics;
        Ok(outcome)
    }
}
