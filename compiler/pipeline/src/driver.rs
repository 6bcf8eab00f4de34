//! Stage sequencing.
//!
//! `Expand -> Validate -> Generate -> Terminal`, strictly in order. A stage
//! only runs when every stage before it finished without an error
//! diagnostic. After each stage, every section of the tree it was handed
//! must either have been consumed already or be handled by a stage still to
//! come; anything else is reported as unhandled content.

use std::collections::BTreeSet;

use analysis::{Diagnostics, Severity};
use cheader::Extractor;
use codegen_backend::{Artifact, LayeredOutput};
use ir::{DocumentTree, SectionKind};

use crate::{ExpansionStage, GenerationStage, Result, Stage, ValidationStage};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminal {
    /// Every stage ran without errors.
    Success,
    /// The named stage reported errors; later stages did not run.
    Failure(String),
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Final state.
    pub state: Terminal,
    /// All diagnostics, in the order reported.
    pub diagnostics: Diagnostics,
    /// Generated artifacts; only set on success.
    pub output: Option<LayeredOutput>,
    /// The tree as the last stage left it.
    pub tree: DocumentTree,
}

impl RunReport {
    /// Whether the run reached `Terminal::Success`.
    pub fn succeeded(&self) -> bool { self.state == Terminal::Success }
}

/// Runs stages in order over one document tree.
pub struct Driver {
    stages: Vec<Box<dyn Stage>>,
}

impl Driver {
    /// Create a driver for the given stage sequence
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self { Self { stages } }

    /// Expand, validate, then generate `artifacts`.
    pub fn standard(extractor: Extractor, artifacts: &[Artifact]) -> Result<Self> {
        Self::standard_with(extractor, GenerationStage::new(artifacts))
    }

    /// Expand, validate, then run `generation`.
    pub fn standard_with(extractor: Extractor, generation: GenerationStage) -> Result<Self> {
        Ok(Self::new(vec![
            Box::new(ExpansionStage::new(extractor)),
            Box::new(ValidationStage::new()?),
            Box::new(generation),
        ]))
    }

    /// Names of the stages, in order.
    pub fn stage_names(&self) -> Vec<&str> { self.stages.iter().map(|s| s.name()).collect() }

    /// Run every stage over `tree`.
    pub fn run(&self, mut tree: DocumentTree) -> Result<RunReport> {
        let mut diagnostics = Diagnostics::new();
        let mut consumed: BTreeSet<SectionKind> = BTreeSet::new();
        let mut output = None;

        for (index, stage) in self.stages.iter().enumerate() {
            logging::trace("driver", &format!("entering {}", stage.name()));
            tracing::info!("{}: {}", stage.name(), stage.description());
            let outcome = stage.handle(&tree)?;

            let mut stage_diagnostics = outcome.diagnostics;
            consumed.extend(outcome.consumed.iter().copied());
            for key in self.pending(&tree, &consumed, index + 1) {
                stage_diagnostics.error(stage.name(), format!("unhandled content: {}", key));
            }

            for section in outcome.sections {
                tree.insert(section);
            }
            if outcome.output.is_some() {
                output = outcome.output;
            }

            report(stage.name(), &stage_diagnostics);
            let failed = stage_diagnostics.has_errors();
            diagnostics.merge(stage_diagnostics);
            if failed {
                return Ok(RunReport {
                    state: Terminal::Failure(stage.name().to_string()),
                    diagnostics,
                    output: None,
                    tree,
                });
            }
        }

        Ok(RunReport { state: Terminal::Success, diagnostics, output, tree })
    }

    /// Keys of `tree` that nothing has consumed and no stage from
    /// `next` on will handle. Unrecognized sections are always pending.
    fn pending(
        &self,
        tree: &DocumentTree,
        consumed: &BTreeSet<SectionKind>,
        next: usize,
    ) -> Vec<String> {
        let upcoming: BTreeSet<SectionKind> =
            self.stages[next..].iter().flat_map(|s| s.handles().iter().copied()).collect();
        tree.iter()
            .filter(|(_, section)| match section.kind() {
                Some(kind) => !consumed.contains(&kind) && !upcoming.contains(&kind),
                None => true,
            })
            .map(|(key, _)| key.to_string())
            .collect()
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").field("stages", &self.stage_names()).finish()
    }
}

fn report(stage: &str, diagnostics: &Diagnostics) {
    for d in diagnostics.iter() {
        match d.severity {
            Severity::Error => tracing::error!("{}", d.message),
            Severity::Warning => tracing::warn!("{}", d.message),
        }
    }
    if diagnostics.has_errors() {
        tracing::error!("{} error(s) encountered during {}", diagnostics.error_count(), stage);
    }
}
