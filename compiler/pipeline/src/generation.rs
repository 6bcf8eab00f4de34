//! Generation stage: runs the selected backends over the validated tree.

use codegen_backend::{
    Artifact, Backend, BuildContext, CodeBackend, DotBackend, HeaderBackend, LayeredOutput,
    MakeBackend, Regeneration, WiringGraph,
};
use indexmap::IndexMap;
use ir::{DocumentTree, ModuleTable, SectionKind};

use crate::{Result, Stage, StageOutcome};

/// Produces the requested artifacts.
pub struct GenerationStage {
    backends: Vec<Box<dyn Backend>>,
    emit_header: bool,
    emit_dot: bool,
    regeneration: Regeneration,
}

impl GenerationStage {
    /// Stage name used in diagnostics
    pub const NAME: &'static str = "Generate";

    /// Generate the given artifacts, in artifact order.
    pub fn new(artifacts: &[Artifact]) -> Self {
        let mut artifacts = artifacts.to_vec();
        artifacts.sort();
        artifacts.dedup();

        let backends = artifacts
            .iter()
            .map(|artifact| -> Box<dyn Backend> {
                match artifact {
                    Artifact::Code => Box::new(CodeBackend::new()),
                    Artifact::Header => Box::new(HeaderBackend::new()),
                    Artifact::Make => Box::new(MakeBackend::new()),
                    Artifact::Dot => Box::new(DotBackend::new()),
                }
            })
            .collect();
        Self {
            backends,
            emit_header: artifacts.contains(&Artifact::Header),
            emit_dot: artifacts.contains(&Artifact::Dot),
            regeneration: Regeneration::default(),
        }
    }

    /// Have the Makefile rule repeat `regeneration`.
    pub fn with_regeneration(mut self, regeneration: Regeneration) -> Self {
        self.regeneration = regeneration;
        self
    }

    fn context(&self, tree: &DocumentTree) -> BuildContext {
        let mut ctx = BuildContext::new(tree.main_miml().unwrap_or_default());
        if let Some(names) = tree.filenames() {
            ctx.names = names.clone();
        }
        if let Some(framework) = tree.framework() {
            ctx.framework = framework.to_string();
        }
        ctx.emit_header = self.emit_header;
        ctx.emit_dot = self.emit_dot;
        ctx.regeneration = self.regeneration.clone();
        ctx
    }
}

impl std::fmt::Debug for GenerationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.backends.iter().map(|b| b.name()).collect();
        f.debug_struct("GenerationStage").field("backends", &names).finish()
    }
}

impl Stage for GenerationStage {
    fn name(&self) -> &str { Self::NAME }

    fn description(&self) -> &str { "Emits C source, header, Makefile and graph artifacts" }

    fn handles(&self) -> &[SectionKind] {
        &[
            SectionKind::Modules,
            SectionKind::Messages,
            SectionKind::Filenames,
            SectionKind::Framework,
            SectionKind::MainMiml,
        ]
    }

    fn handle(&self, tree: &DocumentTree) -> Result<StageOutcome> {
        let empty_modules = ModuleTable::new();
        let empty_messages = IndexMap::new();
        let modules = tree.modules().unwrap_or(&empty_modules);
        let messages = tree.messages().unwrap_or(&empty_messages);

        let graph = WiringGraph::new(modules, messages)?;
        let ctx = self.context(tree);
        let mut output = LayeredOutput::new();
        for backend in &self.backends {
            tracing::debug!("backend {}: {}", backend.name(), backend.description());
            let result = backend.generate(&graph, &ctx)?;
            tracing::debug!(
                "{}: {} line(s)",
                result.metadata.backend_name,
                result.metadata.total_lines
            );
            output.merge(result.output);
        }
        logging::trace(
            "generate",
            &format!("{} dispatcher(s), {} backend(s)", graph.dispatchers().len(), self.backends.len()),
        );

        let mut outcome = StageOutcome::consuming(self.handles());
        outcome.output = Some(output);
        Ok(outcome)
    }
}
