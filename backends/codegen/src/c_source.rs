//! Generated C source: module includes, init/final sequencing, one
//! dispatcher per message, and the run loop.

use crate::{level, Artifact, Backend, BackendResult, BuildContext, LayeredOutput, Result, WiringGraph};

const RUNTIME: &str = include_str!("../templates/runtime.c");

const SYSTEM_INCLUDES: [&str; 5] = ["stdlib.h", "stdio.h", "signal.h", "err.h", "ev.h"];

/// C source backend
#[derive(Debug, Default)]
pub struct CodeBackend;

impl CodeBackend {
    /// Create a new C source backend
    pub fn new() -> Self { Self }

    fn preamble(&self, ctx: &BuildContext, out: &mut LayeredOutput) {
        out.push(Artifact::Code, level::PREAMBLE, "/* DO NOT EDIT THIS FILE");
        out.push(Artifact::Code, level::PREAMBLE, " * It is auto-generated by mimlc");
        out.push(Artifact::Code, level::PREAMBLE, format!(" * from {}.", ctx.main_miml));
        out.push(Artifact::Code, level::PREAMBLE, " */");
        out.push(Artifact::Code, level::PREAMBLE, "");
        for header in SYSTEM_INCLUDES {
            out.push(Artifact::Code, level::PREAMBLE, format!("#include <{}>", header));
        }
        out.push(Artifact::Code, level::PREAMBLE, "");
    }

    fn includes(&self, graph: &WiringGraph<'_>, ctx: &BuildContext, out: &mut LayeredOutput) {
        for (_, module) in graph.modules() {
            out.push(Artifact::Code, level::INCLUDES, format!("#include \"{}\"", module.include));
        }
        if ctx.emit_header {
            out.push(Artifact::Code, level::INCLUDES, format!("#include \"{}\"", ctx.names.header));
        }
        out.push(Artifact::Code, level::INCLUDES, "");
    }

    fn lifecycle(&self, graph: &WiringGraph<'_>, out: &mut LayeredOutput) {
        out.push(Artifact::Code, level::LIFECYCLE, "static void modules_finalize(void){");
        for hook in graph.finals() {
            out.push(Artifact::Code, level::LIFECYCLE, format!("\t{}();", hook.function));
        }
        out.push(Artifact::Code, level::LIFECYCLE, "}");
        out.push(Artifact::Code, level::LIFECYCLE, "");

        out.push(
            Artifact::Code,
            level::LIFECYCLE,
            "static void modules_initialize(int argc, char *argv[]){",
        );
        for hook in graph.inits() {
            let args = if hook.forwards_args { "argc, argv" } else { "" };
            out.push(Artifact::Code, level::LIFECYCLE, format!("\t{}({});", hook.function, args));
        }
        out.push(Artifact::Code, level::LIFECYCLE, "\tatexit(modules_finalize);");
        out.push(Artifact::Code, level::LIFECYCLE, "}");
        out.push(Artifact::Code, level::LIFECYCLE, "");
    }

    fn dispatchers(&self, graph: &WiringGraph<'_>, out: &mut LayeredOutput) {
        for dispatcher in graph.dispatchers() {
            let args = dispatcher.arguments();
            out.push(Artifact::Code, level::DISPATCH, format!("{}{{", dispatcher.signature()));
            for receiver in &dispatcher.receivers {
                out.push(Artifact::Code, level::DISPATCH, format!("\t{}({});", receiver.event, args));
            }
            out.push(Artifact::Code, level::DISPATCH, "}");
            out.push(Artifact::Code, level::DISPATCH, "");
        }
    }
}

impl Backend for CodeBackend {
    fn generate(&self, graph: &WiringGraph<'_>, ctx: &BuildContext) -> Result<BackendResult> {
        let mut out = LayeredOutput::new();
        self.preamble(ctx, &mut out);
        self.includes(graph, ctx, &mut out);
        self.lifecycle(graph, &mut out);
        self.dispatchers(graph, &mut out);
        out.push_block(Artifact::Code, level::RUNTIME, RUNTIME);
        tracing::debug!("{}: {} dispatcher(s)", self.name(), graph.dispatchers().len());
        Ok(self.finish(out))
    }

    fn name(&self) -> &str { "code" }

    fn description(&self) -> &str { "Generates the C source wiring modules together" }
}
