//! Makefile fragment: module objects, the binary, and a rule that
//! regenerates the wiring when the document or a module header changes.

use crate::{level, Artifact, Backend, BackendResult, BuildContext, LayeredOutput, Result, WiringGraph};

/// Makefile backend
#[derive(Debug, Default)]
pub struct MakeBackend;

impl MakeBackend {
    /// Create a new Makefile backend
    pub fn new() -> Self { Self }
}

impl Backend for MakeBackend {
    fn generate(&self, graph: &WiringGraph<'_>, ctx: &BuildContext) -> Result<BackendResult> {
        let mut out = LayeredOutput::new();
        let names = &ctx.names;

        for (_, module) in graph.modules() {
            out.push(Artifact::Make, level::PREAMBLE, format!("OBJECTS += {}", module.object));
        }
        out.push(Artifact::Make, level::PREAMBLE, "");

        let regen = &ctx.regeneration;
        let mut targets = vec![names.code.as_str()];
        let mut flags = vec!["-c"];
        if ctx.emit_header {
            targets.push(&names.header);
            flags.push("-H");
        }
        if ctx.emit_dot {
            targets.push(&names.dot);
            flags.push("-d");
        }
        flags.push("-m");
        if let Some(config) = &regen.config_file {
            flags.extend(["-g", config.as_str()]);
        }
        if let Some(dir) = &regen.output_dir {
            flags.extend(["-o", dir.as_str()]);
        }
        let targets: Vec<String> = match &regen.output_dir {
            Some(dir) => targets.iter().map(|t| format!("{}/{}", dir, t)).collect(),
            None => targets.iter().map(|t| t.to_string()).collect(),
        };

        let mut prerequisites = vec![ctx.main_miml.as_str()];
        prerequisites.extend(graph.modules().map(|(_, m)| m.path.as_str()));

        out.push(
            Artifact::Make,
            level::DISPATCH,
            format!("{}: {}", targets.join(" "), prerequisites.join(" ")),
        );
        out.push(
            Artifact::Make,
            level::DISPATCH,
            format!("\t{}/mimlc {} {}", ctx.framework, flags.join(" "), ctx.main_miml),
        );
        out.push(Artifact::Make, level::DISPATCH, "");

        let binary = names.code.split('.').next().unwrap_or(&names.code);
        out.push(Artifact::Make, level::RUNTIME, format!("{}: $(OBJECTS)", binary));
        out.push(Artifact::Make, level::RUNTIME, "");
        out.push(Artifact::Make, level::TRAILER, format!("all: {}", binary));
        Ok(self.finish(out))
    }

    fn name(&self) -> &str { "make" }

    fn description(&self) -> &str { "Generates the Makefile fragment for the wired binary" }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use ir::{Module, ModuleTable};

    use super::*;
    use crate::Regeneration;

    fn render(ctx: &BuildContext) -> String {
        let mut table = ModuleTable::new();
        table.insert("ADIS", Module::new("adis.h", "tests/data/adis.h", "ADIS.o")).expect("insert");
        table.insert("LOGGER", Module::new("logger.h", "logger.h", "LOGGER.o")).expect("insert");
        let graph = WiringGraph::new(&table, &IndexMap::new()).expect("graph");
        let result = MakeBackend::new().generate(&graph, ctx).expect("generate");
        result.output.render(Artifact::Make).expect("make artifact")
    }

    #[test]
    fn test_layout() {
        let mut ctx = BuildContext::new("fc.miml");
        ctx.framework = "/opt/miml".to_string();
        assert_eq!(
            render(&ctx),
            "OBJECTS += ADIS.o\n\
             OBJECTS += LOGGER.o\n\
             \n\
             main.c: fc.miml tests/data/adis.h logger.h\n\
             \t/opt/miml/mimlc -c -m fc.miml\n\
             \n\
             main: $(OBJECTS)\n\
             \n\
             all: main\n"
        );
    }

    #[test]
    fn test_rule_repeats_invocation_settings() {
        let mut ctx = BuildContext::new("fc.miml");
        ctx.emit_dot = true;
        ctx.regeneration = Regeneration {
            config_file: Some("conf/cg.toml".to_string()),
            output_dir: Some("gen".to_string()),
        };
        let make = render(&ctx);
        assert!(make.contains("gen/main.c gen/wiring.dot: fc.miml"), "{}", make);
        assert!(make.contains("\t./mimlc -c -d -m -g conf/cg.toml -o gen fc.miml\n"), "{}", make);
    }

    #[test]
    fn test_header_is_regenerated_too() {
        let mut ctx = BuildContext::new("fc.miml");
        ctx.emit_header = true;
        let make = render(&ctx);
        assert!(make.contains("main.c main.h: fc.miml"));
        assert!(make.contains("\t./mimlc -c -H -m fc.miml\n"));
    }
}
