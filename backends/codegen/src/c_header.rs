//! Companion header declaring the generated dispatchers.

use crate::{level, Artifact, Backend, BackendResult, BuildContext, LayeredOutput, Result, WiringGraph};

/// C header backend
#[derive(Debug, Default)]
pub struct HeaderBackend;

impl HeaderBackend {
    /// Create a new header backend
    pub fn new() -> Self { Self }
}

/// `main.h` becomes `MAIN_H_`.
pub fn include_guard(file_name: &str) -> String {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    let mut guard: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert(0, '_');
    }
    guard.push('_');
    guard
}

impl Backend for HeaderBackend {
    fn generate(&self, graph: &WiringGraph<'_>, ctx: &BuildContext) -> Result<BackendResult> {
        let mut out = LayeredOutput::new();
        let guard = include_guard(&ctx.names.header);

        out.push(Artifact::Header, level::PREAMBLE, "/* DO NOT EDIT THIS FILE");
        out.push(Artifact::Header, level::PREAMBLE, " * It is auto-generated by mimlc");
        out.push(Artifact::Header, level::PREAMBLE, format!(" * from {}.", ctx.main_miml));
        out.push(Artifact::Header, level::PREAMBLE, " */");
        out.push(Artifact::Header, level::PREAMBLE, "");
        out.push(Artifact::Header, level::PREAMBLE, format!("#ifndef {}", guard));
        out.push(Artifact::Header, level::PREAMBLE, format!("#define {}", guard));
        out.push(Artifact::Header, level::PREAMBLE, "");

        for (_, module) in graph.modules() {
            out.push(Artifact::Header, level::INCLUDES, format!("#include \"{}\"", module.include));
        }
        out.push(Artifact::Header, level::INCLUDES, "");

        for dispatcher in graph.dispatchers() {
            out.push(Artifact::Header, level::DISPATCH, format!("{};", dispatcher.signature()));
        }
        out.push(Artifact::Header, level::DISPATCH, "");

        out.push(Artifact::Header, level::TRAILER, format!("#endif /* {} */", guard));
        Ok(self.finish(out))
    }

    fn name(&self) -> &str { "header" }

    fn description(&self) -> &str { "Generates prototypes for the dispatcher functions" }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use ir::{Module, ModuleTable, Parameter};

    use super::*;

    #[test]
    fn test_include_guard() {
        assert_eq!(include_guard("main.h"), "MAIN_H_");
        assert_eq!(include_guard("gen/fc-wiring.h"), "FC_WIRING_H_");
        assert_eq!(include_guard("2nd.h"), "_2ND_H_");
    }

    #[test]
    fn test_prototypes() {
        let mut a = Module::new("a.h", "a.h", "A.o");
        a.senders.insert("tick".into(), vec![Parameter::new("int", "count")]);
        a.senders.insert("ping".into(), Vec::new());
        let mut table = ModuleTable::new();
        table.insert("A", a).expect("insert");
        let mut messages = IndexMap::new();
        messages.insert("A.tick".to_string(), Vec::new());
        messages.insert("A.ping".to_string(), Vec::new());

        let graph = WiringGraph::new(&table, &messages).expect("graph");
        let result = HeaderBackend::new()
            .generate(&graph, &BuildContext::new("w.miml"))
            .expect("generate");
        let header = result.output.render(Artifact::Header).expect("header artifact");

        assert!(header.contains("#ifndef MAIN_H_\n#define MAIN_H_\n"));
        assert!(header.contains("void tick(int count);\nvoid ping(void);\n"));
        assert!(header.ends_with("#endif /* MAIN_H_ */\n"));
        assert_eq!(result.metadata.backend_name, "header");
    }
}
