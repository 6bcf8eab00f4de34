//! Graphviz rendering of the wiring, for inspection.

use ir::EventKind;

use crate::{level, Artifact, Backend, BackendResult, BuildContext, LayeredOutput, Result, WiringGraph};

/// Dot backend
#[derive(Debug, Default)]
pub struct DotBackend;

impl DotBackend {
    /// Create a new dot backend
    pub fn new() -> Self { Self }
}

impl Backend for DotBackend {
    fn generate(&self, graph: &WiringGraph<'_>, _ctx: &BuildContext) -> Result<BackendResult> {
        let mut out = LayeredOutput::new();
        out.push(Artifact::Dot, level::PREAMBLE, "digraph miml {");

        for (name, module) in graph.modules() {
            let ports = |kind| {
                module.events(kind).keys().map(|e| format!("<{0}> {0}", e)).collect::<Vec<_>>().join("|")
            };
            let record = format!(
                "{{{{{} }}| {} |{{ {}}}}}",
                ports(EventKind::Receiver),
                name,
                ports(EventKind::Sender)
            );
            out.push(
                Artifact::Dot,
                level::INCLUDES,
                format!("\t{} [shape=record, label=\"{}\"];", name, record),
            );
        }
        out.push(Artifact::Dot, level::INCLUDES, "");

        for dispatcher in graph.dispatchers() {
            let sender = &dispatcher.sender;
            for receiver in &dispatcher.receivers {
                out.push(
                    Artifact::Dot,
                    level::DISPATCH,
                    format!(
                        "\t{}:{}:s -> {}:{}:n;",
                        sender.module, sender.event, receiver.module, receiver.event
                    ),
                );
            }
        }
        out.push(Artifact::Dot, level::TRAILER, "}");
        Ok(self.finish(out))
    }

    fn name(&self) -> &str { "dot" }

    fn description(&self) -> &str { "Generates a Graphviz graph of modules and messages" }
}

#[cfg(test)]
mod tests {
    use indexmap::IndexMap;
    use ir::{Module, ModuleTable, Parameter};

    use super::*;

    #[test]
    fn test_records_and_edges() {
        let mut a = Module::new("a.h", "a.h", "A.o");
        a.senders.insert("tick".into(), vec![Parameter::new("int", "count")]);
        let mut b = Module::new("b.h", "b.h", "B.o");
        b.receivers.insert("onTick".into(), vec![Parameter::new("int", "n")]);
        let mut table = ModuleTable::new();
        table.insert("A", a).expect("insert A");
        table.insert("B", b).expect("insert B");
        let mut messages = IndexMap::new();
        messages.insert("A.tick".to_string(), vec!["B.onTick".to_string()]);

        let graph = WiringGraph::new(&table, &messages).expect("graph");
        let result = DotBackend::new()
            .generate(&graph, &BuildContext::new("w.miml"))
            .expect("generate");
        let dot = result.output.render(Artifact::Dot).expect("dot artifact");

        assert!(dot.starts_with("digraph miml {\n"));
        assert!(dot.contains("\tA [shape=record, label=\"{{ }| A |{ <tick> tick}}\"];\n"));
        assert!(dot.contains("\tB [shape=record, label=\"{{<onTick> onTick }| B |{ }}\"];\n"));
        assert!(dot.contains("\tA:tick:s -> B:onTick:n;\n"));
        assert!(dot.ends_with("}\n"));
    }
}
