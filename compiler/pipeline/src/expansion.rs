//! Expansion: resolve every `sources` header and fold its annotated
//! signatures into a module record.

use analysis::Diagnostics;
use cheader::{AnnotationKind, ExtractedParam, Extractor, Signature};
use ir::{DocumentTree, EventKind, Hook, Module, ModuleTable, Parameter, Section, SectionKind, SourceEntry};
use path::SearchPath;

use crate::{Result, Stage, StageOutcome};

const SYNTHETIC_BASE: &str = "_arg";

/// Builds the module table from the `sources` section.
#[derive(Debug, Clone, Default)]
pub struct ExpansionStage {
    extractor: Extractor,
}

impl ExpansionStage {
    /// Stage name used in diagnostics
    pub const NAME: &'static str = "Expand";

    /// Expand with the given header extractor.
    pub fn new(extractor: Extractor) -> Self { Self { extractor } }

    /// Resolve, extract and fold one header. The first problem aborts the
    /// header and is returned as the diagnostic message.
    fn expand_module(
        &self,
        search: &SearchPath,
        entry: &SourceEntry,
    ) -> std::result::Result<Module, String> {
        let resolved = search.resolve(&entry.header).map_err(|e| e.to_string())?;
        let full_path = resolved.full_path;
        let mut module =
            Module::new(entry.header.clone(), full_path.clone(), format!("{}.o", entry.module));

        let signatures = self.extractor.signatures(&full_path).map_err(|e| e.to_string())?;
        for signature in signatures {
            let signature = signature.map_err(|e| e.to_string())?;
            if signature.file != full_path {
                tracing::debug!(
                    "{}: skipping {} from {}",
                    entry.module,
                    signature.name,
                    signature.file
                );
                continue;
            }
            fold(&mut module, signature)?;
        }

        logging::trace(
            "expand",
            &format!(
                "{} <- {}: {} sender(s), {} receiver(s)",
                entry.module,
                full_path,
                module.senders.len(),
                module.receivers.len()
            ),
        );
        Ok(module)
    }
}

/// Merge one signature into a module record.
fn fold(module: &mut Module, signature: Signature) -> std::result::Result<(), String> {
    let Signature { name, params, kind, file, .. } = signature;
    match kind {
        AnnotationKind::Init => {
            if module.init.is_some() {
                return Err(format!("More than one miml init specified for {}", file));
            }
            let forwards_args = match params.as_slice() {
                [] => false,
                [argc, argv] if argc.ctype == "int" && argv.ctype == "char *" => true,
                _ => {
                    return Err(format!(
                        "Miml init function {} in {} must take no arguments or (int argc, char *argv[])",
                        name, file
                    ))
                }
            };
            module.init = Some(Hook { function: name, forwards_args });
        }
        AnnotationKind::Final => {
            if module.final_hook.is_some() {
                return Err(format!("More than one miml final specified for {}", file));
            }
            module.final_hook = Some(Hook::plain(name));
        }
        AnnotationKind::Sender | AnnotationKind::Receiver => {
            let event_kind =
                if kind == AnnotationKind::Sender { EventKind::Sender } else { EventKind::Receiver };
            let events = module.events_mut(event_kind);
            if events.contains_key(&name) {
                return Err(format!("Duplicate miml {} {} in {}", kind, name, file));
            }
            events.insert(name, assign_names(&params));
        }
    }
    Ok(())
}

/// Name every parameter, keeping declared names and giving unnamed
/// positions `<base><position>` (1-based).
///
/// The base starts as `_arg` and gains a leading underscore while any
/// declared name starts with it, so synthetic names never collide with
/// declared ones.
pub fn assign_names(params: &[ExtractedParam]) -> Vec<Parameter> {
    let mut base = SYNTHETIC_BASE.to_string();
    while params.iter().filter_map(|p| p.name.as_deref()).any(|n| n.starts_with(&base)) {
        base.insert(0, '_');
    }
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let name = p.name.clone().unwrap_or_else(|| format!("{}{}", base, i + 1));
            Parameter::new(p.ctype.clone(), name)
        })
        .collect()
}

impl Stage for ExpansionStage {
    fn name(&self) -> &str { Self::NAME }

    fn description(&self) -> &str { "Resolves module headers into the module table" }

    fn handles(&self) -> &[SectionKind] { &[SectionKind::Sources, SectionKind::Include] }

    fn handle(&self, tree: &DocumentTree) -> Result<StageOutcome> {
        let search = SearchPath::new(tree.include().iter().cloned());
        let mut modules = ModuleTable::new();
        let mut diagnostics = Diagnostics::new();

        for entry in tree.sources() {
            if modules.contains(&entry.module) {
                diagnostics.error(
                    Self::NAME,
                    format!("Module {} is listed more than once in sources", entry.module),
                );
                continue;
            }
            match self.expand_module(&search, entry) {
                Ok(module) => modules.insert(entry.module.clone(), module)?,
                Err(message) => diagnostics.error(Self::NAME, message),
            }
        }

        let mut outcome = StageOutcome::consuming(self.handles());
        outcome.sections.push(Section::Modules(modules));
        outcome.diagnostics = diagnostics;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(ctype: &str, name: Option<&str>) -> ExtractedParam {
        ExtractedParam { ctype: ctype.to_string(), name: name.map(str::to_string) }
    }

    #[test]
    fn test_unnamed_positions_get_synthetic_names() {
        let named = assign_names(&[param("int", None), param("char *", Some("name"))]);
        assert_eq!(named, [Parameter::new("int", "_arg1"), Parameter::new("char *", "name")]);
    }

    #[test]
    fn test_synthetic_names_avoid_declared_names() {
        let named = assign_names(&[
            param("int", Some("_arg2")),
            param("int", None),
            param("int", Some("__arg9")),
            param("int", None),
        ]);
        let names: Vec<_> = named.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["_arg2", "___arg2", "__arg9", "___arg4"]);
    }

    #[test]
    fn test_duplicate_init_is_rejected() {
        let mut module = Module::new("m.h", "m.h", "M.o");
        let init = |name: &str| Signature {
            name: name.to_string(),
            return_type: "void".to_string(),
            params: Vec::new(),
            kind: AnnotationKind::Init,
            file: "m.h".to_string(),
            line: 1,
        };
        fold(&mut module, init("first")).expect("first init");
        assert_eq!(
            fold(&mut module, init("second")),
            Err("More than one miml init specified for m.h".to_string())
        );
    }

    #[test]
    fn test_init_arity() {
        let mut module = Module::new("m.h", "m.h", "M.o");
        let sig = Signature {
            name: "m_init".to_string(),
            return_type: "void".to_string(),
            params: vec![param("int", Some("argc"))],
            kind: AnnotationKind::Init,
            file: "m.h".to_string(),
            line: 3,
        };
        let err = fold(&mut module, sig).expect_err("one argument init");
        assert!(err.contains("m_init"), "{}", err);
    }
}
