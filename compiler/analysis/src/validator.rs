//! Wiring Validation
//!
//! Validates the expanded module table and the message section for
//! correctness and consistency. Performs the checks that must hold before
//! any dispatcher can be generated:
//!
//! - every sender and receiver key is `<module>.<event>`
//! - every referenced module is loaded and declares the referenced event
//! - receivers agree with their sender in arity and, position by position,
//!   in base type
//! - file names, identifiers and parameter types are well formed
//!
//! All failures are collected; none stops the remaining checks.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use ir::{CType, EventKey, EventKind, Module, ModuleTable, Parameter};

use crate::{Grammar, Result};

/// Functions every generated C source defines.
const GENERATED_SYMBOLS: [&str; 3] = ["modules_initialize", "modules_finalize", "main"];

/// Wiring validator
#[derive(Debug, Clone)]
pub struct WiringValidator {
    grammar: Grammar,
}

impl WiringValidator {
    /// Create a new validator
    pub fn new() -> Result<Self> { Ok(Self { grammar: Grammar::new()? }) }

    /// Validate modules and messages and return every error found
    pub fn validate(
        &self,
        modules: &ModuleTable,
        messages: &IndexMap<String, Vec<String>>,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        // 1) Module records
        for (name, module) in modules.iter() {
            self.validate_module(name, module, &mut errors);
        }

        // 2) Dispatcher symbols must be unique
        {
            let taken = reserved_symbols(modules);
            let mut seen: HashMap<String, &str> = HashMap::new();
            for sender in messages.keys() {
                let Ok(key) = sender.parse::<EventKey>() else { continue };
                if let Some(owner) = taken.get(key.event.as_str()) {
                    errors.push(format!(
                        "Message '{}': dispatcher {} would redefine {}",
                        sender, key.event, owner
                    ));
                }
                match seen.get(&key.event) {
                    Some(first) => errors.push(format!(
                        "Messages '{}' and '{}' would both define dispatcher {}",
                        first, sender, key.event
                    )),
                    None => {
                        seen.insert(key.event, sender);
                    }
                }
            }
        }

        // 3) Per-message checks
        for (sender, receivers) in messages {
            self.validate_message(modules, sender, receivers, &mut errors);
        }

        tracing::debug!(
            "validated {} module(s), {} message(s): {} error(s)",
            modules.len(),
            messages.len(),
            errors.len()
        );
        errors
    }

    fn validate_module(&self, name: &str, module: &Module, errors: &mut Vec<String>) {
        if !self.grammar.is_identifier(name) {
            errors.push(format!("Module '{}': illegal module name", name));
        }
        if !self.grammar.is_include(&module.include) {
            errors.push(format!("Module {}: illegal include file '{}'", name, module.include));
        }
        if !self.grammar.is_object(&module.object) {
            errors.push(format!("Module {}: illegal object file '{}'", name, module.object));
        }
        for (label, hook) in [("init", &module.init), ("final", &module.final_hook)] {
            if let Some(hook) = hook {
                if !self.grammar.is_identifier(&hook.function) {
                    errors.push(format!(
                        "Module {}: illegal {} function name '{}'",
                        name, label, hook.function
                    ));
                }
            }
        }

        for kind in [EventKind::Sender, EventKind::Receiver] {
            for (event, params) in module.events(kind) {
                if !self.grammar.is_identifier(event) {
                    errors.push(format!(
                        "Module {}: illegal {} name '{}'",
                        name,
                        kind.label(),
                        event
                    ));
                }
                self.validate_params(name, kind, event, params, errors);
            }
        }
    }

    fn validate_params(
        &self,
        module: &str,
        kind: EventKind,
        event: &str,
        params: &[Parameter],
        errors: &mut Vec<String>,
    ) {
        let mut names = HashSet::new();
        for (position, param) in params.iter().enumerate() {
            let position = position + 1;
            if param.ctype.parse::<CType>().is_err() {
                errors.push(format!(
                    "Module {}: {} {} argument {}: illegal type '{}'",
                    module,
                    kind.label(),
                    event,
                    position,
                    param.ctype
                ));
            }
            if !self.grammar.is_identifier(&param.name) {
                errors.push(format!(
                    "Module {}: {} {} argument {}: illegal name '{}'",
                    module,
                    kind.label(),
                    event,
                    position,
                    param.name
                ));
            } else if !names.insert(param.name.as_str()) {
                errors.push(format!(
                    "Module {}: {} {} argument {}: duplicate name '{}'",
                    module,
                    kind.label(),
                    event,
                    position,
                    param.name
                ));
            }
        }
    }

    fn validate_message(
        &self,
        modules: &ModuleTable,
        sender: &str,
        receivers: &[String],
        errors: &mut Vec<String>,
    ) {
        // (a) syntax
        let sender_params = match sender.parse::<EventKey>() {
            Ok(key) => match lookup(modules, &key, EventKind::Sender) {
                Ok(params) => Some(params),
                Err(e) => {
                    errors.push(format!("Message '{}': {}", sender, e));
                    None
                }
            },
            Err(_) => {
                errors.push(format!(
                    "Message '{}': illegal syntax, expected <module>.<event>",
                    sender
                ));
                None
            }
        };

        if receivers.is_empty() {
            errors.push(format!("Message '{}': no receivers", sender));
        }

        let mut listed = HashSet::new();
        for receiver in receivers {
            if !listed.insert(receiver.as_str()) {
                errors.push(format!(
                    "Message '{}': receiver '{}' is listed more than once",
                    sender, receiver
                ));
                continue;
            }
            let key = match receiver.parse::<EventKey>() {
                Ok(key) => key,
                Err(_) => {
                    errors.push(format!(
                        "Message '{}': receiver '{}': illegal syntax, expected <module>.<event>",
                        sender, receiver
                    ));
                    continue;
                }
            };
            let params = match lookup(modules, &key, EventKind::Receiver) {
                Ok(params) => params,
                Err(e) => {
                    errors.push(format!("Message '{}': receiver '{}': {}", sender, receiver, e));
                    continue;
                }
            };
            if let Some(sender_params) = sender_params {
                check_signature(sender, receiver, sender_params, params, errors);
            }
        }
    }
}

/// C symbols a dispatcher must not define: receiver functions, init and
/// final hooks, and the functions the generated source defines itself.
fn reserved_symbols(modules: &ModuleTable) -> HashMap<&str, String> {
    let mut taken: HashMap<&str, String> = GENERATED_SYMBOLS
        .iter()
        .map(|&name| (name, format!("generated function {}", name)))
        .collect();
    for (name, module) in modules.iter() {
        for event in module.receivers.keys() {
            taken.entry(event.as_str()).or_insert_with(|| format!("receiver {}.{}", name, event));
        }
        for (label, hook) in [("init", &module.init), ("final", &module.final_hook)] {
            if let Some(hook) = hook {
                taken
                    .entry(hook.function.as_str())
                    .or_insert_with(|| format!("{} function of module {}", label, name));
            }
        }
    }
    taken
}

/// Resolve an event key to its parameter list.
fn lookup<'m>(
    modules: &'m ModuleTable,
    key: &EventKey,
    kind: EventKind,
) -> std::result::Result<&'m [Parameter], String> {
    let module =
        modules.get(&key.module).ok_or_else(|| format!("module {} is not loaded", key.module))?;
    module
        .events(kind)
        .get(&key.event)
        .map(Vec::as_slice)
        .ok_or_else(|| format!("module {} has no {} {}", key.module, kind.label(), key.event))
}

/// Arity, then positional base-type agreement. Parameter names do not
/// take part.
fn check_signature(
    sender: &str,
    receiver: &str,
    sent: &[Parameter],
    accepted: &[Parameter],
    errors: &mut Vec<String>,
) {
    if sent.len() != accepted.len() {
        errors.push(format!(
            "Message '{}': receiver '{}' takes {} argument(s) but the sender provides {}",
            sender,
            receiver,
            accepted.len(),
            sent.len()
        ));
        return;
    }
    for (position, (s, r)) in sent.iter().zip(accepted).enumerate() {
        let (Ok(st), Ok(rt)) = (s.ctype.parse::<CType>(), r.ctype.parse::<CType>()) else {
            continue;
        };
        if !st.compatible_with(&rt) {
            errors.push(format!(
                "Message '{}': receiver '{}' argument {} has type '{}', sender provides '{}'",
                sender,
                receiver,
                position + 1,
                r.ctype,
                s.ctype
            ));
        }
    }
}
