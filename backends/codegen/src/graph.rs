//! Resolved view of a validated wiring document.

use indexmap::IndexMap;
use ir::{EventKey, EventKind, Hook, Module, ModuleTable, Parameter};

use crate::{BackendError, Result};

/// One generated dispatcher: the sender's signature plus the receivers it
/// forwards to, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatcher<'a> {
    /// Sender key; the event name is the C symbol defined.
    pub sender: EventKey,
    /// Sender parameters, names included.
    pub params: &'a [Parameter],
    /// Receiver keys, in document order.
    pub receivers: Vec<EventKey>,
}

impl Dispatcher<'_> {
    /// `void <event>(<type> <name>, ...)`, without a terminator.
    pub fn signature(&self) -> String {
        let params = if self.params.is_empty() {
            "void".to_string()
        } else {
            self.params
                .iter()
                .map(|p| format!("{} {}", p.ctype, p.name))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!("void {}({})", self.sender.event, params)
    }

    /// Argument list forwarded to every receiver, by position.
    pub fn arguments(&self) -> String {
        self.params.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
    }
}

/// Modules and dispatchers, ready for the backends.
#[derive(Debug, Clone)]
pub struct WiringGraph<'a> {
    modules: &'a ModuleTable,
    dispatchers: Vec<Dispatcher<'a>>,
}

impl<'a> WiringGraph<'a> {
    /// Resolve every message against the module table.
    pub fn new(modules: &'a ModuleTable, messages: &IndexMap<String, Vec<String>>) -> Result<Self> {
        let mut dispatchers = Vec::with_capacity(messages.len());
        for (sender, receivers) in messages {
            let unresolved = || BackendError::UnresolvedSender(sender.clone());
            let key: EventKey = sender.parse().map_err(|_| unresolved())?;
            let params = modules
                .get(&key.module)
                .and_then(|m| m.events(EventKind::Sender).get(&key.event))
                .ok_or_else(unresolved)?;

            let receivers = receivers
                .iter()
                .map(|receiver| -> Result<EventKey> {
                    let unresolved = || BackendError::UnresolvedReceiver {
                        message: sender.clone(),
                        receiver: receiver.clone(),
                    };
                    let key: EventKey = receiver.parse().map_err(|_| unresolved())?;
                    modules
                        .get(&key.module)
                        .filter(|m| m.events(EventKind::Receiver).contains_key(&key.event))
                        .ok_or_else(unresolved)?;
                    Ok(key)
                })
                .collect::<Result<Vec<_>>>()?;

            dispatchers.push(Dispatcher { sender: key, params, receivers });
        }
        Ok(Self { modules, dispatchers })
    }

    /// Modules in declaration order.
    pub fn modules(&self) -> impl DoubleEndedIterator<Item = (&'a str, &'a Module)> + '_ {
        self.modules.iter()
    }

    /// Dispatchers in document order.
    pub fn dispatchers(&self) -> &[Dispatcher<'a>] { &self.dispatchers }

    /// Init hooks in module declaration order.
    pub fn inits(&self) -> impl Iterator<Item = &'a Hook> + '_ {
        self.modules.iter().filter_map(|(_, m)| m.init.as_ref())
    }

    /// Final hooks in reverse module declaration order.
    pub fn finals(&self) -> impl Iterator<Item = &'a Hook> + '_ {
        self.modules.iter().rev().filter_map(|(_, m)| m.final_hook.as_ref())
    }
}
