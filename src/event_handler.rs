use std::collections::HashMap;
use std::sync::Arc;

use crate::context::Context;
use crate::event::Event;
use crate::event::Kind;

/// Reacts to one decoded event. Runs on the dispatch loop, so anything slow
/// belongs in [`Context::spawn`].
pub trait EventHandler: Send + Sync {
    fn on_event(&self, ctx: &mut Context<'_>, event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&mut Context<'_>, &Event) + Send + Sync,
{
    fn on_event(&self, ctx: &mut Context<'_>, event: &Event) {
        self(ctx, event)
    }
}

/// Handlers keyed by event code, invoked in registration order. CTCP verbs
/// live in their own table.
#[derive(Clone, Default)]
pub struct Handlers {
    table: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    ctcp: HashMap<String, Vec<Arc<dyn EventHandler>>>,
}

impl Handlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on<F>(&mut self, code: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>, &Event) + Send + Sync + 'static,
    {
        self.add(code, Arc::new(handler))
    }

    pub fn on_ctcp<F>(&mut self, verb: &str, handler: F) -> &mut Self
    where
        F: Fn(&mut Context<'_>, &Event) + Send + Sync + 'static,
    {
        self.add_ctcp(verb, Arc::new(handler))
    }

    pub fn add(&mut self, code: &str, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.table.entry(code.to_string()).or_default().push(handler);
        self
    }

    pub fn add_ctcp(&mut self, verb: &str, handler: Arc<dyn EventHandler>) -> &mut Self {
        self.ctcp.entry(verb.to_string()).or_default().push(handler);
        self
    }

    /// Appends every handler of `other` after the ones already registered.
    pub fn extend(&mut self, other: Handlers) {
        for (code, handlers) in other.table {
            self.table.entry(code).or_default().extend(handlers);
        }
        for (verb, handlers) in other.ctcp {
            self.ctcp.entry(verb).or_default().extend(handlers);
        }
    }

    /// The handlers for `event`, picked from the table matching its kind.
    pub fn get(&self, event: &Event) -> &[Arc<dyn EventHandler>] {
        let table = match event.kind {
            Kind::Ctcp => &self.ctcp,
            _ => &self.table,
        };
        table.get(&event.code).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.table.values().chain(self.ctcp.values()).map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
