//! # Eventing
//!
//! Ordered, synchronous publish/subscribe keyed by event name.
//!
//! - Handlers run in registration order, on the caller's stack, before
//!   `trigger` returns.
//! - Registering the same closure twice runs it twice.
//! - Triggering an event nobody listens to is not an error: it logs the
//!   `handler_not_found` diagnostic at info level and returns.
//! - Handlers may register, remove or trigger events while running. The set of
//!   handlers for one `trigger` call is fixed when the call starts, so a
//!   handler added mid-trigger first runs on the next trigger. A handler that
//!   triggers its own event recurses.

use crate::diagnostics::Diagnostics;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::info;

/// Fired by `Model::set` after every merge.
pub const CHANGE: &str = "change";
/// Fired after a successful fetch.
pub const FETCH: &str = "fetch";
/// Fired after a successful save.
pub const SAVE: &str = "save";
/// Fired for every locally detected failure.
pub const ERROR: &str = "error";

pub type Callback = Rc<dyn Fn()>;

/// Identifies one registration, for removing it again with [`Eventing::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Abstract interface for an eventing system.
pub trait Eventing {
    /// Appends `callback` to the handlers of `event`.
    fn on(&self, event: &str, callback: Callback) -> ListenerId;

    /// Removes one registration. Returns false if it was already gone.
    fn off(&self, event: &str, id: ListenerId) -> bool;

    /// Runs every handler registered for `event`, in order.
    fn trigger(&self, event: &str);

    /// Number of handlers currently registered for `event`.
    fn handler_count(&self, event: &str) -> usize;
}

/// The default [`Eventing`] implementation.
pub struct Events {
    handlers: RefCell<HashMap<String, Vec<(ListenerId, Callback)>>>,
    next_id: Cell<u64>,
    diagnostics: Rc<Diagnostics>,
}

impl Events {
    pub fn new() -> Self {
        Self::with_diagnostics(Rc::new(Diagnostics::default()))
    }

    pub fn with_diagnostics(diagnostics: Rc<Diagnostics>) -> Self {
        Self {
            handlers: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            diagnostics,
        }
    }
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Events {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.borrow();
        let mut counts: Vec<(&str, usize)> = handlers
            .iter()
            .map(|(name, list)| (name.as_str(), list.len()))
            .collect();
        counts.sort();
        f.debug_struct("Events").field("handlers", &counts).finish()
    }
}

impl Eventing for Events {
    fn on(&self, event: &str, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.handlers
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    fn off(&self, event: &str, id: ListenerId) -> bool {
        let mut handlers = self.handlers.borrow_mut();
        let Some(list) = handlers.get_mut(event) else {
            return false;
        };
        let before = list.len();
        list.retain(|(registered, _)| *registered != id);
        before != list.len()
    }

    fn trigger(&self, event: &str) {
        // Cloned so handlers can touch the bus without a live borrow.
        let callbacks: Vec<Callback> = self
            .handlers
            .borrow()
            .get(event)
            .map(|list| list.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        if callbacks.is_empty() {
            info!(event, "{}", self.diagnostics.handler_not_found);
            return;
        }

        for callback in callbacks {
            callback();
        }
    }

    fn handler_count(&self, event: &str) -> usize {
        self.handlers
            .borrow()
            .get(event)
            .map(Vec::len)
            .unwrap_or(0)
    }
}
