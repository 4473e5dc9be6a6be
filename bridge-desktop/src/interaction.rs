//! Host-driven interaction source
//!
//! Desktop shells (tray apps, CLIs, embedding UIs) have no DOM gestures; they
//! forward their own "user did something" signals through
//! [`HostInteractionSource::dispatch`].

use bridge_traits::{
    error::Result,
    interaction::{InteractionHandler, InteractionKind, InteractionSource, ListenerId},
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

struct Registration {
    kind: InteractionKind,
    handler: InteractionHandler,
}

/// In-process listener registry.
#[derive(Default)]
pub struct HostInteractionSource {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, Registration>>,
}

impl HostInteractionSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a gesture to every listener registered for `kind`.
    ///
    /// Handlers run on the caller's thread, in registration order, outside
    /// the registry lock. Returns the number of handlers invoked.
    pub fn dispatch(&self, kind: InteractionKind) -> usize {
        let handlers: Vec<InteractionHandler> = self
            .listeners
            .lock()
            .values()
            .filter(|registration| registration.kind == kind)
            .map(|registration| registration.handler.clone())
            .collect();

        trace!(event = kind.event_name(), listeners = handlers.len(), "Dispatching interaction");
        for handler in &handlers {
            handler(kind);
        }
        handlers.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl InteractionSource for HostInteractionSource {
    fn add_listener(
        &self,
        kind: InteractionKind,
        handler: InteractionHandler,
    ) -> Result<ListenerId> {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners
            .lock()
            .insert(id, Registration { kind, handler });
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().remove(&id);
    }
}
