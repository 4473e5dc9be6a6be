//! DOM gesture listeners for the unlock coordinator.

use bridge_traits::{
    error::Result as BridgeResult,
    interaction::{InteractionHandler, InteractionKind, InteractionSource, ListenerId},
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::EventTarget;

use crate::error::{js_message, WasmError};

struct DomListener {
    kind: InteractionKind,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

/// Registers gesture listeners on a DOM event target (the window by default).
pub struct DomInteractionSource {
    target: EventTarget,
    next_id: Cell<u64>,
    listeners: RefCell<HashMap<ListenerId, DomListener>>,
}

impl DomInteractionSource {
    /// Listen on `window`.
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window().ok_or_else(|| WasmError::NotAvailable("window".into()))?;
        Ok(Self::for_target(window.into()))
    }

    /// Listen on an arbitrary element or document.
    pub fn for_target(target: EventTarget) -> Self {
        Self {
            target,
            next_id: Cell::new(0),
            listeners: RefCell::new(HashMap::new()),
        }
    }
}

impl InteractionSource for DomInteractionSource {
    fn add_listener(
        &self,
        kind: InteractionKind,
        handler: InteractionHandler,
    ) -> BridgeResult<ListenerId> {
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
            handler(kind);
        });

        self.target
            .add_event_listener_with_callback(kind.event_name(), closure.as_ref().unchecked_ref())
            .map_err(|err| WasmError::js("addEventListener", err))?;

        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .insert(id, DomListener { kind, closure });
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some(listener) = self.listeners.borrow_mut().remove(&id) else {
            return;
        };

        if let Err(err) = self.target.remove_event_listener_with_callback(
            listener.kind.event_name(),
            listener.closure.as_ref().unchecked_ref(),
        ) {
            tracing::debug!(error = %js_message(&err), "removeEventListener failed");
        }

        // The listener may be the one currently dispatching; release it once
        // the event loop has moved on.
        wasm_bindgen_futures::spawn_local(async move {
            drop(listener);
        });
    }
}
