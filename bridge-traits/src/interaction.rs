//! User-interaction source.
//!
//! Mobile browsers and some desktop shells refuse to start audio until the
//! user has interacted with the page. Hosts expose their first-gesture events
//! through [`InteractionSource`] so the core can unlock audio exactly once.

use crate::{error::Result, platform::PlatformSendSync};
use std::sync::Arc;

/// Kind of user gesture that can grant audio focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKind {
    TouchStart,
    Click,
    KeyDown,
}

impl InteractionKind {
    /// All gesture kinds, in registration order.
    pub const ALL: [InteractionKind; 3] = [
        InteractionKind::TouchStart,
        InteractionKind::Click,
        InteractionKind::KeyDown,
    ];

    /// DOM event name for this gesture.
    pub fn event_name(&self) -> &'static str {
        match self {
            InteractionKind::TouchStart => "touchstart",
            InteractionKind::Click => "click",
            InteractionKind::KeyDown => "keydown",
        }
    }
}

/// Identifier returned by [`InteractionSource::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Listener invoked for each matching gesture.
#[cfg(not(target_arch = "wasm32"))]
pub type InteractionHandler = Arc<dyn Fn(InteractionKind) + Send + Sync + 'static>;

#[cfg(target_arch = "wasm32")]
pub type InteractionHandler = Arc<dyn Fn(InteractionKind) + 'static>;

/// Registry of user-gesture listeners.
///
/// Implementations must allow a handler to remove listeners (including its
/// own) while it is being invoked.
pub trait InteractionSource: PlatformSendSync {
    fn add_listener(&self, kind: InteractionKind, handler: InteractionHandler)
        -> Result<ListenerId>;

    /// Remove a listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}
