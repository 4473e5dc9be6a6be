//! # Unlock Coordinator
//!
//! Many platforms keep audio dormant until a user gesture. The coordinator
//! listens for the first touch, click or key press, then unlocks the output
//! context and speaks a silent warm-up utterance so both the buffer path and
//! the speech path hold audio focus. It runs once and deregisters from all
//! three triggers.

use crate::error::Result;
use crate::narration::NarrationSequencer;
use crate::output::AudioOutput;
use crate::runtime;
use bridge_traits::{InteractionHandler, InteractionKind, InteractionSource, ListenerId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// One-shot binding between first user interaction and audio unlock.
pub struct UnlockCoordinator {
    fired: Arc<AtomicBool>,
    listeners: Arc<Mutex<Vec<ListenerId>>>,
    source: Weak<dyn InteractionSource>,
}

impl UnlockCoordinator {
    /// Register listeners for every [`InteractionKind`].
    ///
    /// Either capability may be absent; the corresponding half of the unlock
    /// is skipped. If a registration fails, listeners added so far are removed.
    pub fn install(
        source: Arc<dyn InteractionSource>,
        output: Option<Arc<AudioOutput>>,
        narration: Option<Arc<NarrationSequencer>>,
    ) -> Result<Self> {
        let fired = Arc::new(AtomicBool::new(false));
        let listeners = Arc::new(Mutex::new(Vec::new()));
        let weak_source = Arc::downgrade(&source);

        let handler: InteractionHandler = {
            let fired = Arc::clone(&fired);
            let listeners = Arc::clone(&listeners);
            let weak_source = weak_source.clone();

            Arc::new(move |kind: InteractionKind| {
                if fired.swap(true, Ordering::SeqCst) {
                    return;
                }

                info!(trigger = kind.event_name(), "First user interaction, unlocking audio");
                remove_all(&weak_source, &listeners);

                let output = output.clone();
                let narration = narration.clone();
                runtime::spawn(async move {
                    if let Some(output) = output {
                        output.unlock().await;
                    }
                    if let Some(narration) = narration {
                        narration.warm_up().await;
                    }
                });
            })
        };

        for kind in InteractionKind::ALL {
            match source.add_listener(kind, Arc::clone(&handler)) {
                Ok(id) => listeners.lock().push(id),
                Err(err) => {
                    remove_all(&weak_source, &listeners);
                    return Err(err.into());
                }
            }
        }

        // A gesture may have arrived before every id was recorded.
        if fired.load(Ordering::SeqCst) {
            remove_all(&weak_source, &listeners);
        }

        debug!("Unlock coordinator installed");
        Ok(Self {
            fired,
            listeners,
            source: weak_source,
        })
    }

    /// Whether the unlock has been triggered.
    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Remove the listeners without unlocking.
    pub fn uninstall(&self) {
        remove_all(&self.source, &self.listeners);
    }
}

impl std::fmt::Debug for UnlockCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnlockCoordinator")
            .field("fired", &self.has_fired())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}

fn remove_all(source: &Weak<dyn InteractionSource>, listeners: &Mutex<Vec<ListenerId>>) {
    let ids = std::mem::take(&mut *listeners.lock());
    if let Some(source) = source.upgrade() {
        for id in ids {
            source.remove_listener(id);
        }
    }
}
