//! # Audio Output Lifecycle
//!
//! Owns the process-wide output context and the single active playback
//! session.
//!
//! ## Context States
//!
//! ```text
//!  (none) ──first use──> Suspended <──pause── Running
//!     ^                      │ resume/play ───^  │
//!     └──────recreate──── Closed <──platform─────┘
//! ```
//!
//! The context is created lazily by the host's [`AudioContextFactory`] and
//! recreated on next use after the platform closes it. Starting a session
//! always tears down the previous one; completion callbacks fire at most once
//! and never after a stop.

use crate::error::Result;
use bridge_traits::{
    AudioBuffer, AudioContext, AudioContextFactory, AudioSourceHandle, CompletionCallback,
    ContextState,
};
use core_runtime::events::{CoreEvent, EventBus, OutputEvent};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

type CallbackSlot = Arc<Mutex<Option<CompletionCallback>>>;

struct ActiveSession {
    id: u64,
    /// `None` until `start_source` has returned.
    source: Option<Box<dyn AudioSourceHandle>>,
}

/// Output context owner with a single playback slot.
pub struct AudioOutput {
    factory: Arc<dyn AudioContextFactory>,
    context: Mutex<Option<Arc<dyn AudioContext>>>,
    session: Arc<Mutex<Option<ActiveSession>>>,
    next_session_id: AtomicU64,
    /// Bumped by every `play` and `stop`; a `play` that observes a newer
    /// generation after resuming the context was superseded.
    generation: AtomicU64,
    unlock_frames: usize,
    events: Option<EventBus>,
}

impl AudioOutput {
    pub fn new(factory: Arc<dyn AudioContextFactory>, unlock_frames: usize) -> Self {
        Self {
            factory,
            context: Mutex::new(None),
            session: Arc::new(Mutex::new(None)),
            next_session_id: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            unlock_frames: unlock_frames.max(1),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Return the live context, creating one if none exists or the previous
    /// one was closed. The platform's default sample rate is kept.
    pub fn context(&self) -> Result<Arc<dyn AudioContext>> {
        let mut slot = self.context.lock();

        if let Some(context) = slot.as_ref() {
            if context.state() != ContextState::Closed {
                return Ok(Arc::clone(context));
            }
            debug!("Output context was closed, recreating");
        }

        let context = self.factory.create_context()?;
        let sample_rate = context.sample_rate();
        info!(sample_rate, "Created audio output context");
        emit(&self.events, OutputEvent::ContextCreated { sample_rate });

        *slot = Some(Arc::clone(&context));
        Ok(context)
    }

    /// The current context, without creating one. Closed contexts count as absent.
    pub fn current_context(&self) -> Option<Arc<dyn AudioContext>> {
        self.context
            .lock()
            .as_ref()
            .filter(|context| context.state() != ContextState::Closed)
            .map(Arc::clone)
    }

    /// State of the current context, `None` before first use or after close.
    pub fn state(&self) -> Option<ContextState> {
        self.current_context().map(|context| context.state())
    }

    /// Id of the active playback session, if any.
    pub fn active_session(&self) -> Option<u64> {
        self.session.lock().as_ref().map(|session| session.id)
    }

    /// Grant audio focus after a user gesture.
    ///
    /// Resumes a suspended context (failures are logged) and then always
    /// starts a near-zero-length silent buffer, which some mobile platforms
    /// require before they produce any sound.
    pub async fn unlock(&self) {
        let context = match self.context() {
            Ok(context) => context,
            Err(err) => {
                warn!(error = %err, "Cannot unlock audio output");
                return;
            }
        };

        self.resume_context(context.as_ref()).await;

        let silent = match AudioBuffer::silent(1, self.unlock_frames, context.sample_rate()) {
            Ok(buffer) => Arc::new(buffer),
            Err(err) => {
                warn!(error = %err, "Cannot build unlock buffer");
                return;
            }
        };

        // Dropping the handle leaves the silent source playing out.
        match context.start_source(silent, Box::new(|| {})) {
            Ok(_source) => {
                debug!(frames = self.unlock_frames, "Audio output unlocked");
                emit(&self.events, OutputEvent::Unlocked);
            }
            Err(err) => warn!(error = %err, "Silent unlock buffer failed to start"),
        }
    }

    /// Play `buffer`, replacing any active session.
    ///
    /// A suspended context is resumed first; if resuming fails the start is
    /// attempted anyway. `on_ended` fires once on natural completion, or
    /// immediately when the source cannot be started. It is dropped without
    /// firing if the session is stopped or superseded.
    ///
    /// Returns the new session id when a source was started.
    pub async fn play(&self, buffer: Arc<AudioBuffer>, on_ended: CompletionCallback) -> Option<u64> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.stop_session();

        let context = match self.context() {
            Ok(context) => context,
            Err(err) => {
                warn!(error = %err, "No output context, signalling completion");
                emit(
                    &self.events,
                    OutputEvent::SessionFailed {
                        message: err.to_string(),
                    },
                );
                on_ended();
                return None;
            }
        };

        self.resume_context(context.as_ref()).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Playback superseded while resuming output");
            return None;
        }

        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = self
            .session
            .lock()
            .replace(ActiveSession { id, source: None });
        if let Some(previous) = previous {
            self.teardown(previous);
        }

        let frames = buffer.length();
        let sample_rate = buffer.sample_rate();
        let callback: CallbackSlot = Arc::new(Mutex::new(Some(on_ended)));
        let ended = self.ended_callback(id, Arc::clone(&callback));

        match context.start_source(buffer, ended) {
            Ok(source) => {
                let orphan = {
                    let mut slot = self.session.lock();
                    match slot.as_mut() {
                        Some(session) if session.id == id => {
                            session.source = Some(source);
                            None
                        }
                        // Ended synchronously or stopped during start.
                        _ => Some(source),
                    }
                };
                if let Some(mut source) = orphan {
                    source.detach_ended();
                    let _ = source.stop();
                    source.disconnect();
                    debug!(session_id = id, "Session finished before start was recorded");
                    return Some(id);
                }

                info!(session_id = id, frames, sample_rate, "Playback session started");
                emit(
                    &self.events,
                    OutputEvent::SessionStarted {
                        session_id: id,
                        frames,
                        sample_rate,
                    },
                );
                Some(id)
            }
            Err(err) => {
                {
                    let mut slot = self.session.lock();
                    if slot.as_ref().map(|session| session.id) == Some(id) {
                        slot.take();
                    }
                }

                warn!(session_id = id, error = %err, "Audio source failed to start, signalling completion");
                emit(
                    &self.events,
                    OutputEvent::SessionFailed {
                        message: err.to_string(),
                    },
                );

                let on_ended = callback.lock().take();
                if let Some(on_ended) = on_ended {
                    on_ended();
                }
                None
            }
        }
    }

    /// Stop the active session without firing its completion callback and
    /// invalidate any `play` still waiting on a context resume.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.stop_session();
    }

    /// Suspend a running context. Session state is untouched.
    pub async fn pause(&self) {
        let Some(context) = self.current_context() else {
            return;
        };

        if context.state() != ContextState::Running {
            return;
        }

        match context.suspend().await {
            Ok(()) => {
                debug!("Output context suspended");
                emit(&self.events, OutputEvent::ContextSuspended);
            }
            Err(err) => warn!(error = %err, "Failed to suspend output context"),
        }
    }

    /// Resume a suspended context. Session state is untouched.
    pub async fn resume(&self) {
        if let Some(context) = self.current_context() {
            self.resume_context(context.as_ref()).await;
        }
    }

    async fn resume_context(&self, context: &dyn AudioContext) {
        if context.state() != ContextState::Suspended {
            return;
        }

        match context.resume().await {
            Ok(()) => {
                debug!("Output context resumed");
                emit(&self.events, OutputEvent::ContextResumed);
            }
            Err(err) => warn!(error = %err, "Failed to resume output context"),
        }
    }

    fn stop_session(&self) {
        let session = self.session.lock().take();
        if let Some(session) = session {
            self.teardown(session);
        }
    }

    fn teardown(&self, session: ActiveSession) {
        if let Some(mut source) = session.source {
            source.detach_ended();
            if let Err(err) = source.stop() {
                debug!(session_id = session.id, error = %err, "Source already stopped");
            }
            source.disconnect();
        }

        debug!(session_id = session.id, "Playback session stopped");
        emit(
            &self.events,
            OutputEvent::SessionStopped {
                session_id: session.id,
            },
        );
    }

    /// Completion wrapper that only reports if `id` is still the active session.
    fn ended_callback(&self, id: u64, callback: CallbackSlot) -> CompletionCallback {
        let slot = Arc::clone(&self.session);
        let events = self.events.clone();

        Box::new(move || {
            let finished = {
                let mut slot = slot.lock();
                match slot.as_ref() {
                    Some(session) if session.id == id => slot.take(),
                    _ => None,
                }
            };

            if finished.is_none() {
                return;
            }

            debug!(session_id = id, "Playback session ended");
            emit(&events, OutputEvent::SessionEnded { session_id: id });

            let on_ended = callback.lock().take();
            if let Some(on_ended) = on_ended {
                on_ended();
            }
        })
    }
}

impl std::fmt::Debug for AudioOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioOutput")
            .field("state", &self.state())
            .field("active_session", &self.active_session())
            .finish()
    }
}

fn emit(events: &Option<EventBus>, event: OutputEvent) {
    if let Some(bus) = events {
        let _ = bus.emit(CoreEvent::Output(event));
    }
}
