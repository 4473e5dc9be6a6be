//! # Event Bus System
//!
//! Provides an event-driven view of the narration engine using
//! `tokio::sync::broadcast`. Hosts subscribe to follow narration progress
//! (chunk started/failed, job finished) and the audio output lifecycle
//! (context created, unlocked, sessions started/ended) without polling.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   emit    ┌───────────┐
//! │ NarrationSequencer├─────────>│           │   subscribe   ┌────────────┐
//! └──────────────────┘           │ EventBus  ├──────────────>│ Subscriber │
//! ┌──────────────────┐   emit    │ (broadcast│               └────────────┘
//! │ AudioOutput      ├──────────>│  channel) │
//! └──────────────────┘           └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CoreEvent, EventBus, NarrationEvent};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let bus = EventBus::new(32);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(CoreEvent::Narration(NarrationEvent::ChunkStarted { job_id: 1, index: 0 }))
//!     .ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.description(), "Narration chunk started");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: the subscriber fell behind and missed `n`
//!   events; it can keep receiving.
//! - **`RecvError::Closed`**: every sender was dropped.
//!
//! Emitting with no subscribers returns an error that producers ignore;
//! events are informational only and never drive playback.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Chunked text narration events
    Narration(NarrationEvent),
    /// Audio output context and buffer playback events
    Output(OutputEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Narration(e) => e.description(),
            CoreEvent::Output(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Output(OutputEvent::SessionFailed { .. }) => EventSeverity::Error,
            CoreEvent::Narration(NarrationEvent::ChunkFailed { .. }) => EventSeverity::Warning,
            CoreEvent::Output(OutputEvent::DecoderFallback { .. }) => EventSeverity::Warning,
            CoreEvent::Narration(NarrationEvent::Started { .. })
            | CoreEvent::Narration(NarrationEvent::Finished { .. })
            | CoreEvent::Output(OutputEvent::Unlocked) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Narration Events
// ============================================================================

/// Events emitted while a narration job plays its chunks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum NarrationEvent {
    /// A job was accepted and segmented.
    Started {
        job_id: u64,
        chunk_count: usize,
        /// Resolved locale tag (e.g. "hi-IN").
        locale: String,
        /// Selected voice name, `None` for the platform default.
        voice: Option<String>,
    },
    /// A chunk was handed to the speech engine.
    ChunkStarted { job_id: u64, index: usize },
    /// The speech engine reported an error; the chunk is skipped.
    ChunkFailed {
        job_id: u64,
        index: usize,
        reason: String,
    },
    /// The job terminated and its completion callback fired.
    Finished {
        job_id: u64,
        /// Chunks that were handed to the engine and completed (ended or skipped).
        chunks_played: usize,
        /// Whether the job ended because of a stop or a newer job.
        cancelled: bool,
    },
}

impl NarrationEvent {
    fn description(&self) -> &str {
        match self {
            NarrationEvent::Started { .. } => "Narration started",
            NarrationEvent::ChunkStarted { .. } => "Narration chunk started",
            NarrationEvent::ChunkFailed { .. } => "Narration chunk failed",
            NarrationEvent::Finished { .. } => "Narration finished",
        }
    }
}

// ============================================================================
// Output Events
// ============================================================================

/// Events related to the audio output context and buffer playback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum OutputEvent {
    /// A new output context was created (first use or after it closed).
    ContextCreated { sample_rate: u32 },
    ContextResumed,
    ContextSuspended,
    /// The output was unlocked after a user gesture.
    Unlocked,
    /// A decoded buffer started playing.
    SessionStarted {
        session_id: u64,
        frames: usize,
        sample_rate: u32,
    },
    /// A session reached its natural end.
    SessionEnded { session_id: u64 },
    /// A session was stopped or superseded before its end.
    SessionStopped { session_id: u64 },
    /// A source could not be started; completion was signalled immediately.
    SessionFailed { message: String },
    /// The container decoder rejected a payload and the manual PCM path was used.
    DecoderFallback { reason: String },
}

impl OutputEvent {
    fn description(&self) -> &str {
        match self {
            OutputEvent::ContextCreated { .. } => "Audio context created",
            OutputEvent::ContextResumed => "Audio context resumed",
            OutputEvent::ContextSuspended => "Audio context suspended",
            OutputEvent::Unlocked => "Audio output unlocked",
            OutputEvent::SessionStarted { .. } => "Playback session started",
            OutputEvent::SessionEnded { .. } => "Playback session ended",
            OutputEvent::SessionStopped { .. } => "Playback session stopped",
            OutputEvent::SessionFailed { .. } => "Playback session failed",
            OutputEvent::DecoderFallback { .. } => "Container decode fell back to manual PCM",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to events.
///
/// Cloning the bus shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// Subscribers falling behind by more than `capacity` events receive
    /// `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// if there are none.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// A wrapper around `broadcast::Receiver` with optional filtering.
///
/// ```rust
/// use core_runtime::events::{CoreEvent, EventBus, EventStream};
///
/// let bus = EventBus::default();
/// let narration_only = EventStream::new(bus.subscribe())
///     .filter(|event| matches!(event, CoreEvent::Narration(_)));
/// ```
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    /// Only events matching `predicate` are returned by `recv()`.
    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    /// Receives the next event that passes the filter.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;

            let Some(filter) = &self.filter else {
                return Ok(event);
            };

            if filter(&event) {
                return Ok(event);
            }
        }
    }

    /// Attempts to receive an event without waiting.
    ///
    /// Returns `None` if no matching event is currently available.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    let Some(filter) = &self.filter else {
                        return Some(Ok(event));
                    };

                    if filter(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}
