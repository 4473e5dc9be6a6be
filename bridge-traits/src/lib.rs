//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the narration core and
//! platform-specific implementations. Each trait represents a capability the
//! core requires but that must be implemented differently per platform
//! (desktop, web, mobile).
//!
//! ## Traits
//!
//! ### Audio
//! - [`AudioContextFactory`](audio::AudioContextFactory) - Lazily creates output contexts
//! - [`AudioContext`](audio::AudioContext) - Output device: state, resume/suspend, sources, container decoding
//! - [`AudioSourceHandle`](audio::AudioSourceHandle) - A started buffer-backed source
//!
//! ### Speech
//! - [`SpeechSynthesizer`](speech::SpeechSynthesizer) - Text-to-speech engine with voice enumeration
//!
//! ### Storage & Input
//! - [`KeyValueStore`](storage::KeyValueStore) - Byte-oriented persistence for decoded audio
//! - [`InteractionSource`](interaction::InteractionSource) - First user gesture notifications
//!
//! ### Utilities
//! - [`LoggerSink`](logger::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Headless output, SQLite store |
//! | Web      | `bridge-wasm`       | ✅ Web Speech, Web Audio, localStorage |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Platform
//! implementations should convert platform-specific errors (JS exceptions,
//! SQLite errors, decoder errors) into `BridgeError` with actionable messages.
//!
//! ## Thread Safety
//!
//! On native targets every bridge trait requires `Send + Sync`. On `wasm32`
//! the bounds are relaxed through [`platform::PlatformSendSync`] because browser
//! objects live on the single event-loop thread.

pub mod audio;
pub mod error;
pub mod interaction;
pub mod logger;
pub mod platform;
pub mod speech;
pub mod storage;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioBuffer, AudioContext, AudioContextFactory, AudioSourceHandle, ContextState};
pub use interaction::{InteractionHandler, InteractionKind, InteractionSource, ListenerId};
pub use logger::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use platform::CompletionCallback;
pub use speech::{SpeechSynthesizer, Utterance, UtteranceOutcome, Voice};
pub use storage::KeyValueStore;
