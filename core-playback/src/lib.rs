//! # Narration Playback Core
//!
//! Plays long-form text and synthesized speech audio reliably over platform
//! audio backends that may be locked, suspended, or partially failing.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`codec`]: base64 and PCM decoding with a container path and a manual fallback
//! - [`output`]: lazy output context lifecycle with a single playback session
//! - [`narration`]: sentence segmentation, voice selection and chunked speech
//! - [`unlock`]: one-shot unlock on first user interaction
//! - [`cache`]: best-effort persistence of decoded audio
//! - [`PlaybackManager`]: the object hosts hold, tying the above together
//!
//! Platform capabilities come from `bridge-traits` implementations
//! (`bridge-desktop`, `bridge-wasm`).

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod narration;
pub mod output;
pub mod unlock;

mod runtime;

pub use cache::AudioCache;
pub use codec::{decode_base64, decode_samples, wrap_pcm_as_container, PcmFormat};
pub use config::NarrationConfig;
pub use error::{PlaybackError, Result};
pub use manager::{PlaybackManager, PlaybackManagerBuilder, PlaybackStatus};
pub use narration::{NarrationSequencer, NarrationStatus};
pub use output::AudioOutput;
pub use unlock::UnlockCoordinator;
