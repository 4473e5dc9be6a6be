//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HeadlessContextFactory` / `HeadlessAudioContext`: timer-driven audio
//!   output with `symphonia` container decoding
//! - `SqliteKeyValueStore`: SQLite-backed persistence for the decoded-audio cache
//! - `HostInteractionSource`: gesture registry the host shell dispatches into
//!
//! Speech synthesis has no portable desktop engine; hosts bring their own
//! `SpeechSynthesizer`.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{HeadlessContextFactory, SqliteKeyValueStore};
//! use core_playback::PlaybackManager;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteKeyValueStore::new("narration.db".into()).await.unwrap();
//!     let manager = PlaybackManager::builder()
//!         .audio_factory(Arc::new(HeadlessContextFactory::new()))
//!         .store(Arc::new(store))
//!         .build()
//!         .unwrap();
//! }
//! ```

mod audio;
mod interaction;
mod storage;

pub use audio::{decode_container, HeadlessAudioContext, HeadlessContextFactory};
pub use interaction::HostInteractionSource;
pub use storage::SqliteKeyValueStore;
