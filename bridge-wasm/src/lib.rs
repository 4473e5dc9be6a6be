//! WebAssembly Bridge Implementations
//!
//! This crate provides WebAssembly-compatible implementations of the bridge traits
//! defined in `bridge-traits`. These implementations use browser APIs through
//! `web-sys` and `wasm-bindgen`.
//!
//! # Platform Support
//!
//! This crate is designed exclusively for the `wasm32-unknown-unknown` target.
//! It compiles to an empty crate elsewhere.
//!
//! # Implementations
//!
//! - `WebAudioContextFactory`: Web Audio `AudioContext` output
//! - `WebSpeechSynthesizer`: `window.speechSynthesis`
//! - `LocalStorageKeyValueStore`: base64 values in `localStorage`
//! - `DomInteractionSource`: `touchstart`/`click`/`keydown` listeners
//!
//! # Examples
//!
//! ```ignore
//! use bridge_wasm::{build_wasm_bridges, WasmBridgeConfig};
//!
//! let bridges = build_wasm_bridges(WasmBridgeConfig::default())?;
//! let speech = bridges.speech.expect("speech synthesis");
//! ```

#![cfg(target_arch = "wasm32")]
#![warn(missing_docs)]

pub mod audio;
pub mod bootstrap;
pub mod error;
pub mod interaction;
pub mod speech;
pub mod storage;

// Re-export commonly used types
pub use audio::{WebAudioContext, WebAudioContextFactory};
pub use bootstrap::{build_wasm_bridges, WasmBridgeConfig, WasmBridgeSet};
pub use error::{WasmError, WasmResult};
pub use interaction::DomInteractionSource;
pub use speech::WebSpeechSynthesizer;
pub use storage::LocalStorageKeyValueStore;
