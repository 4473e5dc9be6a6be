//! Convenience helpers for wiring all wasm bridge implementations together.
//!
//! Host shells can use [`build_wasm_bridges`] to construct every browser
//! capability the narration core consumes without repetitive glue code. The
//! result mirrors the role that the `bridge-desktop` crate plays for native
//! targets.

use std::sync::Arc;

use bridge_traits::{
    error::Result as BridgeResult, AudioContextFactory, InteractionSource, KeyValueStore,
    SpeechSynthesizer,
};
use tracing::warn;

use crate::{
    audio::WebAudioContextFactory,
    interaction::DomInteractionSource,
    speech::{WebSpeechSynthesizer, DEFAULT_VOICES_TIMEOUT_MS},
    storage::LocalStorageKeyValueStore,
};

/// Configuration for [`build_wasm_bridges`].
#[derive(Debug, Clone)]
pub struct WasmBridgeConfig {
    /// Key prefix for `localStorage` entries.
    pub namespace: String,
    /// Upper bound on waiting for the lazily populated voice list.
    pub voices_timeout_ms: u32,
}

impl WasmBridgeConfig {
    /// Create a config using the provided storage namespace.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            voices_timeout_ms: DEFAULT_VOICES_TIMEOUT_MS,
        }
    }

    /// Override the voice list timeout.
    pub fn with_voices_timeout(mut self, timeout_ms: u32) -> Self {
        self.voices_timeout_ms = timeout_ms;
        self
    }
}

impl Default for WasmBridgeConfig {
    fn default() -> Self {
        Self::new("narration")
    }
}

/// Browser capabilities ready for injection into the playback core.
///
/// Speech and storage are optional: some embedded browsers ship without
/// `speechSynthesis`, and `localStorage` throws in some private modes.
pub struct WasmBridgeSet {
    /// Web Audio output contexts.
    pub audio_factory: Arc<dyn AudioContextFactory>,
    /// `speechSynthesis`, when the browser has it.
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
    /// `localStorage`, when accessible.
    pub store: Option<Arc<dyn KeyValueStore>>,
    /// Gesture listeners on `window`.
    pub interaction: Arc<dyn InteractionSource>,
}

/// Build the default wasm bridge stack.
pub fn build_wasm_bridges(config: WasmBridgeConfig) -> BridgeResult<WasmBridgeSet> {
    let audio_factory: Arc<dyn AudioContextFactory> = Arc::new(WebAudioContextFactory::new());
    let interaction: Arc<dyn InteractionSource> = Arc::new(DomInteractionSource::new()?);

    let speech = match WebSpeechSynthesizer::new() {
        Ok(speech) => Some(
            Arc::new(speech.with_voices_timeout(config.voices_timeout_ms))
                as Arc<dyn SpeechSynthesizer>,
        ),
        Err(err) => {
            warn!(error = %err, "Speech synthesis unavailable");
            None
        }
    };

    let store = match LocalStorageKeyValueStore::new(&config.namespace) {
        Ok(store) => Some(Arc::new(store) as Arc<dyn KeyValueStore>),
        Err(err) => {
            warn!(error = %err, "localStorage unavailable, decoded audio will not be cached");
            None
        }
    };

    Ok(WasmBridgeSet {
        audio_factory,
        speech,
        store,
        interaction,
    })
}
