//! # Playback Manager
//!
//! Single entry point owning the output lifecycle, the narration sequencer,
//! the decoded-audio cache and the unlock coordinator. Hosts build one
//! manager per page or process and inject it where playback is needed.
//!
//! ## Tracks
//!
//! Narration (text through the speech engine) and buffer playback (decoded
//! PCM through the output context) are independent tracks:
//!
//! - a new `speak` replaces the previous narration *and* stops the active
//!   buffer session
//! - a new `play*` replaces the previous buffer session only
//! - `stop` tears down both
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_playback::PlaybackManager;
//!
//! let manager = PlaybackManager::builder()
//!     .audio_factory(factory)
//!     .speech(speech)
//!     .store(store)
//!     .build()?;
//!
//! manager.speak("नमस्ते। आप कैसे हैं?", "hi", Box::new(|| println!("done")));
//! ```

use crate::cache::AudioCache;
use crate::codec::{decode_base64, DecodePath, FallbackDecoder};
use crate::config::NarrationConfig;
use crate::error::{PlaybackError, Result};
use crate::narration::{NarrationSequencer, NarrationStatus};
use crate::output::AudioOutput;
use crate::unlock::UnlockCoordinator;
use bridge_traits::{
    AudioBuffer, AudioContextFactory, CompletionCallback, ContextState, InteractionSource,
    KeyValueStore, SpeechSynthesizer,
};
use bytes::Bytes;
use core_runtime::events::{CoreEvent, EventBus, OutputEvent, Receiver};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Point-in-time view of both playback tracks.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackStatus {
    /// `None` before the output context is first used or after it closed.
    pub context_state: Option<ContextState>,
    /// Active buffer playback session id.
    pub session: Option<u64>,
    pub narration: Option<NarrationStatus>,
}

impl PlaybackStatus {
    pub fn is_idle(&self) -> bool {
        self.session.is_none() && self.narration.is_none()
    }
}

/// Narration and buffer playback coordinator.
pub struct PlaybackManager {
    config: Arc<NarrationConfig>,
    output: Option<Arc<AudioOutput>>,
    narration: Option<Arc<NarrationSequencer>>,
    cache: Option<AudioCache>,
    decoder: FallbackDecoder,
    events: EventBus,
    unlocker: Mutex<Option<UnlockCoordinator>>,
}

impl PlaybackManager {
    pub fn builder() -> PlaybackManagerBuilder {
        PlaybackManagerBuilder::default()
    }

    pub fn config(&self) -> &NarrationConfig {
        &self.config
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Subscribe to narration and output events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.events.subscribe()
    }

    /// Output lifecycle, when an audio factory was supplied.
    pub fn output(&self) -> Option<&Arc<AudioOutput>> {
        self.output.as_ref()
    }

    // ------------------------------------------------------------------------
    // Narration
    // ------------------------------------------------------------------------

    /// Narrate `text`, superseding any running narration and buffer session.
    ///
    /// `on_end` fires exactly once: when the last chunk finishes, when the
    /// job is stopped or superseded, or immediately if there is nothing to
    /// say or no speech engine.
    pub fn speak(&self, text: &str, language_code: &str, on_end: CompletionCallback) -> Option<u64> {
        if let Some(output) = &self.output {
            output.stop();
        }

        match &self.narration {
            Some(narration) => narration.speak(text, language_code, on_end),
            None => {
                debug!(
                    error = %PlaybackError::UnsupportedPlatform("no speech synthesizer".to_string()),
                    "Narration requested without speech capability"
                );
                on_end();
                None
            }
        }
    }

    // ------------------------------------------------------------------------
    // Buffer playback
    // ------------------------------------------------------------------------

    /// Play a decoded buffer, replacing the active session.
    ///
    /// Without an output capability `on_ended` fires immediately.
    pub async fn play(
        &self,
        buffer: impl Into<Arc<AudioBuffer>>,
        on_ended: CompletionCallback,
    ) -> Option<u64> {
        match &self.output {
            Some(output) => output.play(buffer.into(), on_ended).await,
            None => {
                debug!("Buffer playback requested without audio output");
                on_ended();
                None
            }
        }
    }

    /// Decode raw PCM with the container path, falling back to manual PCM.
    ///
    /// # Errors
    ///
    /// - [`PlaybackError::UnsupportedPlatform`] without an output capability
    /// - [`PlaybackError::InvalidFormat`] for an unusable configured format
    #[instrument(skip(self, pcm), fields(bytes = pcm.len()))]
    pub async fn decode_samples(&self, pcm: Bytes) -> Result<AudioBuffer> {
        let output = self.require_output()?;
        let format = self.config.pcm_format;
        format.validate()?;

        let context = output.context()?;
        let (buffer, path) = self
            .decoder
            .decode_with_path(pcm, context.as_ref(), format)
            .await?;

        if let DecodePath::Fallback { reason } = path {
            let _ = self
                .events
                .emit(CoreEvent::Output(OutputEvent::DecoderFallback { reason }));
        }

        debug!(frames = buffer.length(), sample_rate = buffer.sample_rate(), "Decoded samples");
        Ok(buffer)
    }

    /// Decode a base64 PCM payload and play it.
    ///
    /// # Errors
    ///
    /// Malformed base64 and decode errors are returned and `on_ended` is not
    /// invoked.
    pub async fn play_encoded(
        &self,
        payload: &str,
        on_ended: CompletionCallback,
    ) -> Result<Option<u64>> {
        let pcm = decode_base64(payload)?;
        let buffer = self.decode_samples(pcm).await?;
        Ok(self.play(buffer, on_ended).await)
    }

    /// Like [`play_encoded`](Self::play_encoded), serving the decoded buffer
    /// from the cache under `content_key` when possible and storing it after a
    /// fresh decode.
    pub async fn play_cached(
        &self,
        content_key: &str,
        payload: &str,
        on_ended: CompletionCallback,
    ) -> Result<Option<u64>> {
        if let Some(cache) = &self.cache {
            if let Some(buffer) = cache.get(content_key).await {
                return Ok(self.play(buffer, on_ended).await);
            }
        }

        let pcm = decode_base64(payload)?;
        let buffer = self.decode_samples(pcm).await?;

        if let Some(cache) = &self.cache {
            cache.put(content_key, &buffer).await;
        }

        Ok(self.play(buffer, on_ended).await)
    }

    /// Drop a cached buffer. No-op without a store.
    pub async fn evict_cached(&self, content_key: &str) {
        if let Some(cache) = &self.cache {
            cache.remove(content_key).await;
        }
    }

    // ------------------------------------------------------------------------
    // Global controls
    // ------------------------------------------------------------------------

    /// Stop narration and buffer playback. Safe to call when idle.
    pub fn stop(&self) {
        if let Some(narration) = &self.narration {
            narration.stop();
        }
        if let Some(output) = &self.output {
            output.stop();
        }
    }

    /// Suspend the output context and pause the speech engine.
    pub async fn pause(&self) {
        if let Some(output) = &self.output {
            output.pause().await;
        }
        if let Some(narration) = &self.narration {
            narration.pause();
        }
    }

    /// Resume the output context and the speech engine.
    pub async fn resume(&self) {
        if let Some(output) = &self.output {
            output.resume().await;
        }
        if let Some(narration) = &self.narration {
            narration.resume();
        }
    }

    /// Unlock audio output after a user gesture.
    pub async fn unlock(&self) {
        if let Some(output) = &self.output {
            output.unlock().await;
        }
    }

    /// Unlock output and warm up speech on the first interaction reported by
    /// `source`. Replaces a previously installed coordinator.
    pub fn install_unlock_coordinator(&self, source: Arc<dyn InteractionSource>) -> Result<()> {
        let coordinator =
            UnlockCoordinator::install(source, self.output.clone(), self.narration.clone())?;

        let previous = self.unlocker.lock().replace(coordinator);
        if let Some(previous) = previous {
            previous.uninstall();
        }
        Ok(())
    }

    /// Whether the installed coordinator has already unlocked audio.
    pub fn is_unlocked(&self) -> bool {
        self.unlocker
            .lock()
            .as_ref()
            .map(UnlockCoordinator::has_fired)
            .unwrap_or(false)
    }

    pub fn status(&self) -> PlaybackStatus {
        PlaybackStatus {
            context_state: self.output.as_ref().and_then(|output| output.state()),
            session: self.output.as_ref().and_then(|output| output.active_session()),
            narration: self.narration.as_ref().and_then(|narration| narration.status()),
        }
    }

    fn require_output(&self) -> Result<&Arc<AudioOutput>> {
        self.output.as_ref().ok_or_else(|| {
            PlaybackError::UnsupportedPlatform("no audio output available".to_string())
        })
    }
}

impl std::fmt::Debug for PlaybackManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackManager")
            .field("status", &self.status())
            .field("cache", &self.cache)
            .finish()
    }
}

/// Builder for [`PlaybackManager`].
///
/// Every capability is optional, but at least one of the audio factory and
/// the speech synthesizer must be supplied.
#[derive(Default)]
pub struct PlaybackManagerBuilder {
    audio_factory: Option<Arc<dyn AudioContextFactory>>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    store: Option<Arc<dyn KeyValueStore>>,
    events: Option<EventBus>,
    config: Option<NarrationConfig>,
}

impl PlaybackManagerBuilder {
    pub fn audio_factory(mut self, factory: Arc<dyn AudioContextFactory>) -> Self {
        self.audio_factory = Some(factory);
        self
    }

    pub fn speech(mut self, speech: Arc<dyn SpeechSynthesizer>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Enables the decoded-audio cache.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Share an existing event bus instead of creating one.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn config(mut self, config: NarrationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<PlaybackManager> {
        let config = self.config.unwrap_or_default();
        config.validate().map_err(PlaybackError::Config)?;

        if self.audio_factory.is_none() && self.speech.is_none() {
            return Err(PlaybackError::capability_missing(
                "AudioContextFactory | SpeechSynthesizer",
                "Provide an audio output factory, a speech synthesizer, or both",
            ));
        }

        let config = Arc::new(config);
        let events = self.events.unwrap_or_default();

        let output = self.audio_factory.map(|factory| {
            Arc::new(AudioOutput::new(factory, config.unlock_frames).with_events(events.clone()))
        });

        let narration = self.speech.map(|speech| {
            Arc::new(
                NarrationSequencer::new(speech, Arc::clone(&config)).with_events(events.clone()),
            )
        });

        let cache = self
            .store
            .map(|store| AudioCache::new(store, config.cache_namespace.clone()));

        info!(
            output = output.is_some(),
            speech = narration.is_some(),
            cache = cache.is_some(),
            "Playback manager ready"
        );

        Ok(PlaybackManager {
            config,
            output,
            narration,
            cache,
            decoder: FallbackDecoder::default(),
            events,
            unlocker: Mutex::new(None),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_a_capability() {
        let err = PlaybackManager::builder().build().unwrap_err();
        assert!(matches!(err, PlaybackError::CapabilityMissing { .. }));
    }

    #[test]
    fn status_is_idle_without_activity() {
        let status = PlaybackStatus {
            context_state: None,
            session: None,
            narration: None,
        };
        assert!(status.is_idle());
    }
}
