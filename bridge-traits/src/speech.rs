//! Speech synthesis bridge trait.
//!
//! Abstracts a platform text-to-speech engine (Web Speech API, Android
//! `TextToSpeech`, `AVSpeechSynthesizer`, speech-dispatcher). The engine speaks
//! one utterance at a time from a queue and reports each utterance's end or
//! failure; the core narration sequencer feeds it one chunk at a time.

use crate::{error::Result, platform::PlatformSendSync};
use serde::{Deserialize, Serialize};

/// A synthesis voice advertised by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Display name (e.g. "Google हिन्दी", "Microsoft Ravi").
    pub name: String,
    /// BCP-47 locale tag as reported by the platform (e.g. "hi-IN").
    pub lang: String,
    /// Whether synthesis happens on-device.
    #[serde(default)]
    pub local_service: bool,
    /// Whether this is the platform's default voice.
    #[serde(default)]
    pub default: bool,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
            local_service: false,
            default: false,
        }
    }
}

/// Parameters for a single utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    /// Locale tag the engine should synthesize in.
    pub locale: String,
    /// Concrete voice, or `None` for the platform default.
    pub voice: Option<Voice>,
    /// Speaking rate multiplier (1.0 = normal).
    pub rate: f32,
    /// Pitch multiplier (1.0 = neutral).
    pub pitch: f32,
    /// Volume in `0.0..=1.0`.
    pub volume: f32,
}

impl Utterance {
    pub fn new(text: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            locale: locale.into(),
            voice: None,
            rate: 1.0,
            pitch: 1.0,
            volume: 1.0,
        }
    }

    pub fn with_voice(mut self, voice: Option<Voice>) -> Self {
        self.voice = voice;
        self
    }

    pub fn with_rate(mut self, rate: f32) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_pitch(mut self, pitch: f32) -> Self {
        self.pitch = pitch;
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume;
        self
    }
}

/// How an utterance finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UtteranceOutcome {
    /// The engine reached the end of the utterance.
    Ended,
    /// The engine reported an error (including `canceled`/`interrupted`).
    Failed { reason: String },
}

impl UtteranceOutcome {
    pub fn is_ended(&self) -> bool {
        matches!(self, UtteranceOutcome::Ended)
    }
}

/// Platform text-to-speech engine.
///
/// `speak` resolves once the platform fires the utterance's end or error
/// event. After [`cancel`](SpeechSynthesizer::cancel), in-flight `speak` calls
/// must still resolve (typically with [`UtteranceOutcome::Failed`]).
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SpeechSynthesizer: PlatformSendSync {
    /// List available voices. Platforms that populate the list lazily should
    /// wait for it to become available (bounded by their own timeout).
    async fn voices(&self) -> Result<Vec<Voice>>;

    /// Queue an utterance and wait for it to end or fail.
    ///
    /// Returns `Err` only when the utterance could not be queued at all.
    async fn speak(&self, utterance: Utterance) -> Result<UtteranceOutcome>;

    /// Clear the synthesis queue, interrupting the current utterance.
    fn cancel(&self);

    fn pause(&self);

    fn resume(&self);

    /// Whether an utterance is currently being spoken (paused counts as speaking).
    fn is_speaking(&self) -> bool;

    fn is_paused(&self) -> bool;
}
