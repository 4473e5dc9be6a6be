//! # Narration Configuration
//!
//! Tunables for speech synthesis, voice resolution, PCM decoding and the
//! decoded-audio cache. Every field has a serde default so hosts can ship a
//! partial JSON document.

use crate::codec::PcmFormat;
use crate::error::{PlaybackError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Narration engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationConfig {
    /// Speaking rate applied to every chunk.
    ///
    /// Slightly below normal for intelligibility of long-form text.
    ///
    /// Default: 0.9.
    #[serde(default = "default_speech_rate")]
    pub speech_rate: f32,

    /// Default: 1.0 (neutral).
    #[serde(default = "default_speech_pitch")]
    pub speech_pitch: f32,

    /// Volume in `0.0..=1.0`.
    ///
    /// Default: 1.0.
    #[serde(default = "default_speech_volume")]
    pub speech_volume: f32,

    /// Locale used when a language code is not in [`locales`](Self::locales).
    ///
    /// Default: "en-US".
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Two-letter language code to locale tag.
    #[serde(default = "default_locales")]
    pub locales: HashMap<String, String>,

    /// Substrings in a voice name that indicate a higher-quality voice.
    ///
    /// Default: `["Google", "Enhanced", "Premium"]`.
    #[serde(default = "default_quality_markers")]
    pub quality_markers: Vec<String>,

    /// Layout of raw PCM payloads handed to `decode_samples`.
    ///
    /// Default: 24 kHz mono, 16-bit signed little-endian.
    #[serde(default)]
    pub pcm_format: PcmFormat,

    /// Length in frames of the silent buffer played to unlock output.
    ///
    /// Default: 1.
    #[serde(default = "default_unlock_frames")]
    pub unlock_frames: usize,

    /// Text of the silent warm-up utterance spoken on first interaction.
    ///
    /// Default: empty.
    #[serde(default)]
    pub warmup_text: String,

    /// Key prefix for cached decoded audio.
    ///
    /// Default: "narration-audio".
    #[serde(default = "default_cache_namespace")]
    pub cache_namespace: String,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            speech_rate: default_speech_rate(),
            speech_pitch: default_speech_pitch(),
            speech_volume: default_speech_volume(),
            default_locale: default_locale(),
            locales: default_locales(),
            quality_markers: default_quality_markers(),
            pcm_format: PcmFormat::default(),
            unlock_frames: default_unlock_frames(),
            warmup_text: String::new(),
            cache_namespace: default_cache_namespace(),
        }
    }
}

impl NarrationConfig {
    /// Parse a (possibly partial) JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PlaybackError::Config(format!("invalid narration config: {}", e)))
    }

    /// Map a two-letter language code to a locale tag.
    ///
    /// Lookup is case-insensitive; unknown codes resolve to
    /// [`default_locale`](Self::default_locale).
    pub fn resolve_locale(&self, language_code: &str) -> &str {
        let code = language_code.trim().to_ascii_lowercase();
        self.locales
            .get(&code)
            .map(String::as_str)
            .unwrap_or(&self.default_locale)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(0.1..=10.0).contains(&self.speech_rate) {
            return Err("speech_rate must be between 0.1 and 10.0".to_string());
        }

        if !(0.0..=2.0).contains(&self.speech_pitch) {
            return Err("speech_pitch must be between 0.0 and 2.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.speech_volume) {
            return Err("speech_volume must be between 0.0 and 1.0".to_string());
        }

        if self.default_locale.trim().is_empty() {
            return Err("default_locale cannot be empty".to_string());
        }

        self.pcm_format.validate().map_err(|e| e.to_string())?;

        if self.unlock_frames == 0 {
            return Err("unlock_frames must be > 0".to_string());
        }

        if self.cache_namespace.is_empty() {
            return Err("cache_namespace cannot be empty".to_string());
        }

        Ok(())
    }
}

// Default value functions for serde
fn default_speech_rate() -> f32 {
    0.9
}

fn default_speech_pitch() -> f32 {
    1.0
}

fn default_speech_volume() -> f32 {
    1.0
}

fn default_locale() -> String {
    "en-US".to_string()
}

fn default_locales() -> HashMap<String, String> {
    [
        ("en", "en-US"),
        ("te", "te-IN"),
        ("hi", "hi-IN"),
        ("ta", "ta-IN"),
        ("kn", "kn-IN"),
    ]
    .into_iter()
    .map(|(code, tag)| (code.to_string(), tag.to_string()))
    .collect()
}

fn default_quality_markers() -> Vec<String> {
    ["Google", "Enhanced", "Premium"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_unlock_frames() -> usize {
    1
}

fn default_cache_namespace() -> String {
    "narration-audio".to_string()
}
