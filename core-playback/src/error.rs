//! # Playback Error Types
//!
//! Error taxonomy for narration and buffer playback. Most variants are
//! recovered inside the core (logged, then skipped or treated as a miss); see
//! [`PlaybackError::is_recoverable`].

use bridge_traits::BridgeError;
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Input Errors (propagated to the caller)
    // ========================================================================
    /// Encoded payload is not valid base64.
    #[error("Malformed encoded audio: {0}")]
    Decode(String),

    /// Sample format parameters are unusable (zero rate, zero channels).
    #[error("Invalid PCM format: {0}")]
    InvalidFormat(String),

    // ========================================================================
    // Decoder Errors
    // ========================================================================
    /// The platform container decoder rejected a payload.
    #[error("Container decode failed: {0}")]
    ContainerDecode(String),

    // ========================================================================
    // Speech Errors
    // ========================================================================
    /// The speech engine failed a single utterance.
    #[error("Utterance failed: {0}")]
    Utterance(String),

    // ========================================================================
    // Output Errors
    // ========================================================================
    /// A buffer source could not be started.
    #[error("Failed to start audio source: {0}")]
    SourceStart(String),

    // ========================================================================
    // Persistence Errors
    // ========================================================================
    /// Cache read or write failed.
    #[error("Persistence failure: {0}")]
    Persistence(String),

    // ========================================================================
    // Platform / Configuration Errors
    // ========================================================================
    /// The host supplied no capability for the requested operation.
    #[error("Unsupported on this platform: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl PlaybackError {
    /// Returns `true` if the core recovers from this error locally instead of
    /// surfacing it to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PlaybackError::ContainerDecode(_)
                | PlaybackError::Utterance(_)
                | PlaybackError::SourceStart(_)
                | PlaybackError::Persistence(_)
        )
    }

    /// Returns `true` if the error stems from the audio payload itself.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            PlaybackError::Decode(_) | PlaybackError::InvalidFormat(_)
        )
    }

    pub(crate) fn capability_missing(
        capability: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        PlaybackError::CapabilityMissing {
            capability: capability.into(),
            message: message.into(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;
