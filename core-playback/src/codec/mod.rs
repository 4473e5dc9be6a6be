//! # Binary Codec
//!
//! Converts synthesized speech audio, delivered as raw PCM (usually base64
//! encoded), into playable [`AudioBuffer`]s.
//!
//! ## Decode Paths
//!
//! 1. **Container**: wrap the PCM in a 44-byte RIFF/WAVE header and hand it to
//!    the platform decoder ([`AudioContext::decode_audio_data`]).
//! 2. **Manual**: interpret the bytes as interleaved signed 16-bit
//!    little-endian samples and build the buffer directly.
//!
//! Platform decoders reject containers under conditions that vary by device,
//! so the manual path runs whenever the container path fails.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use core_playback::codec::{decode_base64, decode_samples, PcmFormat};
//!
//! let pcm = decode_base64(&payload)?;
//! let buffer = decode_samples(pcm, context.as_ref(), PcmFormat::default()).await?;
//! ```

mod container;
mod encoding;
mod strategy;

pub use container::{wrap_pcm_as_container, WAV_HEADER_LEN};
pub use encoding::{decode_base64, encode_base64};
pub use strategy::{
    ContainerDecoder, DecodePath, FallbackDecoder, ManualPcmDecoder, SampleDecoder,
};

use crate::error::{PlaybackError, Result};
use bridge_traits::{AudioBuffer, AudioContext};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Layout of raw linear PCM payloads. Samples are always signed 16-bit
/// little-endian, interleaved when `channels > 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PcmFormat {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_channels")]
    pub channels: u16,
}

impl PcmFormat {
    pub const BITS_PER_SAMPLE: u16 = 16;

    pub fn new(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Bytes occupied by one frame (one sample per channel).
    pub fn bytes_per_frame(&self) -> usize {
        usize::from(self.channels) * usize::from(Self::BITS_PER_SAMPLE / 8)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(PlaybackError::InvalidFormat(
                "sample_rate must be > 0".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(PlaybackError::InvalidFormat(
                "channels must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PcmFormat {
    /// 24 kHz mono, the output format of common neural TTS services.
    fn default() -> Self {
        Self::new(default_sample_rate(), default_channels())
    }
}

fn default_sample_rate() -> u32 {
    24_000
}

fn default_channels() -> u16 {
    1
}

/// Two-tier decode of raw PCM using the default [`FallbackDecoder`].
pub async fn decode_samples(
    pcm: Bytes,
    context: &dyn AudioContext,
    format: PcmFormat,
) -> Result<AudioBuffer> {
    format.validate()?;
    FallbackDecoder::default()
        .decode(pcm, context, format)
        .await
}
