//! Sample decoding strategies.
//!
//! ```text
//!                ┌──────────────────┐  ok   ┌─────────────┐
//! raw PCM ──────>│ ContainerDecoder ├──────>│ AudioBuffer │
//!                └────────┬─────────┘       └─────────────┘
//!                         │ err (logged)           ^
//!                ┌────────v─────────┐              │
//!                │ ManualPcmDecoder ├──────────────┘
//!                └──────────────────┘
//! ```
//!
//! [`FallbackDecoder`] is the guarded combinator; each strategy can also be
//! used on its own.

use super::container::wrap_pcm_as_container;
use super::PcmFormat;
use crate::error::{PlaybackError, Result};
use bridge_traits::platform::PlatformSendSync;
use bridge_traits::{AudioBuffer, AudioContext};
use bytes::Bytes;
use tracing::{debug, warn};

const I16_SCALE: f32 = 32768.0;

/// Turns raw PCM bytes into a playable buffer.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait SampleDecoder: PlatformSendSync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    async fn decode(
        &self,
        pcm: Bytes,
        context: &dyn AudioContext,
        format: PcmFormat,
    ) -> Result<AudioBuffer>;
}

/// Wraps PCM in a WAVE header and delegates to the platform decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContainerDecoder;

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SampleDecoder for ContainerDecoder {
    fn name(&self) -> &'static str {
        "container"
    }

    async fn decode(
        &self,
        pcm: Bytes,
        context: &dyn AudioContext,
        format: PcmFormat,
    ) -> Result<AudioBuffer> {
        let container = wrap_pcm_as_container(
            &pcm,
            format.sample_rate,
            format.channels,
            PcmFormat::BITS_PER_SAMPLE,
        );

        let buffer = context
            .decode_audio_data(container)
            .await
            .map_err(|e| PlaybackError::ContainerDecode(e.to_string()))?;

        if buffer.is_empty() {
            return Err(PlaybackError::ContainerDecode(
                "platform decoder produced no frames".to_string(),
            ));
        }

        Ok(buffer)
    }
}

/// Interprets bytes directly as interleaved signed 16-bit little-endian PCM.
///
/// Never fails for a valid [`PcmFormat`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualPcmDecoder;

impl ManualPcmDecoder {
    /// Synchronous core of the manual path.
    ///
    /// A trailing odd byte is dropped, as are samples that do not complete a
    /// frame. Input too short for a single frame produces one frame of silence.
    pub fn decode_pcm16(pcm: &[u8], format: PcmFormat) -> Result<AudioBuffer> {
        format.validate()?;

        if pcm.len() % 2 != 0 {
            debug!(bytes = pcm.len(), "Dropping trailing odd byte from PCM payload");
        }

        let samples: Vec<f32> = pcm
            .chunks_exact(2)
            .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / I16_SCALE)
            .collect();

        if samples.len() < usize::from(format.channels) {
            return Ok(AudioBuffer::silent(format.channels, 1, format.sample_rate)?);
        }

        Ok(AudioBuffer::from_interleaved(
            &samples,
            format.channels,
            format.sample_rate,
        )?)
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SampleDecoder for ManualPcmDecoder {
    fn name(&self) -> &'static str {
        "manual-pcm"
    }

    async fn decode(
        &self,
        pcm: Bytes,
        _context: &dyn AudioContext,
        format: PcmFormat,
    ) -> Result<AudioBuffer> {
        Self::decode_pcm16(&pcm, format)
    }
}

/// Which strategy produced a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodePath {
    Primary,
    /// The primary strategy failed with `reason`.
    Fallback { reason: String },
}

/// Tries `primary`, and on any error retries with `fallback`.
pub struct FallbackDecoder {
    primary: Box<dyn SampleDecoder>,
    fallback: Box<dyn SampleDecoder>,
}

impl FallbackDecoder {
    pub fn new(primary: Box<dyn SampleDecoder>, fallback: Box<dyn SampleDecoder>) -> Self {
        Self { primary, fallback }
    }

    /// Decode and report which path succeeded.
    pub async fn decode_with_path(
        &self,
        pcm: Bytes,
        context: &dyn AudioContext,
        format: PcmFormat,
    ) -> Result<(AudioBuffer, DecodePath)> {
        match self.primary.decode(pcm.clone(), context, format).await {
            Ok(buffer) => Ok((buffer, DecodePath::Primary)),
            Err(err) => {
                warn!(
                    decoder = self.primary.name(),
                    fallback = self.fallback.name(),
                    error = %err,
                    "Primary sample decoder failed, falling back"
                );
                let buffer = self.fallback.decode(pcm, context, format).await?;
                Ok((
                    buffer,
                    DecodePath::Fallback {
                        reason: err.to_string(),
                    },
                ))
            }
        }
    }
}

impl Default for FallbackDecoder {
    fn default() -> Self {
        Self::new(Box::new(ContainerDecoder), Box::new(ManualPcmDecoder))
    }
}

impl std::fmt::Debug for FallbackDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackDecoder")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
impl SampleDecoder for FallbackDecoder {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn decode(
        &self,
        pcm: Bytes,
        context: &dyn AudioContext,
        format: PcmFormat,
    ) -> Result<AudioBuffer> {
        let (buffer, _) = self.decode_with_path(pcm, context, format).await?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm16(samples: &[i16]) -> Vec<u8> {
        samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    #[test]
    fn manual_decode_normalizes_by_32768() {
        let bytes = pcm16(&[0, 16384, -32768, 32767]);
        let buffer = ManualPcmDecoder::decode_pcm16(&bytes, PcmFormat::default()).unwrap();

        assert_eq!(buffer.sample_rate(), 24_000);
        assert_eq!(buffer.number_of_channels(), 1);
        let samples = buffer.channel(0).unwrap();
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], 0.5);
        assert_eq!(samples[2], -1.0);
        assert!((samples[3] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn manual_decode_drops_trailing_odd_byte() {
        let mut bytes = pcm16(&[1000, -1000]);
        bytes.push(0x7f);

        let buffer = ManualPcmDecoder::decode_pcm16(&bytes, PcmFormat::default()).unwrap();
        assert_eq!(buffer.length(), 2);
    }

    #[test]
    fn manual_decode_of_empty_input_is_one_silent_frame() {
        let buffer = ManualPcmDecoder::decode_pcm16(&[], PcmFormat::default()).unwrap();
        assert_eq!(buffer.length(), 1);
        assert_eq!(buffer.channel(0), Some(&[0.0][..]));

        let single_byte = ManualPcmDecoder::decode_pcm16(&[0x12], PcmFormat::default()).unwrap();
        assert_eq!(single_byte.length(), 1);
    }

    #[test]
    fn manual_decode_honours_stereo_format() {
        let bytes = pcm16(&[100, -100, 200, -200, 300]);
        let format = PcmFormat::new(48_000, 2);
        let buffer = ManualPcmDecoder::decode_pcm16(&bytes, format).unwrap();

        assert_eq!(buffer.sample_rate(), 48_000);
        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.length(), 2);
        assert_eq!(buffer.channel(1).unwrap()[1], -200.0 / 32768.0);
    }

    #[test]
    fn manual_decode_rejects_invalid_format() {
        let err = ManualPcmDecoder::decode_pcm16(&[0, 0], PcmFormat::new(0, 1)).unwrap_err();
        assert!(matches!(err, PlaybackError::InvalidFormat(_)));
    }
}
