//! Audio output bridge traits and the shared decoded-buffer type.
//!
//! These abstractions let the core playback module drive a platform audio
//! output context (Web Audio `AudioContext`, a native mixer, a headless test
//! sink) without knowing how samples actually reach a speaker. Hosts provide an
//! [`AudioContextFactory`]; the core decides when a context is created, revived,
//! resumed or suspended.

use crate::{
    error::{BridgeError, Result},
    platform::{CompletionCallback, PlatformSend, PlatformSendSync},
};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Decoded, channel-separated floating-point audio.
///
/// Samples are normalized to `[-1.0, 1.0]` and stored planar (one `Vec` per
/// channel). The buffer is immutable once constructed; share it behind an
/// [`Arc`] when handing it to several consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: u32,
    length: usize,
}

impl AudioBuffer {
    /// Build a buffer from planar channel data.
    ///
    /// Fails when no channel is supplied, when the sample rate is zero, or when
    /// the channels do not share the same length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: u32) -> Result<Self> {
        let Some(first) = channels.first() else {
            return Err(BridgeError::OperationFailed(
                "audio buffer requires at least one channel".to_string(),
            ));
        };

        if sample_rate == 0 {
            return Err(BridgeError::OperationFailed(
                "audio buffer sample rate must be > 0".to_string(),
            ));
        }

        let length = first.len();
        if channels.iter().any(|channel| channel.len() != length) {
            return Err(BridgeError::OperationFailed(
                "audio buffer channels must have equal lengths".to_string(),
            ));
        }

        Ok(Self {
            channels,
            sample_rate,
            length,
        })
    }

    /// Single-channel buffer.
    pub fn mono(samples: Vec<f32>, sample_rate: u32) -> Result<Self> {
        Self::new(vec![samples], sample_rate)
    }

    /// Buffer of `length` frames of silence.
    pub fn silent(channels: u16, length: usize, sample_rate: u32) -> Result<Self> {
        let count = channels.max(1) as usize;
        Self::new(vec![vec![0.0; length]; count], sample_rate)
    }

    /// Split interleaved samples (`L0 R0 L1 R1 ...`) into planar channels.
    ///
    /// Trailing samples that do not form a complete frame are dropped.
    pub fn from_interleaved(samples: &[f32], channels: u16, sample_rate: u32) -> Result<Self> {
        let count = channels.max(1) as usize;
        let frames = samples.len() / count;
        let mut planar = vec![Vec::with_capacity(frames); count];

        for frame in samples.chunks_exact(count) {
            for (channel, sample) in planar.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }

        Self::new(planar, sample_rate)
    }

    /// Number of frames (samples per channel).
    pub fn length(&self) -> usize {
        self.length
    }

    /// Sample rate in hertz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn number_of_channels(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Borrow the samples of one channel.
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// Iterate over all channels in order.
    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }

    /// Playback duration at the buffer's own sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.length as f64 / self.sample_rate as f64)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// Lifecycle state reported by a platform audio context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextState {
    /// Created but not producing audio (autoplay lock, explicit suspend).
    Suspended,
    /// Actively rendering.
    Running,
    /// Released by the platform or the host; must be recreated.
    Closed,
}

/// Handle to a started buffer-backed source.
///
/// The core keeps the handle for as long as the playback session is active so
/// it can be stopped early.
pub trait AudioSourceHandle: PlatformSend {
    /// Drop the registered end callback so a later stop never reports completion.
    fn detach_ended(&mut self);

    /// Stop rendering. Errors are expected when the source already finished.
    fn stop(&mut self) -> Result<()>;

    /// Disconnect the source from the output graph.
    fn disconnect(&mut self);
}

/// Platform audio output context.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait AudioContext: PlatformSendSync {
    /// Current lifecycle state.
    fn state(&self) -> ContextState;

    /// Native output sample rate chosen by the platform.
    fn sample_rate(&self) -> u32;

    /// Request the context to start (or continue) rendering.
    async fn resume(&self) -> Result<()>;

    /// Request the context to stop rendering without releasing it.
    async fn suspend(&self) -> Result<()>;

    /// Start playing `buffer` immediately.
    ///
    /// `on_ended` fires at most once, when the source finishes naturally.
    /// Implementations must not invoke it after [`AudioSourceHandle::detach_ended`].
    fn start_source(
        &self,
        buffer: Arc<AudioBuffer>,
        on_ended: CompletionCallback,
    ) -> Result<Box<dyn AudioSourceHandle>>;

    /// Decode a self-describing audio container (e.g. RIFF/WAVE) into samples.
    ///
    /// May reject containers the platform decoder does not accept.
    async fn decode_audio_data(&self, data: Bytes) -> Result<AudioBuffer>;
}

/// Creates audio output contexts on demand.
///
/// Implementations must accept the platform default sample rate rather than
/// forcing one, to avoid resampling artifacts on mobile devices.
pub trait AudioContextFactory: PlatformSendSync {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interleaved_samples_are_split_per_channel() {
        let buffer = AudioBuffer::from_interleaved(&[0.1, -0.1, 0.2, -0.2, 0.3], 2, 48_000)
            .unwrap();

        assert_eq!(buffer.number_of_channels(), 2);
        assert_eq!(buffer.length(), 2);
        assert_eq!(buffer.channel(0), Some(&[0.1, 0.2][..]));
        assert_eq!(buffer.channel(1), Some(&[-0.1, -0.2][..]));
    }

    #[test]
    fn mismatched_channels_are_rejected() {
        let result = AudioBuffer::new(vec![vec![0.0; 4], vec![0.0; 3]], 24_000);
        assert!(result.is_err());
        assert!(AudioBuffer::new(Vec::new(), 24_000).is_err());
        assert!(AudioBuffer::mono(vec![0.0], 0).is_err());
    }

    #[test]
    fn duration_follows_sample_rate() {
        let buffer = AudioBuffer::silent(1, 12_000, 24_000).unwrap();
        assert_eq!(buffer.duration(), Duration::from_millis(500));
        assert!(!buffer.is_empty());
    }
}
