//! Headless audio output
//!
//! A timer-driven [`AudioContext`] for desktop hosts without a sound device
//! (CI, servers, CLI narration dry-runs). Sources "play" by advancing a clock
//! while the context is running and report their natural end through the
//! registered callback. Containers are decoded with `symphonia`.

use async_trait::async_trait;
use bridge_traits::{
    audio::{AudioBuffer, AudioContext, AudioContextFactory, AudioSourceHandle, ContextState},
    error::{BridgeError, Result},
    platform::CompletionCallback,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const DEFAULT_SAMPLE_RATE: u32 = 48_000;
const DEFAULT_TICK: Duration = Duration::from_millis(10);

const STATE_SUSPENDED: u8 = 0;
const STATE_RUNNING: u8 = 1;
const STATE_CLOSED: u8 = 2;

fn encode_state(state: ContextState) -> u8 {
    match state {
        ContextState::Suspended => STATE_SUSPENDED,
        ContextState::Running => STATE_RUNNING,
        ContextState::Closed => STATE_CLOSED,
    }
}

fn decode_state(raw: u8) -> ContextState {
    match raw {
        STATE_RUNNING => ContextState::Running,
        STATE_CLOSED => ContextState::Closed,
        _ => ContextState::Suspended,
    }
}

type SharedCallback = Arc<Mutex<Option<CompletionCallback>>>;

/// Timer-driven output context.
pub struct HeadlessAudioContext {
    state: Arc<AtomicU8>,
    sample_rate: u32,
    tick: Duration,
    shutdown: CancellationToken,
    sources_started: AtomicUsize,
}

impl HeadlessAudioContext {
    pub fn new(sample_rate: u32, initial_state: ContextState) -> Self {
        Self {
            state: Arc::new(AtomicU8::new(encode_state(initial_state))),
            sample_rate,
            tick: DEFAULT_TICK,
            shutdown: CancellationToken::new(),
            sources_started: AtomicUsize::new(0),
        }
    }

    /// Clock resolution for source playback.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Emulate the platform releasing the device. Running sources are
    /// cancelled without reporting completion.
    pub fn close(&self) {
        self.state.store(STATE_CLOSED, Ordering::SeqCst);
        self.shutdown.cancel();
        debug!("Headless audio context closed");
    }

    /// Number of sources started on this context, including unlock buffers.
    pub fn sources_started(&self) -> usize {
        self.sources_started.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state() == ContextState::Closed {
            return Err(BridgeError::OperationFailed(
                "audio context is closed".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AudioContext for HeadlessAudioContext {
    fn state(&self) -> ContextState {
        decode_state(self.state.load(Ordering::SeqCst))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn resume(&self) -> Result<()> {
        self.ensure_open()?;
        self.state.store(STATE_RUNNING, Ordering::SeqCst);
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        self.ensure_open()?;
        self.state.store(STATE_SUSPENDED, Ordering::SeqCst);
        Ok(())
    }

    fn start_source(
        &self,
        buffer: Arc<AudioBuffer>,
        on_ended: CompletionCallback,
    ) -> Result<Box<dyn AudioSourceHandle>> {
        self.ensure_open()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| BridgeError::NotAvailable("tokio runtime".to_string()))?;

        let token = self.shutdown.child_token();
        let on_ended: SharedCallback = Arc::new(Mutex::new(Some(on_ended)));
        let finished = Arc::new(AtomicBool::new(false));

        let task = SourceClock {
            length: buffer.duration(),
            tick: self.tick,
            state: Arc::clone(&self.state),
            token: token.clone(),
            on_ended: Arc::clone(&on_ended),
            finished: Arc::clone(&finished),
        };
        runtime.spawn(task.run());

        self.sources_started.fetch_add(1, Ordering::SeqCst);
        debug!(frames = buffer.length(), "Headless source started");

        Ok(Box::new(HeadlessSource {
            token,
            on_ended,
            finished,
        }))
    }

    async fn decode_audio_data(&self, data: Bytes) -> Result<AudioBuffer> {
        decode_container(data)
    }
}

/// Background task advancing one source's playhead.
struct SourceClock {
    length: Duration,
    tick: Duration,
    state: Arc<AtomicU8>,
    token: CancellationToken,
    on_ended: SharedCallback,
    finished: Arc<AtomicBool>,
}

impl SourceClock {
    async fn run(self) {
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut played = Duration::ZERO;

        loop {
            tokio::select! {
                _ = self.token.cancelled() => return,
                _ = interval.tick() => {}
            }

            if self.state.load(Ordering::SeqCst) == STATE_RUNNING {
                played += self.tick;
            }
            if played >= self.length {
                break;
            }
        }

        self.finished.store(true, Ordering::SeqCst);
        let on_ended = self.on_ended.lock().take();
        if let Some(on_ended) = on_ended {
            on_ended();
        }
    }
}

struct HeadlessSource {
    token: CancellationToken,
    on_ended: SharedCallback,
    finished: Arc<AtomicBool>,
}

impl AudioSourceHandle for HeadlessSource {
    fn detach_ended(&mut self) {
        self.on_ended.lock().take();
    }

    fn stop(&mut self) -> Result<()> {
        if self.finished.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "source already finished".to_string(),
            ));
        }
        self.token.cancel();
        Ok(())
    }

    fn disconnect(&mut self) {
        self.token.cancel();
    }
}

/// Decode a self-describing container into planar samples.
pub fn decode_container(data: Bytes) -> Result<AudioBuffer> {
    let source = MediaSourceStream::new(Box::new(Cursor::new(data.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| BridgeError::OperationFailed(format!("Unrecognized container: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|track| track.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| BridgeError::OperationFailed("No audio track in container".to_string()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| BridgeError::OperationFailed("Container has no sample rate".to_string()))?;
    let channels = track
        .codec_params
        .channels
        .map(|channels| channels.count() as u16)
        .unwrap_or(1);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| BridgeError::OperationFailed(format!("Unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => {
                return Err(BridgeError::OperationFailed(format!(
                    "Failed to read packet: {}",
                    e
                )))
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let mut converted =
                    SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                converted.copy_interleaved_ref(decoded);
                samples.extend_from_slice(converted.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                warn!(error = e, "Skipping undecodable packet");
            }
            Err(e) => {
                return Err(BridgeError::OperationFailed(format!(
                    "Decoder failed: {}",
                    e
                )))
            }
        }
    }

    if samples.is_empty() {
        return Err(BridgeError::OperationFailed(
            "Container holds no samples".to_string(),
        ));
    }

    AudioBuffer::from_interleaved(&samples, channels, sample_rate)
}

/// Creates [`HeadlessAudioContext`]s and remembers them for inspection.
pub struct HeadlessContextFactory {
    sample_rate: u32,
    initial_state: ContextState,
    tick: Duration,
    created: Mutex<Vec<Arc<HeadlessAudioContext>>>,
}

impl HeadlessContextFactory {
    /// 48 kHz contexts that start suspended, like a browser before a gesture.
    pub fn new() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            initial_state: ContextState::Suspended,
            tick: DEFAULT_TICK,
            created: Mutex::new(Vec::new()),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_initial_state(mut self, state: ContextState) -> Self {
        self.initial_state = state;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn contexts_created(&self) -> usize {
        self.created.lock().len()
    }

    /// Most recently created context.
    pub fn latest(&self) -> Option<Arc<HeadlessAudioContext>> {
        self.created.lock().last().cloned()
    }
}

impl Default for HeadlessContextFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioContextFactory for HeadlessContextFactory {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>> {
        let context = Arc::new(
            HeadlessAudioContext::new(self.sample_rate, self.initial_state).with_tick(self.tick),
        );
        self.created.lock().push(Arc::clone(&context));
        debug!(sample_rate = self.sample_rate, "Created headless audio context");
        Ok(context)
    }
}
