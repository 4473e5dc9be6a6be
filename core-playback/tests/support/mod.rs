//! Scripted platform fakes shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    AudioBuffer, AudioContext, AudioContextFactory, AudioSourceHandle, CompletionCallback,
    ContextState, SpeechSynthesizer, Utterance, UtteranceOutcome, Voice,
};
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

// ============================================================================
// Completion counting
// ============================================================================

/// Counts invocations of the callbacks it hands out.
#[derive(Clone, Default)]
pub struct CallCounter {
    calls: Arc<AtomicUsize>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn callback(&self) -> CompletionCallback {
        let calls = Arc::clone(&self.calls);
        Box::new(move || {
            calls.fetch_add(1, Ordering::SeqCst);
        })
    }

    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(condition: impl Fn() -> bool) -> bool {
    let poll = async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(2), poll)
        .await
        .is_ok()
}

/// Let spawned tasks run for a moment.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(30)).await;
}

// ============================================================================
// Speech
// ============================================================================

/// Speech engine that records utterances.
///
/// In hold mode every utterance stays pending until [`release_next`] or
/// [`SpeechSynthesizer::cancel`] resolves it.
///
/// [`release_next`]: FakeSpeech::release_next
#[derive(Default)]
pub struct FakeSpeech {
    voices: Vec<Voice>,
    hold: bool,
    fail_voices: bool,
    fail_texts: Mutex<HashSet<String>>,
    reject_texts: Mutex<HashSet<String>>,
    spoken: Mutex<Vec<Utterance>>,
    pending: Mutex<VecDeque<oneshot::Sender<UtteranceOutcome>>>,
    cancel_calls: AtomicUsize,
    paused: AtomicBool,
}

impl FakeSpeech {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holding() -> Self {
        Self {
            hold: true,
            ..Self::default()
        }
    }

    pub fn with_voices(mut self, voices: Vec<Voice>) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_failing_voices(mut self) -> Self {
        self.fail_voices = true;
        self
    }

    /// Utterances with exactly this text report a synthesis error.
    pub fn fail_text(&self, text: &str) {
        self.fail_texts.lock().insert(text.to_string());
    }

    /// Utterances with exactly this text are refused before being queued.
    pub fn reject_text(&self, text: &str) {
        self.reject_texts.lock().insert(text.to_string());
    }

    /// Resolve the oldest pending utterance as ended.
    pub fn release_next(&self) -> bool {
        let sender = self.pending.lock().pop_front();
        match sender {
            Some(sender) => sender.send(UtteranceOutcome::Ended).is_ok(),
            None => false,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn spoken(&self) -> Vec<Utterance> {
        self.spoken.lock().clone()
    }

    pub fn spoken_texts(&self) -> Vec<String> {
        self.spoken
            .lock()
            .iter()
            .map(|utterance| utterance.text.clone())
            .collect()
    }

    pub fn cancel_calls(&self) -> usize {
        self.cancel_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    async fn voices(&self) -> Result<Vec<Voice>> {
        if self.fail_voices {
            return Err(BridgeError::NotAvailable("voices".to_string()));
        }
        Ok(self.voices.clone())
    }

    async fn speak(&self, utterance: Utterance) -> Result<UtteranceOutcome> {
        let text = utterance.text.clone();
        self.spoken.lock().push(utterance);

        if self.reject_texts.lock().contains(&text) {
            return Err(BridgeError::OperationFailed(format!(
                "utterance rejected: {}",
                text
            )));
        }

        if self.fail_texts.lock().contains(&text) {
            return Ok(UtteranceOutcome::Failed {
                reason: "synthesis-failed".to_string(),
            });
        }

        if !self.hold {
            return Ok(UtteranceOutcome::Ended);
        }

        let (sender, receiver) = oneshot::channel();
        self.pending.lock().push_back(sender);
        Ok(receiver.await.unwrap_or(UtteranceOutcome::Failed {
            reason: "interrupted".to_string(),
        }))
    }

    fn cancel(&self) {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        let pending: Vec<_> = self.pending.lock().drain(..).collect();
        for sender in pending {
            let _ = sender.send(UtteranceOutcome::Failed {
                reason: "canceled".to_string(),
            });
        }
    }

    fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_speaking(&self) -> bool {
        !self.pending.lock().is_empty()
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Audio output
// ============================================================================

struct SourceRecord {
    frames: usize,
    on_ended: Arc<Mutex<Option<CompletionCallback>>>,
    stopped: Arc<AtomicBool>,
}

/// Audio context whose sources only end when the test says so.
pub struct FakeContext {
    state: Mutex<ContextState>,
    sample_rate: u32,
    pub fail_resume: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_decode: AtomicBool,
    /// Sources report their end before `start_source` returns.
    pub end_on_start: AtomicBool,
    resume_calls: AtomicUsize,
    decode_calls: AtomicUsize,
    sources: Mutex<Vec<SourceRecord>>,
}

impl FakeContext {
    pub fn new(state: ContextState, sample_rate: u32) -> Self {
        Self {
            state: Mutex::new(state),
            sample_rate,
            fail_resume: AtomicBool::new(false),
            fail_start: AtomicBool::new(false),
            fail_decode: AtomicBool::new(false),
            end_on_start: AtomicBool::new(false),
            resume_calls: AtomicUsize::new(0),
            decode_calls: AtomicUsize::new(0),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn close(&self) {
        *self.state.lock() = ContextState::Closed;
    }

    /// Simulate natural completion of source `index`. Returns whether a
    /// callback was still registered.
    pub fn finish_source(&self, index: usize) -> bool {
        let on_ended = self
            .sources
            .lock()
            .get(index)
            .and_then(|record| record.on_ended.lock().take());

        match on_ended {
            Some(on_ended) => {
                on_ended();
                true
            }
            None => false,
        }
    }

    pub fn source_count(&self) -> usize {
        self.sources.lock().len()
    }

    pub fn source_frames(&self, index: usize) -> Option<usize> {
        self.sources.lock().get(index).map(|record| record.frames)
    }

    pub fn source_stopped(&self, index: usize) -> bool {
        self.sources
            .lock()
            .get(index)
            .map(|record| record.stopped.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    pub fn resume_calls(&self) -> usize {
        self.resume_calls.load(Ordering::SeqCst)
    }

    pub fn decode_calls(&self) -> usize {
        self.decode_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioContext for FakeContext {
    fn state(&self) -> ContextState {
        *self.state.lock()
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    async fn resume(&self) -> Result<()> {
        self.resume_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_resume.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("resume rejected".to_string()));
        }
        let mut state = self.state.lock();
        if *state == ContextState::Closed {
            return Err(BridgeError::OperationFailed("context closed".to_string()));
        }
        *state = ContextState::Running;
        Ok(())
    }

    async fn suspend(&self) -> Result<()> {
        let mut state = self.state.lock();
        if *state == ContextState::Closed {
            return Err(BridgeError::OperationFailed("context closed".to_string()));
        }
        *state = ContextState::Suspended;
        Ok(())
    }

    fn start_source(
        &self,
        buffer: Arc<AudioBuffer>,
        on_ended: CompletionCallback,
    ) -> Result<Box<dyn AudioSourceHandle>> {
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("start rejected".to_string()));
        }

        let on_ended = Arc::new(Mutex::new(Some(on_ended)));
        let stopped = Arc::new(AtomicBool::new(false));
        self.sources.lock().push(SourceRecord {
            frames: buffer.length(),
            on_ended: Arc::clone(&on_ended),
            stopped: Arc::clone(&stopped),
        });

        if self.end_on_start.load(Ordering::SeqCst) {
            let ended = on_ended.lock().take();
            if let Some(ended) = ended {
                ended();
            }
        }

        Ok(Box::new(FakeSource { on_ended, stopped }))
    }

    async fn decode_audio_data(&self, data: Bytes) -> Result<AudioBuffer> {
        self.decode_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_decode.load(Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed(
                "EncodingError: unable to decode audio data".to_string(),
            ));
        }

        let reader = hound::WavReader::new(Cursor::new(data.to_vec()))
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;
        let spec = reader.spec();
        let samples: Vec<f32> = reader
            .into_samples::<i16>()
            .map(|sample| sample.map(|s| s as f32 / 32768.0))
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| BridgeError::OperationFailed(e.to_string()))?;

        if samples.is_empty() {
            return Err(BridgeError::OperationFailed("empty container".to_string()));
        }
        AudioBuffer::from_interleaved(&samples, spec.channels, spec.sample_rate)
    }
}

struct FakeSource {
    on_ended: Arc<Mutex<Option<CompletionCallback>>>,
    stopped: Arc<AtomicBool>,
}

impl AudioSourceHandle for FakeSource {
    fn detach_ended(&mut self) {
        self.on_ended.lock().take();
    }

    fn stop(&mut self) -> Result<()> {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return Err(BridgeError::OperationFailed("already stopped".to_string()));
        }
        Ok(())
    }

    fn disconnect(&mut self) {}
}

/// Factory handing out [`FakeContext`]s and keeping them for inspection.
pub struct FakeFactory {
    initial_state: ContextState,
    sample_rate: u32,
    pub fail_create: AtomicBool,
    contexts: Mutex<Vec<Arc<FakeContext>>>,
}

impl FakeFactory {
    pub fn new(initial_state: ContextState) -> Self {
        Self {
            initial_state,
            sample_rate: 48_000,
            fail_create: AtomicBool::new(false),
            contexts: Mutex::new(Vec::new()),
        }
    }

    pub fn contexts_created(&self) -> usize {
        self.contexts.lock().len()
    }

    pub fn latest(&self) -> Arc<FakeContext> {
        self.contexts
            .lock()
            .last()
            .cloned()
            .expect("no context created yet")
    }
}

impl AudioContextFactory for FakeFactory {
    fn create_context(&self) -> Result<Arc<dyn AudioContext>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(BridgeError::NotAvailable("audio output".to_string()));
        }
        let context = Arc::new(FakeContext::new(self.initial_state, self.sample_rate));
        self.contexts.lock().push(Arc::clone(&context));
        Ok(context)
    }
}

/// Little-endian 16-bit PCM bytes for `samples`.
pub fn pcm16(samples: &[i16]) -> Bytes {
    samples
        .iter()
        .flat_map(|sample| sample.to_le_bytes())
        .collect::<Vec<u8>>()
        .into()
}
