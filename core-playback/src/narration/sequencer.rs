//! Chunk-by-chunk narration driver.

use super::segment::segment;
use super::voice::select_voice;
use crate::config::NarrationConfig;
use crate::runtime;
use bridge_traits::{CompletionCallback, SpeechSynthesizer, Utterance, UtteranceOutcome, Voice};
use core_runtime::events::{CoreEvent, EventBus, NarrationEvent};
use core_runtime::logging::preview;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn, Instrument};

const LOG_PREVIEW_CHARS: usize = 40;

/// Snapshot of the active narration job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NarrationStatus {
    pub job_id: u64,
    pub chunk_count: usize,
    /// Index of the chunk currently handed to the speech engine.
    pub current_chunk: usize,
}

struct ActiveJob {
    id: u64,
    chunk_count: usize,
    stopped: Arc<AtomicBool>,
    current_chunk: Arc<AtomicUsize>,
}

/// Plays text as an ordered sequence of independently synthesized chunks.
///
/// At most one job runs at a time; starting a job stops the previous one.
/// Every accepted request gets exactly one completion callback, whether it
/// finishes, has failing chunks, or is stopped.
pub struct NarrationSequencer {
    speech: Arc<dyn SpeechSynthesizer>,
    config: Arc<NarrationConfig>,
    current: Arc<Mutex<Option<ActiveJob>>>,
    next_job_id: AtomicU64,
    events: Option<EventBus>,
}

impl NarrationSequencer {
    pub fn new(speech: Arc<dyn SpeechSynthesizer>, config: Arc<NarrationConfig>) -> Self {
        Self {
            speech,
            config,
            current: Arc::new(Mutex::new(None)),
            next_job_id: AtomicU64::new(0),
            events: None,
        }
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Start narrating `text` in the language identified by `language_code`.
    ///
    /// Any running job is stopped first. If `text` has nothing to say,
    /// `on_end` fires before this returns. Otherwise the job runs in the
    /// background and its id is returned.
    pub fn speak(&self, text: &str, language_code: &str, on_end: CompletionCallback) -> Option<u64> {
        self.stop();

        let chunks = segment(text);
        if chunks.is_empty() {
            debug!("Nothing to narrate");
            on_end();
            return None;
        }

        let id = self.next_job_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stopped = Arc::new(AtomicBool::new(false));
        let current_chunk = Arc::new(AtomicUsize::new(0));

        *self.current.lock() = Some(ActiveJob {
            id,
            chunk_count: chunks.len(),
            stopped: Arc::clone(&stopped),
            current_chunk: Arc::clone(&current_chunk),
        });

        let job = NarrationJob {
            id,
            chunks,
            language_code: language_code.to_string(),
            stopped,
            current_chunk,
            speech: Arc::clone(&self.speech),
            config: Arc::clone(&self.config),
            slot: Arc::clone(&self.current),
            events: self.events.clone(),
        };

        let span = tracing::info_span!("narration_job", job_id = id);
        runtime::spawn(job.run(on_end).instrument(span));
        Some(id)
    }

    /// Stop the active job and clear the platform synthesis queue.
    ///
    /// The interrupted utterance still resolves; the job observes the stop at
    /// that chunk boundary and reports completion once.
    pub fn stop(&self) {
        let previous = self.current.lock().take();
        if let Some(job) = previous {
            debug!(job_id = job.id, "Stopping narration job");
            job.stopped.store(true, Ordering::SeqCst);
        }
        self.speech.cancel();
    }

    /// Pause the speech engine if it is speaking.
    pub fn pause(&self) {
        if self.speech.is_speaking() && !self.speech.is_paused() {
            self.speech.pause();
        }
    }

    /// Resume the speech engine if it is paused.
    pub fn resume(&self) {
        if self.speech.is_paused() {
            self.speech.resume();
        }
    }

    /// Speak the configured warm-up text at zero volume.
    pub async fn warm_up(&self) {
        let utterance = Utterance::new(
            self.config.warmup_text.clone(),
            self.config.default_locale.clone(),
        )
        .with_volume(0.0);

        match self.speech.speak(utterance).await {
            Ok(outcome) => debug!(?outcome, "Speech warm-up finished"),
            Err(err) => warn!(error = %err, "Speech warm-up failed"),
        }
    }

    pub fn status(&self) -> Option<NarrationStatus> {
        self.current.lock().as_ref().map(|job| NarrationStatus {
            job_id: job.id,
            chunk_count: job.chunk_count,
            current_chunk: job.current_chunk.load(Ordering::SeqCst),
        })
    }

    pub fn is_active(&self) -> bool {
        self.current.lock().is_some()
    }
}

impl std::fmt::Debug for NarrationSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NarrationSequencer")
            .field("status", &self.status())
            .finish()
    }
}

/// Everything a running job needs, moved into its task.
struct NarrationJob {
    id: u64,
    chunks: Vec<String>,
    language_code: String,
    stopped: Arc<AtomicBool>,
    current_chunk: Arc<AtomicUsize>,
    speech: Arc<dyn SpeechSynthesizer>,
    config: Arc<NarrationConfig>,
    slot: Arc<Mutex<Option<ActiveJob>>>,
    events: Option<EventBus>,
}

impl NarrationJob {
    async fn run(self, on_end: CompletionCallback) {
        let locale = self.config.resolve_locale(&self.language_code).to_string();
        let voice = self.resolve_voice(&locale).await;

        info!(
            chunks = self.chunks.len(),
            locale = %locale,
            voice = voice.as_ref().map(|v| v.name.as_str()).unwrap_or("<default>"),
            "Narration started"
        );
        self.emit(NarrationEvent::Started {
            job_id: self.id,
            chunk_count: self.chunks.len(),
            locale: locale.clone(),
            voice: voice.as_ref().map(|v| v.name.clone()),
        });

        let mut played = 0;
        for (index, chunk) in self.chunks.iter().enumerate() {
            if self.is_stopped() {
                break;
            }

            self.current_chunk.store(index, Ordering::SeqCst);
            debug!(chunk = index, text = %preview(chunk, LOG_PREVIEW_CHARS), "Speaking chunk");
            self.emit(NarrationEvent::ChunkStarted {
                job_id: self.id,
                index,
            });

            let utterance = Utterance::new(chunk.clone(), locale.clone())
                .with_voice(voice.clone())
                .with_rate(self.config.speech_rate)
                .with_pitch(self.config.speech_pitch)
                .with_volume(self.config.speech_volume);

            // `stop` may have cancelled the platform queue since the check
            // above; queueing now would outlive the cancel.
            if self.is_stopped() {
                break;
            }

            let failure = match self.speech.speak(utterance).await {
                Ok(UtteranceOutcome::Ended) => None,
                Ok(UtteranceOutcome::Failed { reason }) => Some(reason),
                Err(err) => Some(err.to_string()),
            };

            // A stop during the utterance means this chunk belongs to a
            // cancelled job; its outcome is not reported.
            if self.is_stopped() {
                break;
            }

            if let Some(reason) = failure {
                warn!(chunk = index, reason = %reason, "Chunk failed, skipping");
                self.emit(NarrationEvent::ChunkFailed {
                    job_id: self.id,
                    index,
                    reason,
                });
            }
            played += 1;
        }

        let cancelled = self.is_stopped();
        {
            let mut slot = self.slot.lock();
            if slot.as_ref().map(|job| job.id) == Some(self.id) {
                slot.take();
            }
        }

        info!(chunks_played = played, cancelled, "Narration finished");
        self.emit(NarrationEvent::Finished {
            job_id: self.id,
            chunks_played: played,
            cancelled,
        });
        on_end();
    }

    async fn resolve_voice(&self, locale: &str) -> Option<Voice> {
        let voices = match self.speech.voices().await {
            Ok(voices) => voices,
            Err(err) => {
                warn!(error = %err, "Voice list unavailable, using platform default");
                return None;
            }
        };

        select_voice(
            &voices,
            locale,
            &self.language_code,
            &self.config.quality_markers,
        )
        .cloned()
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn emit(&self, event: NarrationEvent) {
        if let Some(bus) = &self.events {
            let _ = bus.emit(CoreEvent::Narration(event));
        }
    }
}
