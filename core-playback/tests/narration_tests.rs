//! Narration sequencer behaviour against a scripted speech engine.

mod support;

use bridge_traits::{SpeechSynthesizer, Voice};
use core_playback::{NarrationConfig, NarrationSequencer};
use core_runtime::events::{CoreEvent, EventBus, NarrationEvent};
use parking_lot::Mutex;
use std::sync::Arc;
use support::{eventually, settle, CallCounter, FakeSpeech};
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

fn sequencer(speech: &Arc<FakeSpeech>) -> NarrationSequencer {
    NarrationSequencer::new(speech.clone(), Arc::new(NarrationConfig::default()))
}

/// Release held utterances one at a time until `counter` fires.
async fn drain(speech: &FakeSpeech, counter: &CallCounter) {
    while counter.count() == 0 {
        assert!(eventually(|| speech.pending_count() > 0 || counter.count() > 0).await);
        speech.release_next();
        settle().await;
    }
}

fn narration_events(rx: &mut core_runtime::events::Receiver<CoreEvent>) -> Vec<NarrationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let CoreEvent::Narration(event) = event {
            events.push(event);
        }
    }
    events
}

/// Runs `action` the first time a log event with `message` is recorded.
struct OnLogMessage {
    message: &'static str,
    action: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

#[derive(Default)]
struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for OnLogMessage {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        if visitor.0 != self.message {
            return;
        }
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }
}

#[tokio::test]
async fn test_chunks_spoken_in_order_and_on_end_fires_once() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    let job = narration.speak("One. Two! Three?", "en", done.callback());
    assert!(job.is_some());

    assert!(eventually(|| done.count() == 1).await);
    settle().await;

    assert_eq!(done.count(), 1);
    assert_eq!(speech.spoken_texts(), vec!["One.", "Two!", "Three?"]);
    assert!(!narration.is_active());
}

#[tokio::test]
async fn test_utterance_parameters_follow_config() {
    let speech = Arc::new(FakeSpeech::new());
    let config = NarrationConfig {
        speech_rate: 1.2,
        speech_pitch: 0.8,
        ..NarrationConfig::default()
    };
    let narration = NarrationSequencer::new(speech.clone(), Arc::new(config));
    let done = CallCounter::new();

    narration.speak("வணக்கம்.", "TA", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].locale, "ta-IN");
    assert_eq!(spoken[0].rate, 1.2);
    assert_eq!(spoken[0].pitch, 0.8);
    assert_eq!(spoken[0].volume, 1.0);
}

#[tokio::test]
async fn test_unknown_language_uses_default_locale() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    narration.speak("Bonjour.", "fr", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    assert_eq!(speech.spoken()[0].locale, "en-US");
}

#[tokio::test]
async fn test_failed_chunk_is_skipped() {
    let speech = Arc::new(FakeSpeech::new());
    speech.fail_text("Two.");
    let events = EventBus::new(32);
    let mut rx = events.subscribe();
    let narration = sequencer(&speech).with_events(events);
    let done = CallCounter::new();

    narration.speak("One. Two. Three.", "en", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    assert_eq!(speech.spoken_texts(), vec!["One.", "Two.", "Three."]);

    let events = narration_events(&mut rx);
    assert!(events.iter().any(|event| matches!(
        event,
        NarrationEvent::ChunkFailed { index: 1, .. }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        NarrationEvent::Finished {
            chunks_played: 3,
            cancelled: false,
            ..
        }
    )));
}

#[tokio::test]
async fn test_every_chunk_failing_still_ends_once() {
    let speech = Arc::new(FakeSpeech::new());
    speech.fail_text("One.");
    speech.reject_text("Two!");
    speech.fail_text("Three?");
    let events = EventBus::new(32);
    let mut rx = events.subscribe();
    let narration = sequencer(&speech).with_events(events);
    let done = CallCounter::new();

    narration.speak("One. Two! Three?", "en", done.callback());
    assert!(eventually(|| done.count() == 1).await);
    settle().await;

    assert_eq!(done.count(), 1);
    assert_eq!(speech.spoken_texts(), vec!["One.", "Two!", "Three?"]);
    assert!(!narration.is_active());

    let events = narration_events(&mut rx);
    let failed: Vec<usize> = events
        .iter()
        .filter_map(|event| match event {
            NarrationEvent::ChunkFailed { index, .. } => Some(*index),
            _ => None,
        })
        .collect();
    assert_eq!(failed, vec![0, 1, 2]);
    assert!(events.iter().any(|event| matches!(
        event,
        NarrationEvent::ChunkFailed { index: 1, reason, .. } if reason.contains("rejected")
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        NarrationEvent::Finished {
            chunks_played: 3,
            cancelled: false,
            ..
        }
    )));
}

#[tokio::test]
async fn test_stop_just_before_queueing_speaks_nothing() {
    let speech = Arc::new(FakeSpeech::new());
    let events = EventBus::new(32);
    let mut rx = events.subscribe();
    let narration = Arc::new(sequencer(&speech).with_events(events));
    let done = CallCounter::new();

    let stopper = Arc::clone(&narration);
    let stop: Box<dyn FnOnce() + Send> = Box::new(move || stopper.stop());
    let layer = OnLogMessage {
        message: "Speaking chunk",
        action: Mutex::new(Some(stop)),
    };
    let _guard = tracing::subscriber::set_default(tracing_subscriber::registry().with(layer));

    narration.speak("One. Two.", "en", done.callback());
    assert!(eventually(|| done.count() == 1).await);
    settle().await;

    assert_eq!(done.count(), 1);
    assert!(speech.spoken().is_empty());
    assert!(narration_events(&mut rx).iter().any(|event| matches!(
        event,
        NarrationEvent::Finished {
            chunks_played: 0,
            cancelled: true,
            ..
        }
    )));
}

#[tokio::test]
async fn test_empty_text_completes_immediately() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    assert_eq!(narration.speak("   ", "en", done.callback()), None);
    assert_eq!(done.count(), 1);

    assert_eq!(narration.speak("", "hi", done.callback()), None);
    assert_eq!(done.count(), 2);

    settle().await;
    assert!(speech.spoken().is_empty());
}

#[tokio::test]
async fn test_text_without_terminal_is_one_chunk() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    narration.speak("  no punctuation here  ", "en", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    assert_eq!(speech.spoken_texts(), vec!["no punctuation here"]);
}

#[tokio::test]
async fn test_new_job_supersedes_running_job() {
    let speech = Arc::new(FakeSpeech::holding());
    let narration = sequencer(&speech);
    let first = CallCounter::new();
    let second = CallCounter::new();

    narration.speak("Alpha one. Alpha two.", "en", first.callback());
    assert!(eventually(|| speech.pending_count() == 1).await);

    narration.speak("Beta one. Beta two.", "en", second.callback());
    assert!(eventually(|| first.count() == 1).await);
    assert_eq!(second.count(), 0);

    drain(&speech, &second).await;
    settle().await;

    assert_eq!(first.count(), 1);
    assert_eq!(second.count(), 1);
    assert_eq!(
        speech.spoken_texts(),
        vec!["Alpha one.", "Beta one.", "Beta two."]
    );
}

#[tokio::test]
async fn test_stop_mid_job_cancels_and_reports_once() {
    let speech = Arc::new(FakeSpeech::holding());
    let events = EventBus::new(32);
    let mut rx = events.subscribe();
    let narration = sequencer(&speech).with_events(events);
    let done = CallCounter::new();

    let job_id = narration
        .speak("First. Second. Third.", "en", done.callback())
        .unwrap();
    assert!(eventually(|| speech.pending_count() == 1).await);

    let status = narration.status().unwrap();
    assert_eq!(status.job_id, job_id);
    assert_eq!(status.chunk_count, 3);
    assert_eq!(status.current_chunk, 0);

    narration.stop();
    assert!(!narration.is_active());
    assert!(eventually(|| done.count() == 1).await);
    settle().await;

    assert_eq!(done.count(), 1);
    assert_eq!(speech.spoken_texts(), vec!["First."]);
    assert!(speech.cancel_calls() >= 1);

    let events = narration_events(&mut rx);
    assert!(events.iter().any(|event| matches!(
        event,
        NarrationEvent::Finished { cancelled: true, .. }
    )));
    assert!(!events
        .iter()
        .any(|event| matches!(event, NarrationEvent::ChunkFailed { .. })));
}

#[tokio::test]
async fn test_stop_when_idle_is_harmless() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);

    narration.stop();
    narration.stop();

    assert!(!narration.is_active());
    assert_eq!(speech.cancel_calls(), 2);
}

#[tokio::test]
async fn test_quality_voice_selected_for_locale() {
    let speech = Arc::new(FakeSpeech::new().with_voices(vec![
        Voice::new("Microsoft Kalpana", "hi-IN"),
        Voice::new("Google हिन्दी", "hi-IN"),
        Voice::new("Google US English", "en-US"),
    ]));
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    narration.speak("नमस्ते। आप कैसे हैं?", "hi", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 2);
    assert_eq!(spoken[0].text, "नमस्ते।");
    for utterance in &spoken {
        assert_eq!(utterance.locale, "hi-IN");
        assert_eq!(
            utterance.voice.as_ref().map(|voice| voice.name.as_str()),
            Some("Google हिन्दी")
        );
    }
}

#[tokio::test]
async fn test_voice_list_failure_uses_platform_default() {
    let speech = Arc::new(FakeSpeech::new().with_failing_voices());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    narration.speak("Hello.", "en", done.callback());
    assert!(eventually(|| done.count() == 1).await);

    assert_eq!(speech.spoken()[0].voice, None);
}

#[tokio::test]
async fn test_pause_and_resume_toggle_engine() {
    let speech = Arc::new(FakeSpeech::holding());
    let narration = sequencer(&speech);
    let done = CallCounter::new();

    narration.speak("Long sentence.", "en", done.callback());
    assert!(eventually(|| speech.pending_count() == 1).await);

    narration.pause();
    assert!(speech.is_paused());
    narration.resume();
    assert!(!speech.is_paused());

    drain(&speech, &done).await;
    assert_eq!(done.count(), 1);
}

#[tokio::test]
async fn test_warm_up_is_silent() {
    let speech = Arc::new(FakeSpeech::new());
    let narration = sequencer(&speech);

    narration.warm_up().await;

    let spoken = speech.spoken();
    assert_eq!(spoken.len(), 1);
    assert_eq!(spoken[0].text, "");
    assert_eq!(spoken[0].volume, 0.0);
    assert_eq!(spoken[0].locale, "en-US");
}
