//! Web Speech API implementation of [`SpeechSynthesizer`].
//!
//! Browsers populate the voice list asynchronously; [`voices`] waits for the
//! `voiceschanged` event, bounded by a timeout, when the list is still empty.
//! Each utterance keeps its JS object and event closures alive until the
//! engine reports `end` or `error`, which also guards against engines that
//! garbage-collect in-flight utterances.
//!
//! [`voices`]: SpeechSynthesizer::voices

use async_trait::async_trait;
use bridge_traits::{
    error::Result as BridgeResult,
    speech::{SpeechSynthesizer, Utterance, UtteranceOutcome, Voice},
};
use futures::channel::oneshot;
use futures::future::{self, Either};
use gloo_timers::future::TimeoutFuture;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{SpeechSynthesis, SpeechSynthesisUtterance, SpeechSynthesisVoice};

use crate::error::WasmError;

/// Default bound on waiting for `voiceschanged`.
pub const DEFAULT_VOICES_TIMEOUT_MS: u32 = 1_500;

type OutcomeSender = Rc<RefCell<Option<oneshot::Sender<UtteranceOutcome>>>>;

/// Browser `speechSynthesis` wrapper.
pub struct WebSpeechSynthesizer {
    synth: SpeechSynthesis,
    voices_timeout_ms: u32,
}

impl WebSpeechSynthesizer {
    /// Bind to `window.speechSynthesis`.
    pub fn new() -> BridgeResult<Self> {
        let window = web_sys::window().ok_or_else(|| WasmError::NotAvailable("window".into()))?;
        let synth = window
            .speech_synthesis()
            .map_err(|_| WasmError::NotAvailable("speechSynthesis".into()))?;

        Ok(Self {
            synth,
            voices_timeout_ms: DEFAULT_VOICES_TIMEOUT_MS,
        })
    }

    /// Override how long [`SpeechSynthesizer::voices`] waits for a lazy list.
    pub fn with_voices_timeout(mut self, timeout_ms: u32) -> Self {
        self.voices_timeout_ms = timeout_ms;
        self
    }

    fn native_voices(&self) -> Vec<SpeechSynthesisVoice> {
        self.synth
            .get_voices()
            .iter()
            .filter_map(|value| value.dyn_into::<SpeechSynthesisVoice>().ok())
            .collect()
    }

    fn find_native_voice(&self, voice: &Voice) -> Option<SpeechSynthesisVoice> {
        self.native_voices()
            .into_iter()
            .find(|native| native.name() == voice.name && native.lang() == voice.lang)
    }

    async fn wait_for_voices(&self) {
        let (sender, receiver) = oneshot::channel::<()>();
        let sender = RefCell::new(Some(sender));
        let on_changed = Closure::<dyn FnMut()>::new(move || {
            if let Some(sender) = sender.borrow_mut().take() {
                let _ = sender.send(());
            }
        });

        self.synth
            .set_onvoiceschanged(Some(on_changed.as_ref().unchecked_ref()));

        match future::select(receiver, TimeoutFuture::new(self.voices_timeout_ms)).await {
            Either::Left(_) => debug!("Speech voices became available"),
            Either::Right(_) => warn!(
                timeout_ms = self.voices_timeout_ms,
                "Timed out waiting for speech voices"
            ),
        }

        self.synth.set_onvoiceschanged(None);
    }
}

fn to_voice(native: &SpeechSynthesisVoice) -> Voice {
    Voice {
        name: native.name(),
        lang: native.lang(),
        local_service: native.local_service(),
        default: native.default(),
    }
}

fn resolve(sender: &OutcomeSender, outcome: UtteranceOutcome) {
    if let Some(sender) = sender.borrow_mut().take() {
        let _ = sender.send(outcome);
    }
}

#[async_trait(?Send)]
impl SpeechSynthesizer for WebSpeechSynthesizer {
    async fn voices(&self) -> BridgeResult<Vec<Voice>> {
        let mut voices = self.native_voices();
        if voices.is_empty() {
            self.wait_for_voices().await;
            voices = self.native_voices();
        }
        Ok(voices.iter().map(to_voice).collect())
    }

    async fn speak(&self, utterance: Utterance) -> BridgeResult<UtteranceOutcome> {
        let native = SpeechSynthesisUtterance::new_with_text(&utterance.text)
            .map_err(|err| WasmError::js("SpeechSynthesisUtterance", err))?;
        native.set_lang(&utterance.locale);
        native.set_rate(utterance.rate);
        native.set_pitch(utterance.pitch);
        native.set_volume(utterance.volume);

        if let Some(voice) = &utterance.voice {
            match self.find_native_voice(voice) {
                Some(native_voice) => native.set_voice(Some(&native_voice)),
                None => debug!(voice = %voice.name, "Requested voice no longer offered"),
            }
        }

        let (sender, receiver) = oneshot::channel();
        let sender: OutcomeSender = Rc::new(RefCell::new(Some(sender)));

        let on_end = {
            let sender = Rc::clone(&sender);
            Closure::<dyn FnMut(web_sys::Event)>::new(move |_event: web_sys::Event| {
                resolve(&sender, UtteranceOutcome::Ended);
            })
        };
        let on_error = {
            let sender = Rc::clone(&sender);
            Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
                let reason = js_sys::Reflect::get(&event, &JsValue::from_str("error"))
                    .ok()
                    .and_then(|value| value.as_string())
                    .unwrap_or_else(|| "unknown".to_string());
                resolve(&sender, UtteranceOutcome::Failed { reason });
            })
        };

        native.set_onend(Some(on_end.as_ref().unchecked_ref()));
        native.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        self.synth.speak(&native);

        let outcome = receiver.await.unwrap_or(UtteranceOutcome::Failed {
            reason: "utterance dropped".to_string(),
        });

        native.set_onend(None);
        native.set_onerror(None);
        drop(on_end);
        drop(on_error);

        Ok(outcome)
    }

    fn cancel(&self) {
        self.synth.cancel();
    }

    fn pause(&self) {
        self.synth.pause();
    }

    fn resume(&self) {
        self.synth.resume();
    }

    fn is_speaking(&self) -> bool {
        self.synth.speaking()
    }

    fn is_paused(&self) -> bool {
        self.synth.paused()
    }
}
