//! Web Audio implementation of the audio output bridge.

use async_trait::async_trait;
use bridge_traits::{
    audio::{AudioBuffer, AudioContext, AudioContextFactory, AudioSourceHandle, ContextState},
    error::Result as BridgeResult,
    platform::CompletionCallback,
};
use bytes::Bytes;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use tracing::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBufferSourceNode, AudioContextState};

use crate::error::WasmError;

type SharedCallback = Rc<RefCell<Option<CompletionCallback>>>;

/// Wrapper around a browser `AudioContext`.
pub struct WebAudioContext {
    inner: web_sys::AudioContext,
}

impl WebAudioContext {
    /// Create a context at the device's native sample rate.
    pub fn new() -> BridgeResult<Self> {
        let inner =
            web_sys::AudioContext::new().map_err(|err| WasmError::js("AudioContext", err))?;
        debug!(sample_rate = inner.sample_rate(), "Created Web Audio context");
        Ok(Self { inner })
    }

    /// Release the underlying device.
    pub async fn close(&self) -> BridgeResult<()> {
        let promise = self
            .inner
            .close()
            .map_err(|err| WasmError::js("AudioContext.close", err))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| WasmError::js("AudioContext.close", err))?;
        Ok(())
    }

    fn to_native_buffer(&self, buffer: &AudioBuffer) -> BridgeResult<web_sys::AudioBuffer> {
        let native = self
            .inner
            .create_buffer(
                u32::from(buffer.number_of_channels()),
                buffer.length().max(1) as u32,
                buffer.sample_rate() as f32,
            )
            .map_err(|err| WasmError::js("createBuffer", err))?;

        for (index, channel) in buffer.channels().enumerate() {
            let mut samples = channel.to_vec();
            native
                .copy_to_channel(&mut samples, index as i32)
                .map_err(|err| WasmError::js("copyToChannel", err))?;
        }

        Ok(native)
    }
}

fn from_native_buffer(native: &web_sys::AudioBuffer) -> BridgeResult<AudioBuffer> {
    let channels = (0..native.number_of_channels())
        .map(|index| {
            native
                .get_channel_data(index)
                .map_err(|err| WasmError::js("getChannelData", err))
        })
        .collect::<Result<Vec<_>, _>>()?;

    AudioBuffer::new(channels, native.sample_rate() as u32)
}

#[async_trait(?Send)]
impl AudioContext for WebAudioContext {
    fn state(&self) -> ContextState {
        match self.inner.state() {
            AudioContextState::Running => ContextState::Running,
            AudioContextState::Closed => ContextState::Closed,
            _ => ContextState::Suspended,
        }
    }

    fn sample_rate(&self) -> u32 {
        self.inner.sample_rate() as u32
    }

    async fn resume(&self) -> BridgeResult<()> {
        let promise = self
            .inner
            .resume()
            .map_err(|err| WasmError::js("AudioContext.resume", err))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| WasmError::js("AudioContext.resume", err))?;
        Ok(())
    }

    async fn suspend(&self) -> BridgeResult<()> {
        let promise = self
            .inner
            .suspend()
            .map_err(|err| WasmError::js("AudioContext.suspend", err))?;
        JsFuture::from(promise)
            .await
            .map_err(|err| WasmError::js("AudioContext.suspend", err))?;
        Ok(())
    }

    fn start_source(
        &self,
        buffer: Arc<AudioBuffer>,
        on_ended: CompletionCallback,
    ) -> BridgeResult<Box<dyn AudioSourceHandle>> {
        let native_buffer = self.to_native_buffer(&buffer)?;
        let node = self
            .inner
            .create_buffer_source()
            .map_err(|err| WasmError::js("createBufferSource", err))?;
        node.set_buffer(Some(&native_buffer));
        node.connect_with_audio_node(&self.inner.destination())
            .map_err(|err| WasmError::js("connect", err))?;

        // `ended` also fires after an explicit stop, so the callback lives in a
        // slot that `detach_ended` can empty first.
        let slot: SharedCallback = Rc::new(RefCell::new(Some(on_ended)));
        let listener = {
            let slot = Rc::clone(&slot);
            Closure::once_into_js(move || {
                let on_ended = slot.borrow_mut().take();
                if let Some(on_ended) = on_ended {
                    on_ended();
                }
            })
        };
        node.set_onended(Some(listener.unchecked_ref()));

        node.start()
            .map_err(|err| WasmError::js("AudioBufferSourceNode.start", err))?;

        Ok(Box::new(WebAudioSource { node, slot }))
    }

    async fn decode_audio_data(&self, data: Bytes) -> BridgeResult<AudioBuffer> {
        let array = js_sys::Uint8Array::from(data.as_ref());
        let promise = self
            .inner
            .decode_audio_data(&array.buffer())
            .map_err(|err| WasmError::js("decodeAudioData", err))?;
        let decoded = JsFuture::from(promise)
            .await
            .map_err(|err| WasmError::js("decodeAudioData", err))?;
        let native = decoded
            .dyn_into::<web_sys::AudioBuffer>()
            .map_err(|value| WasmError::UnexpectedType(format!("{value:?}")))?;

        from_native_buffer(&native)
    }
}

struct WebAudioSource {
    node: AudioBufferSourceNode,
    slot: SharedCallback,
}

impl AudioSourceHandle for WebAudioSource {
    fn detach_ended(&mut self) {
        self.slot.borrow_mut().take();
    }

    fn stop(&mut self) -> BridgeResult<()> {
        self.node
            .stop()
            .map_err(|err| WasmError::js("AudioBufferSourceNode.stop", err))?;
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Err(err) = self.node.disconnect() {
            debug!(error = %crate::error::js_message(&err), "Source already disconnected");
        }
    }
}

/// Creates [`WebAudioContext`]s without forcing a sample rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebAudioContextFactory;

impl WebAudioContextFactory {
    /// Create the factory.
    pub fn new() -> Self {
        Self
    }
}

impl AudioContextFactory for WebAudioContextFactory {
    fn create_context(&self) -> BridgeResult<Arc<dyn AudioContext>> {
        Ok(Arc::new(WebAudioContext::new()?))
    }
}
