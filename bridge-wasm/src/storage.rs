//! `localStorage` implementation of the key-value bridge.
//!
//! Values are base64 encoded because `localStorage` only holds strings. Keys
//! are prefixed with a namespace so several host shells can share an origin.
//! Writes that exceed the origin quota surface as errors; the playback core
//! treats them as cache misses.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bridge_traits::{error::Result as BridgeResult, storage::KeyValueStore};
use bytes::Bytes;
use tracing::debug;

use crate::error::WasmError;

fn local_storage() -> Result<web_sys::Storage, WasmError> {
    let window = web_sys::window().ok_or_else(|| WasmError::NotAvailable("window".into()))?;
    window
        .local_storage()
        .map_err(|err| WasmError::js("localStorage", err))?
        .ok_or_else(|| WasmError::NotAvailable("localStorage".into()))
}

/// Browser-backed byte store.
#[derive(Clone)]
pub struct LocalStorageKeyValueStore {
    storage: web_sys::Storage,
    namespace: String,
}

impl LocalStorageKeyValueStore {
    /// Open the origin's `localStorage`, scoping keys under `namespace`.
    pub fn new(namespace: impl Into<String>) -> BridgeResult<Self> {
        Ok(Self {
            storage: local_storage()?,
            namespace: namespace.into(),
        })
    }

    fn scoped(&self, key: &str) -> String {
        format!("{}::kv::{}", self.namespace, key)
    }
}

#[async_trait(?Send)]
impl KeyValueStore for LocalStorageKeyValueStore {
    async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>> {
        let stored = self
            .storage
            .get_item(&self.scoped(key))
            .map_err(|err| WasmError::js("get_item", err))?;

        let Some(encoded) = stored else {
            return Ok(None);
        };

        let decoded = BASE64
            .decode(encoded)
            .map_err(|err| WasmError::Corrupt(format!("{key}: {err}")))?;
        Ok(Some(Bytes::from(decoded)))
    }

    async fn put(&self, key: &str, value: Bytes) -> BridgeResult<()> {
        let encoded = BASE64.encode(&value);
        self.storage
            .set_item(&self.scoped(key), &encoded)
            .map_err(|err| WasmError::js("set_item", err))?;

        debug!(key, bytes = value.len(), "Stored value in localStorage");
        Ok(())
    }

    async fn delete(&self, key: &str) -> BridgeResult<()> {
        self.storage
            .remove_item(&self.scoped(key))
            .map_err(|err| WasmError::js("remove_item", err))?;
        Ok(())
    }
}
