//! Key-value persistence abstraction.
//!
//! Used by the core to cache decoded narration audio between sessions:
//! - Desktop: SQLite
//! - Web: `localStorage` / IndexedDB
//! - Mobile: app-sandboxed stores
//!
//! Every operation returns an explicit `Result`; callers decide how a failure
//! degrades (the playback core treats it as a cache miss).
//!
//! # Example
//!
//! ```ignore
//! use bridge_traits::storage::KeyValueStore;
//!
//! async fn remember(store: &dyn KeyValueStore, pcm: bytes::Bytes) -> Result<()> {
//!     store.put("narration-audio:intro", pcm).await
//! }
//! ```

use bytes::Bytes;

use crate::{error::Result, platform::PlatformSendSync};

/// Asynchronous byte-oriented key-value store.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait KeyValueStore: PlatformSendSync {
    /// Fetch a value. `Ok(None)` means the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Store a value, replacing any previous one.
    async fn put(&self, key: &str, value: Bytes) -> Result<()>;

    /// Remove a value. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check whether a key is present.
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }
}
