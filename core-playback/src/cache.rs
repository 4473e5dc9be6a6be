//! # Decoded Audio Cache
//!
//! Persists decoded [`AudioBuffer`]s in a host [`KeyValueStore`] so repeated
//! narration of the same content skips base64 and PCM decoding.
//!
//! ## Entry Layout
//!
//! ```text
//! ┌──────┬─────────────┬──────────┬────────┬──────────────────────────────┐
//! │ NAB1 │ sample_rate │ channels │ frames │ planar f32 samples           │
//! │ 4 B  │ u32 LE      │ u16 LE   │ u32 LE │ channels × frames × 4 B (LE) │
//! └──────┴─────────────┴──────────┴────────┴──────────────────────────────┘
//! ```
//!
//! The cache is best-effort: store failures and unreadable entries are
//! logged and behave as misses.

use crate::error::{PlaybackError, Result};
use bridge_traits::{AudioBuffer, KeyValueStore};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, warn};

const MAGIC: &[u8; 4] = b"NAB1";
const HEADER_LEN: usize = 4 + 4 + 2 + 4;

/// Namespaced cache of decoded audio.
#[derive(Clone)]
pub struct AudioCache {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl AudioCache {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Fully qualified store key for `content_key`.
    pub fn storage_key(&self, content_key: &str) -> String {
        format!("{}:{}", self.namespace, content_key)
    }

    /// Look up a buffer. Any failure is reported as a miss.
    pub async fn get(&self, content_key: &str) -> Option<AudioBuffer> {
        let key = self.storage_key(content_key);

        let bytes = match self.store.get(&key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!(key = %key, "Audio cache miss");
                return None;
            }
            Err(err) => {
                let err = PlaybackError::Persistence(err.to_string());
                warn!(key = %key, error = %err, "Audio cache read failed");
                return None;
            }
        };

        match decode_entry(bytes) {
            Ok(buffer) => {
                debug!(key = %key, frames = buffer.length(), "Audio cache hit");
                Some(buffer)
            }
            Err(err) => {
                warn!(key = %key, error = %err, "Discarding unreadable audio cache entry");
                None
            }
        }
    }

    /// Store a buffer. Failures are logged and otherwise ignored.
    pub async fn put(&self, content_key: &str, buffer: &AudioBuffer) {
        let key = self.storage_key(content_key);
        if let Err(err) = self.store.put(&key, encode_entry(buffer)).await {
            let err = PlaybackError::Persistence(err.to_string());
            warn!(key = %key, error = %err, "Audio cache write failed");
        }
    }

    /// Drop an entry. Failures are logged and otherwise ignored.
    pub async fn remove(&self, content_key: &str) {
        let key = self.storage_key(content_key);
        if let Err(err) = self.store.delete(&key).await {
            warn!(key = %key, error = %err, "Audio cache delete failed");
        }
    }
}

impl std::fmt::Debug for AudioCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCache")
            .field("namespace", &self.namespace)
            .finish()
    }
}

/// Serialize a buffer into the cache entry layout.
pub fn encode_entry(buffer: &AudioBuffer) -> Bytes {
    let channels = buffer.number_of_channels();
    let frames = buffer.length();
    let mut out = BytesMut::with_capacity(HEADER_LEN + usize::from(channels) * frames * 4);

    out.put_slice(MAGIC);
    out.put_u32_le(buffer.sample_rate());
    out.put_u16_le(channels);
    out.put_u32_le(u32::try_from(frames).unwrap_or(u32::MAX));

    for channel in buffer.channels() {
        for sample in channel {
            out.put_f32_le(*sample);
        }
    }

    out.freeze()
}

/// Parse a cache entry back into a buffer.
pub fn decode_entry(mut bytes: Bytes) -> Result<AudioBuffer> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(PlaybackError::Persistence(
            "cache entry has no valid header".to_string(),
        ));
    }
    bytes.advance(4);

    let sample_rate = bytes.get_u32_le();
    let channels = usize::from(bytes.get_u16_le());
    let frames = bytes.get_u32_le() as usize;

    let expected = channels
        .checked_mul(frames)
        .and_then(|samples| samples.checked_mul(4));
    if expected != Some(bytes.remaining()) {
        return Err(PlaybackError::Persistence(format!(
            "cache entry truncated: expected {} channels x {} frames, found {} bytes",
            channels,
            frames,
            bytes.remaining()
        )));
    }

    let planar: Vec<Vec<f32>> = (0..channels)
        .map(|_| (0..frames).map(|_| bytes.get_f32_le()).collect())
        .collect();

    AudioBuffer::new(planar, sample_rate).map_err(|e| PlaybackError::Persistence(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::BridgeError;
    use mockall::{mock, predicate};

    mock! {
        Store {}

        #[async_trait::async_trait]
        impl KeyValueStore for Store {
            async fn get(&self, key: &str) -> BridgeResult<Option<Bytes>>;
            async fn put(&self, key: &str, value: Bytes) -> BridgeResult<()>;
            async fn delete(&self, key: &str) -> BridgeResult<()>;
            async fn contains(&self, key: &str) -> BridgeResult<bool>;
        }
    }

    #[tokio::test]
    async fn read_failure_is_a_miss() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .with(predicate::eq("narration-audio:chapter-1"))
            .returning(|_| Err(BridgeError::OperationFailed("database is locked".into())));

        let cache = AudioCache::new(Arc::new(store), "narration-audio");
        assert!(cache.get("chapter-1").await.is_none());
    }

    #[tokio::test]
    async fn corrupt_entry_is_a_miss() {
        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(Bytes::from_static(b"not an entry"))));

        let cache = AudioCache::new(Arc::new(store), "narration-audio");
        assert!(cache.get("chapter-1").await.is_none());
    }

    #[tokio::test]
    async fn write_failure_is_swallowed() {
        let mut store = MockStore::new();
        store
            .expect_put()
            .withf(|key, value| key == "tts:intro" && value.starts_with(b"NAB1"))
            .times(1)
            .returning(|_, _| Err(BridgeError::OperationFailed("quota exceeded".into())));

        let cache = AudioCache::new(Arc::new(store), "tts");
        let buffer = AudioBuffer::mono(vec![0.1, 0.2], 24_000).unwrap();
        cache.put("intro", &buffer).await;
    }

    #[tokio::test]
    async fn stored_entry_is_served() {
        let buffer = AudioBuffer::mono(vec![0.1, -0.2, 0.3], 24_000).unwrap();
        let entry = encode_entry(&buffer);

        let mut store = MockStore::new();
        store
            .expect_get()
            .returning(move |_| Ok(Some(entry.clone())));

        let cache = AudioCache::new(Arc::new(store), "narration-audio");
        assert_eq!(cache.get("intro").await, Some(buffer));
    }

    #[test]
    fn entry_preserves_planar_samples() {
        let buffer =
            AudioBuffer::new(vec![vec![0.25, -0.5], vec![1.0, -1.0]], 22_050).unwrap();

        let decoded = decode_entry(encode_entry(&buffer)).unwrap();
        assert_eq!(decoded, buffer);
    }

    #[test]
    fn entry_starts_with_magic_and_header() {
        let buffer = AudioBuffer::mono(vec![0.0; 3], 24_000).unwrap();
        let entry = encode_entry(&buffer);

        assert_eq!(&entry[..4], b"NAB1");
        assert_eq!(entry.len(), HEADER_LEN + 3 * 4);
    }

    #[test]
    fn foreign_or_truncated_entries_are_rejected() {
        assert!(decode_entry(Bytes::from_static(b"RIFF0000000000")).is_err());
        assert!(decode_entry(Bytes::from_static(b"NAB1")).is_err());

        let buffer = AudioBuffer::mono(vec![0.5; 4], 24_000).unwrap();
        let entry = encode_entry(&buffer);
        let truncated = entry.slice(..entry.len() - 2);
        assert!(matches!(
            decode_entry(truncated),
            Err(PlaybackError::Persistence(_))
        ));
    }

    #[test]
    fn zero_channel_header_is_rejected() {
        let mut raw = BytesMut::new();
        raw.put_slice(MAGIC);
        raw.put_u32_le(24_000);
        raw.put_u16_le(0);
        raw.put_u32_le(0);
        assert!(decode_entry(raw.freeze()).is_err());
    }
}
