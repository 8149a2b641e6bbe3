//! Compressed response cache persisted in a single storage slot.
//!
//! The live cache is an insertion-ordered map from request signature to the
//! raw JSON response. On disk it is stored as:
//!
//! # Slot Format
//! - JSON array of `[key, value]` pairs, in map order
//! - gzip compressed
//! - base64 encoded, since storage slots only hold text
//!
//! Scoreboards with thousands of rows compress well, which keeps the slot far
//! below the per-origin storage quota.

use crate::config::CACHE_STORAGE_KEY;
use crate::storage::{DurableStorage, StorageError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use indexmap::IndexMap;
use log::{debug, warn};
use serde_json::Value;
use std::fmt;
use std::io::{Read, Write};

/// Cache key: request signature, stable across reloads.
pub type CacheKey = String;

/// Live cache: signature -> raw response, in insertion order.
pub type CacheMap = IndexMap<CacheKey, Value>;

#[derive(Debug)]
pub enum CacheError {
    Encode(serde_json::Error),
    Compression(std::io::Error),
    Decode(String),
    Storage(StorageError),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Encode(e) => write!(f, "Failed to serialize cache entries: {}", e),
            CacheError::Compression(e) => write!(f, "Failed to compress cache: {}", e),
            CacheError::Decode(reason) => write!(f, "Failed to decode cache: {}", reason),
            CacheError::Storage(e) => write!(f, "Failed to store cache: {}", e),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<StorageError> for CacheError {
    fn from(e: StorageError) -> Self {
        CacheError::Storage(e)
    }
}

/// Serialize, compress and encode the cache for a storage slot.
pub fn encode_cache(map: &CacheMap) -> Result<String, CacheError> {
    let pairs: Vec<(&CacheKey, &Value)> = map.iter().collect();
    let json = serde_json::to_string(&pairs).map_err(CacheError::Encode)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(json.as_bytes())
        .map_err(CacheError::Compression)?;
    let compressed = encoder.finish().map_err(CacheError::Compression)?;

    Ok(STANDARD.encode(compressed))
}

/// Inverse of [`encode_cache`]. Later duplicates of a key win.
pub fn decode_cache(text: &str) -> Result<CacheMap, CacheError> {
    let compressed = STANDARD
        .decode(text.trim())
        .map_err(|e| CacheError::Decode(e.to_string()))?;

    let mut json = String::new();
    GzDecoder::new(&compressed[..])
        .read_to_string(&mut json)
        .map_err(|e| CacheError::Decode(e.to_string()))?;
    if json.trim().is_empty() {
        return Ok(CacheMap::new());
    }

    let pairs: Vec<(CacheKey, Value)> =
        serde_json::from_str(&json).map_err(|e| CacheError::Decode(e.to_string()))?;
    Ok(pairs.into_iter().collect())
}

/// Owner of the persisted cache slot.
pub struct LocalCacheStore<S> {
    storage: S,
    key: String,
}

impl<S: DurableStorage> LocalCacheStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, CACHE_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Read the slot back into a map. A missing, empty or corrupted slot
    /// yields an empty map; corruption is never surfaced to the caller.
    pub fn load(&self) -> CacheMap {
        let Some(text) = self.storage.get(&self.key) else {
            return CacheMap::new();
        };
        if text.is_empty() {
            return CacheMap::new();
        }

        match decode_cache(&text) {
            Ok(map) => {
                debug!("Loaded {} cached responses", map.len());
                map
            }
            Err(e) => {
                warn!("Discarding unreadable cache slot '{}': {}", self.key, e);
                CacheMap::new()
            }
        }
    }

    /// Overwrite the slot with the whole map. Synchronous, so it can run
    /// inside an unload handler.
    pub fn persist(&self, map: &CacheMap) -> Result<(), CacheError> {
        let encoded = encode_cache(map)?;
        self.storage.set(&self.key, &encoded)?;
        debug!(
            "Persisted {} cached responses ({} bytes)",
            map.len(),
            encoded.len()
        );
        Ok(())
    }

    pub fn clear(&self) {
        self.storage.remove(&self.key);
    }
}
