//! Per-provider cache of public verification keys.
//!
//! Entries are never evicted proactively; expiry is checked on lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::DecodingKey;
use parking_lot::RwLock;

struct CachedKey {
    key: Arc<DecodingKey>,
    expires_at: DateTime<Utc>,
}

/// Key id → public key map with per-entry expiry.
///
/// Safe for concurrent readers and writers. Each provider owns its own
/// instance; caches are not shared across providers.
#[derive(Default)]
pub struct PublicKeyCache {
    entries: RwLock<HashMap<String, CachedKey>>,
}

impl PublicKeyCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the key for `key_id`, or `None` if absent or expired.
    pub fn get(&self, key_id: &str) -> Option<Arc<DecodingKey>> {
        let entries = self.entries.read();
        let entry = entries.get(key_id)?;
        if Utc::now() < entry.expires_at {
            Some(Arc::clone(&entry.key))
        } else {
            None
        }
    }

    /// Inserts or overwrites the key for `key_id`.
    pub fn add(&self, key_id: impl Into<String>, key: DecodingKey, expires_at: DateTime<Utc>) {
        self.entries.write().insert(
            key_id.into(),
            CachedKey {
                key: Arc::new(key),
                expires_at,
            },
        );
    }

    /// Removes every entry.
    pub fn reset(&self) {
        self.entries.write().clear();
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl fmt::Debug for PublicKeyCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyCache")
            .field("entries", &self.len())
            .finish()
    }
}
