use crate::core::cache::KeyValueCollection;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::debug;

struct CacheValue {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl CacheValue {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|expiry| expiry <= now)
    }
}

/// Process-local collection backed by a `HashMap`.
#[derive(Default)]
pub struct MemoryCollection {
    inner: Mutex<HashMap<String, CacheValue>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl KeyValueCollection for MemoryCollection {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut cache = self.inner.lock().await;
        let now = Instant::now();
        match cache.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!("Cache entry expired for key: {}", key);
                cache.remove(key);
                None
            }
            Some(entry) => {
                debug!("Cache HIT for key: {}", key);
                Some(entry.value.clone())
            }
            None => {
                debug!("Cache MISS for key: {}", key);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        let now = Instant::now();
        let expires_at = ttl.map(|duration| now + duration);
        let mut cache = self.inner.lock().await;

        let before = cache.len();
        cache.retain(|_, entry| !entry.is_expired(now));
        if cache.len() < before {
            debug!("Evicted {} expired cache entries", before - cache.len());
        }

        debug!("Cache PUT for key: {}", key);
        cache.insert(key.to_string(), CacheValue { value, expires_at });
    }
}
