//! Cache abstraction shared by the market data service and its storage backends.

use crate::core::range::RangeKey;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Display;
use std::time::Duration;
use tracing::{debug, warn};

/// A byte-oriented key/value collection with per-entry expiry.
///
/// Implementations must be safe to share between concurrently handled
/// requests. Racing writes to the same key are last-write-wins.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    /// Returns the live value for `key`, or `None` on a miss or expired entry.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`; `None` ttl keeps it until overwritten.
    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>);
}

/// Distinguishes the kinds of payload kept in one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
    IndexOverview,
    CompanyDetail,
}

impl Display for CacheNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                CacheNamespace::IndexOverview => "index-overview",
                CacheNamespace::CompanyDetail => "company-detail",
            }
        )
    }
}

/// Builds the composite `namespace:symbol:range` key.
pub fn cache_key(namespace: CacheNamespace, symbol: &str, range: RangeKey) -> String {
    format!("{namespace}:{symbol}:{range}")
}

/// Reads and decodes a JSON value. Undecodable entries count as a miss.
pub async fn get_json<T: DeserializeOwned>(
    collection: &dyn KeyValueCollection,
    key: &str,
) -> Option<T> {
    let bytes = collection.get(key).await?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(error = %e, key, "Discarding undecodable cache entry");
            None
        }
    }
}

/// Encodes `value` as JSON and stores it with the given ttl.
pub async fn put_json<T: Serialize>(
    collection: &dyn KeyValueCollection,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    match serde_json::to_vec(value) {
        Ok(bytes) => collection.put(key, bytes, Some(ttl)).await,
        Err(e) => debug!(error = %e, key, "Skipping cache write for unserializable value"),
    }
}
