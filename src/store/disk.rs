use crate::core::cache::KeyValueCollection;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

const HEADER_LEN: usize = 8;
const NO_EXPIRY: u64 = 0;

/// Collection persisted in a fjall partition, so entries outlive a restart.
///
/// Each stored value is prefixed with its expiry as big-endian unix
/// milliseconds, `0` meaning the entry never expires.
pub struct DiskCollection {
    _keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn open(path: &Path, name: &str) -> Result<Self> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;

        let keyspace = fjall::Config::new(path)
            .open()
            .with_context(|| format!("Failed to open cache keyspace: {}", path.display()))?;
        let partition = keyspace
            .open_partition(name, PartitionCreateOptions::default())
            .with_context(|| format!("Failed to open cache partition: {name}"))?;

        Ok(Self {
            _keyspace: keyspace,
            partition,
        })
    }

    fn encode(value: Vec<u8>, ttl: Option<Duration>) -> Vec<u8> {
        let expires_at = ttl
            .map(|ttl| unix_millis(SystemTime::now() + ttl))
            .unwrap_or(NO_EXPIRY);
        let mut bytes = Vec::with_capacity(HEADER_LEN + value.len());
        bytes.extend_from_slice(&expires_at.to_be_bytes());
        bytes.extend(value);
        bytes
    }

    /// Splits a stored record into its expiry and payload.
    fn decode(bytes: &[u8]) -> Option<(u64, &[u8])> {
        let (header, payload) = bytes.split_at_checked(HEADER_LEN)?;
        let expires_at = u64::from_be_bytes(header.try_into().ok()?);
        Some((expires_at, payload))
    }

    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(stored) = self.partition.get(key.as_bytes())? else {
            debug!("Cache MISS for key: {}", key);
            return Ok(None);
        };

        match Self::decode(&stored) {
            Some((expires_at, _))
                if expires_at != NO_EXPIRY && expires_at <= unix_millis(SystemTime::now()) =>
            {
                debug!("Cache entry expired for key: {}", key);
                self.partition.remove(key.as_bytes())?;
                Ok(None)
            }
            Some((_, payload)) => {
                debug!("Cache HIT for key: {}", key);
                Ok(Some(payload.to_vec()))
            }
            None => {
                debug!("Dropping malformed cache record for key: {}", key);
                self.partition.remove(key.as_bytes())?;
                Ok(None)
            }
        }
    }
}

fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(NO_EXPIRY)
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        match self.read(key) {
            Ok(value) => value,
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) {
        match self
            .partition
            .insert(key.as_bytes(), Self::encode(value, ttl))
        {
            Ok(()) => debug!("Cache PUT for key: {}", key),
            Err(e) => debug!("DiskCollection put error: {}", e),
        }
    }
}
