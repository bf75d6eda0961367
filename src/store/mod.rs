pub mod disk;
pub mod memory;

use crate::core::cache::KeyValueCollection;
use crate::core::config::{AppConfig, CacheBackend};
use anyhow::Result;
use disk::DiskCollection;
use memory::MemoryCollection;
use std::sync::Arc;
use tracing::info;

const MARKET_PARTITION: &str = "market";

/// Opens the cache collection selected by `config.cache.backend`.
pub fn open_collection(config: &AppConfig) -> Result<Arc<dyn KeyValueCollection>> {
    match config.cache.backend {
        CacheBackend::Memory => {
            info!("Using in-memory market data cache");
            Ok(Arc::new(MemoryCollection::new()))
        }
        CacheBackend::Disk => {
            let path = config.default_data_path()?.join("cache");
            info!("Using on-disk market data cache at {}", path.display());
            Ok(Arc::new(DiskCollection::open(&path, MARKET_PARTITION)?))
        }
    }
}
