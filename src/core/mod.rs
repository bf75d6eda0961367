//! Market data retrieval, normalization and caching

pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod magnitude;
pub mod market;
pub mod range;
pub mod series;
pub mod service;

// Re-export main types for cleaner imports
pub use cache::{CacheNamespace, KeyValueCollection};
pub use error::MarketError;
pub use market::{
    CompanyInfo, CompanyMatch, CompanySummary, MarketDataProvider, MarketSummary, PriceHistory,
    PricePoint,
};
pub use range::{RangeKey, RangeSpec};
pub use service::MarketDataService;
