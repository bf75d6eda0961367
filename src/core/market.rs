//! Market data types and the provider abstraction

use crate::core::range::RangeSpec;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single OHLCV sample, stamped in the exchange's local time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Chronologically ordered price bars, oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceHistory {
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(bars: Vec<PriceBar>) -> Self {
        Self { bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn first(&self) -> Option<&PriceBar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }
}

/// Descriptive metadata for a listed company. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompanyInfo {
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub previous_close: Option<f64>,
    pub market_cap: Option<f64>,
}

impl CompanyInfo {
    pub fn display_name(&self) -> Option<&str> {
        first_non_empty(&self.short_name, &self.long_name)
    }
}

impl SearchQuote {
    pub fn display_name(&self) -> Option<&str> {
        first_non_empty(&self.short_name, &self.long_name)
    }
}

fn first_non_empty<'a>(
    preferred: &'a Option<String>,
    fallback: &'a Option<String>,
) -> Option<&'a str> {
    [preferred, fallback]
        .into_iter()
        .filter_map(|name| name.as_deref())
        .find(|name| !name.trim().is_empty())
}

/// Raw symbol lookup result as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuote {
    pub symbol: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayRange {
    pub low: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(rename = "index")]
    pub symbol: String,
    pub current_value: f64,
    pub gain: f64,
    pub gain_percent: f64,
    pub day_range: DayRange,
    #[serde(rename = "price_movement")]
    pub chart: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyStats {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub prev_close: f64,
    pub market_cap: String,
    pub volume: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanySummary {
    pub symbol: String,
    pub name: String,
    pub current_value: f64,
    pub gain: f64,
    pub gain_percent: f64,
    pub stats: CompanyStats,
    #[serde(rename = "price_movement")]
    pub chart: Vec<PricePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMatch {
    pub symbol: String,
    pub name: String,
}

/// The external financial-data source.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Historical bars for `symbol`. An unknown symbol yields an empty history.
    async fn fetch_history(&self, symbol: &str, range: RangeSpec) -> Result<PriceHistory>;

    /// Company metadata, `None` when the provider knows nothing about `symbol`.
    async fn fetch_info(&self, symbol: &str) -> Result<Option<CompanyInfo>>;

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchQuote>>;
}
