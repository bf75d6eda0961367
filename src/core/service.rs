//! Read-through orchestration of range resolution, provider fetches,
//! formatting and caching for the public market data operations.

use crate::core::cache::{self, CacheNamespace, KeyValueCollection, cache_key};
use crate::core::error::{MarketError, Result};
use crate::core::magnitude::{format_market_cap, format_volume};
use crate::core::market::{
    CompanyInfo, CompanyMatch, CompanyStats, CompanySummary, MarketDataProvider, MarketSummary,
};
use crate::core::range::RangeKey;
use crate::core::series::{self, SeriesStats, SessionStats, round2};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(60);
pub const OVERVIEW_CHART_POINTS: usize = 50;
pub const COMPANY_CHART_POINTS: usize = 60;
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    cache: Arc<dyn KeyValueCollection>,
    ttl: Duration,
}

impl MarketDataService {
    pub fn new(
        provider: Arc<dyn MarketDataProvider>,
        cache: Arc<dyn KeyValueCollection>,
        ttl: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            ttl,
        }
    }

    /// Close-price summary of an index with its 50 most recent chart points.
    #[instrument(name = "IndexOverview", skip(self))]
    pub async fn get_index_overview(
        &self,
        symbol: &str,
        range_key: &str,
    ) -> Result<MarketSummary> {
        let range = RangeKey::parse_lenient(range_key);
        let key = cache_key(CacheNamespace::IndexOverview, symbol, range);
        if let Some(cached) = cache::get_json::<MarketSummary>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let history = self.provider.fetch_history(symbol, range.spec()).await?;
        if history.is_empty() {
            debug!("Empty history for {symbol} ({range})");
            return Err(MarketError::EmptySeries);
        }

        let chart = series::format_chart(&history, range)?;
        let stats = SeriesStats::from_history(&history)?;

        let summary = MarketSummary {
            symbol: symbol.to_string(),
            current_value: stats.current_value,
            gain: stats.gain,
            gain_percent: stats.gain_percent,
            day_range: stats.day_range,
            chart: series::most_recent(chart, OVERVIEW_CHART_POINTS),
        };

        cache::put_json(self.cache.as_ref(), &key, &summary, self.ttl).await;
        Ok(summary)
    }

    /// Price summary, session statistics and 60-point chart for one company.
    #[instrument(name = "CompanyDetail", skip(self))]
    pub async fn get_company_detail(
        &self,
        symbol: &str,
        range_key: &str,
    ) -> Result<CompanySummary> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(MarketError::InvalidRequest("Symbol is required".to_string()));
        }

        let range = RangeKey::parse_lenient(range_key);
        let key = cache_key(CacheNamespace::CompanyDetail, symbol, range);
        if let Some(cached) = cache::get_json::<CompanySummary>(self.cache.as_ref(), &key).await {
            return Ok(cached);
        }

        let history = self.provider.fetch_history(symbol, range.spec()).await?;
        if history.is_empty() {
            debug!("Empty history for {symbol} ({range})");
            return Err(MarketError::EmptySeries);
        }

        let chart = series::format_chart(&history, range)?;
        let stats = SeriesStats::from_history(&history)?;
        let session = SessionStats::from_history(&history)?;
        let info = self.company_info(symbol).await;

        let summary = CompanySummary {
            symbol: symbol.to_string(),
            name: info.display_name().unwrap_or(symbol).to_string(),
            current_value: stats.current_value,
            gain: stats.gain,
            gain_percent: stats.gain_percent,
            stats: CompanyStats {
                open: session.open,
                high: session.high,
                low: session.low,
                prev_close: round2(info.previous_close.unwrap_or(stats.first_close)),
                market_cap: format_market_cap(info.market_cap),
                volume: format_volume(Some(session.volume)),
            },
            chart: series::most_recent(chart, COMPANY_CHART_POINTS),
        };

        cache::put_json(self.cache.as_ref(), &key, &summary, self.ttl).await;
        Ok(summary)
    }

    /// Metadata is optional decoration; an absent or failed lookup yields defaults.
    async fn company_info(&self, symbol: &str) -> CompanyInfo {
        match self.provider.fetch_info(symbol).await {
            Ok(Some(info)) => info,
            Ok(None) => {
                debug!("No company metadata for {symbol}");
                CompanyInfo::default()
            }
            Err(e) => {
                warn!(error = %e, "Company metadata lookup failed for {symbol}");
                CompanyInfo::default()
            }
        }
    }

    /// Symbol/name matches for `query`, sorted by name and capped at `limit`.
    #[instrument(name = "CompanySearch", skip(self))]
    pub async fn search_companies(&self, query: &str, limit: usize) -> Result<Vec<CompanyMatch>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let quotes = self.provider.search(query, limit).await?;

        let mut matches: Vec<CompanyMatch> = quotes
            .iter()
            .filter_map(|quote| {
                let symbol = quote.symbol.as_deref().filter(|s| !s.trim().is_empty())?;
                let name = quote.display_name()?;
                Some(CompanyMatch {
                    symbol: symbol.to_string(),
                    name: name.to_string(),
                })
            })
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));
        matches.truncate(limit);

        debug!("{} of {} search results kept", matches.len(), quotes.len());
        Ok(matches)
    }
}
