//! Turns raw OHLCV history into chart points and summary statistics.

use crate::core::error::{MarketError, Result};
use crate::core::market::{DayRange, PriceHistory, PricePoint};
use crate::core::range::RangeKey;

const INTRADAY_LABEL: &str = "%H:%M";
const DAILY_LABEL: &str = "%d %b";

/// Rounds to two decimal places, exact ties to even.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Converts every bar of `history` into a labelled close price.
///
/// Intraday ranges are labelled by clock time (`09:15`), longer ranges by day
/// and month (`05 Mar`).
pub fn format_chart(history: &PriceHistory, range: RangeKey) -> Result<Vec<PricePoint>> {
    if history.is_empty() {
        return Err(MarketError::EmptySeries);
    }

    let label = if range.is_intraday() {
        INTRADAY_LABEL
    } else {
        DAILY_LABEL
    };

    Ok(history
        .bars
        .iter()
        .map(|bar| PricePoint {
            time: bar.timestamp.format(label).to_string(),
            value: round2(bar.close),
        })
        .collect())
}

/// Keeps only the `limit` most recent points.
pub fn most_recent(mut points: Vec<PricePoint>, limit: usize) -> Vec<PricePoint> {
    if points.len() > limit {
        points.drain(..points.len() - limit);
    }
    points
}

/// Close-price statistics over a whole series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub first_close: f64,
    pub current_value: f64,
    pub gain: f64,
    pub gain_percent: f64,
    pub day_range: DayRange,
}

impl SeriesStats {
    pub fn from_history(history: &PriceHistory) -> Result<Self> {
        let (first, last) = match (history.first(), history.last()) {
            (Some(first), Some(last)) => (first.close, last.close),
            _ => return Err(MarketError::EmptySeries),
        };
        if first == 0.0 {
            return Err(MarketError::UndefinedGainPercent);
        }

        let (low, high) = history
            .bars
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), bar| {
                (low.min(bar.close), high.max(bar.close))
            });

        Ok(Self {
            first_close: first,
            current_value: round2(last),
            gain: round2(last - first),
            gain_percent: round2((last - first) / first * 100.0),
            day_range: DayRange {
                low: round2(low),
                high: round2(high),
            },
        })
    }
}

/// Session-level figures taken from the full bars rather than closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionStats {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

impl SessionStats {
    pub fn from_history(history: &PriceHistory) -> Result<Self> {
        let first = history.first().ok_or(MarketError::EmptySeries)?;

        let mut stats = Self {
            open: first.open,
            high: f64::NEG_INFINITY,
            low: f64::INFINITY,
            volume: 0.0,
        };
        for bar in &history.bars {
            stats.high = stats.high.max(bar.high);
            stats.low = stats.low.min(bar.low);
            stats.volume += bar.volume;
        }

        stats.open = round2(stats.open);
        stats.high = round2(stats.high);
        stats.low = round2(stats.low);
        Ok(stats)
    }
}
