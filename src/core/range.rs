//! Logical chart ranges and their provider period/interval vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RangeKey {
    #[default]
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    YearToDate,
    OneYear,
}

/// Lookback period and sample interval as understood by the data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSpec {
    pub period: &'static str,
    pub interval: &'static str,
}

impl RangeKey {
    pub const ALL: [RangeKey; 6] = [
        RangeKey::OneDay,
        RangeKey::FiveDays,
        RangeKey::OneMonth,
        RangeKey::ThreeMonths,
        RangeKey::YearToDate,
        RangeKey::OneYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeKey::OneDay => "1D",
            RangeKey::FiveDays => "5D",
            RangeKey::OneMonth => "1M",
            RangeKey::ThreeMonths => "3M",
            RangeKey::YearToDate => "YTD",
            RangeKey::OneYear => "1Y",
        }
    }

    pub fn spec(&self) -> RangeSpec {
        let (period, interval) = match self {
            RangeKey::OneDay => ("1d", "5m"),
            RangeKey::FiveDays => ("5d", "15m"),
            RangeKey::OneMonth => ("1mo", "1h"),
            RangeKey::ThreeMonths => ("3mo", "1d"),
            RangeKey::YearToDate => ("ytd", "1d"),
            RangeKey::OneYear => ("1y", "1d"),
        };
        RangeSpec { period, interval }
    }

    /// Ranges shorter than a trading day are labelled by clock time.
    pub fn is_intraday(&self) -> bool {
        matches!(self, RangeKey::OneDay)
    }

    /// Parses a range key, falling back to the default range for anything unknown.
    pub fn parse_lenient(range_key: &str) -> Self {
        range_key.parse().unwrap_or_else(|_| {
            debug!("Unknown range key '{range_key}', using default");
            RangeKey::default()
        })
    }
}

impl Display for RangeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RangeKey {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(RangeKey::OneDay),
            "5D" => Ok(RangeKey::FiveDays),
            "1M" => Ok(RangeKey::OneMonth),
            "3M" => Ok(RangeKey::ThreeMonths),
            "YTD" => Ok(RangeKey::YearToDate),
            "1Y" => Ok(RangeKey::OneYear),
            _ => Err(anyhow::anyhow!("Invalid range key: {}", s)),
        }
    }
}

/// Maps a logical range key to the provider's period/interval pair.
///
/// Unknown keys never fail; they resolve to the default `("1d", "5m")` pair.
pub fn resolve(range_key: &str) -> RangeSpec {
    RangeKey::parse_lenient(range_key).spec()
}
