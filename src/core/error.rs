//! Error taxonomy for the market-data layer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MarketError {
    /// The provider returned a series with no rows.
    #[error("Market data unavailable")]
    EmptySeries,

    /// The first close of the series is zero, so the gain percent has no value.
    #[error("Gain percent is undefined for a zero opening price")]
    UndefinedGainPercent,

    /// The caller omitted or malformed a required input.
    #[error("{0}")]
    InvalidRequest(String),

    #[error("Upstream provider failure: {0}")]
    Upstream(#[from] anyhow::Error),
}

impl MarketError {
    /// True when the failure means "no usable data" rather than a broken upstream.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(
            self,
            MarketError::EmptySeries | MarketError::UndefinedGainPercent
        )
    }
}

pub type Result<T> = std::result::Result<T, MarketError>;
