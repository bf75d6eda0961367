//! JSON error responses of the market endpoints.
//!
//! Every error body has the shape `{"detail": "<message>"}`. Upstream
//! failure details are logged, never returned to the client.

use crate::core::MarketError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "Authentication credentials were not provided.",
        )
    }

    /// Index overview: missing data is a service outage (503).
    pub fn for_overview(err: MarketError) -> Self {
        match err {
            e if e.is_data_unavailable() => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Market data unavailable")
            }
            MarketError::InvalidRequest(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            e => {
                error!(error = %e, "Index overview failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch market data",
                )
            }
        }
    }

    /// Company detail: missing data is caller-correctable through the symbol (400).
    pub fn for_company(err: MarketError) -> Self {
        match err {
            MarketError::InvalidRequest(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            e if e.is_data_unavailable() => {
                Self::new(StatusCode::BAD_REQUEST, "Company data not available")
            }
            e => {
                error!(error = %e, "Company detail failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to fetch company data",
                )
            }
        }
    }

    pub fn for_search(err: MarketError) -> Self {
        match err {
            MarketError::InvalidRequest(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            e => {
                error!(error = %e, "Company search failed");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to search companies",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (
            self.status,
            Json(ErrorBody {
                detail: self.detail,
            }),
        )
            .into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
