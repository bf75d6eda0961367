use super::{AppState, auth::Authenticated, error::ApiError};
use crate::core::service::DEFAULT_SEARCH_LIMIT;
use crate::core::{CompanyMatch, CompanySummary, MarketSummary};
use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::{Value, json};

pub const DEFAULT_INDEX_SYMBOL: &str = "^NSEI";
pub const DEFAULT_RANGE: &str = "1D";

#[derive(Debug, Deserialize)]
pub struct ChartParams {
    pub symbol: Option<String>,
    pub range: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

pub fn market_router() -> Router<AppState> {
    Router::new()
        .route("/overview", get(market_overview))
        .route("/search", get(company_search))
        .route("/company", get(company_detail))
}

pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn market_overview(
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<MarketSummary>, ApiError> {
    let symbol = params.symbol.as_deref().unwrap_or(DEFAULT_INDEX_SYMBOL);
    let range = params.range.as_deref().unwrap_or(DEFAULT_RANGE);

    state
        .service
        .get_index_overview(symbol, range)
        .await
        .map(Json)
        .map_err(ApiError::for_overview)
}

async fn company_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<CompanyMatch>>, ApiError> {
    let query = params.q.as_deref().unwrap_or_default().trim();

    state
        .service
        .search_companies(query, DEFAULT_SEARCH_LIMIT)
        .await
        .map(Json)
        .map_err(ApiError::for_search)
}

async fn company_detail(
    Authenticated(_claims): Authenticated,
    State(state): State<AppState>,
    Query(params): Query<ChartParams>,
) -> Result<Json<CompanySummary>, ApiError> {
    let symbol = params.symbol.as_deref().unwrap_or_default();
    let range = params.range.as_deref().unwrap_or(DEFAULT_RANGE);

    state
        .service
        .get_company_detail(symbol, range)
        .await
        .map(Json)
        .map_err(ApiError::for_company)
}
