pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use crate::core::service::DEFAULT_SEARCH_LIMIT;
use crate::core::MarketDataService;
use crate::providers::YahooFinanceProvider;
use crate::server::auth::TokenVerifier;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    Serve,
    Overview { symbol: String, range: String },
    Company { symbol: String, range: String },
    Search { query: String },
}

pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

/// Wires the Yahoo provider and the configured cache backend into a service.
pub fn build_service(config: &AppConfig) -> Result<MarketDataService> {
    let provider = Arc::new(YahooFinanceProvider::new(&config.providers.yahoo.base_url)?);
    let cache = store::open_collection(config)?;
    Ok(MarketDataService::new(provider, cache, config.cache.ttl()))
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let service = build_service(&config)?;

    match command {
        AppCommand::Serve => {
            let secret = config.auth.resolve_secret();
            if secret.is_none() {
                warn!("No JWT secret configured, company detail requests will be rejected");
            }
            info!("Market data service starting...");
            let state = server::AppState::new(service, TokenVerifier::new(secret.as_deref()));
            server::serve(&config.server.bind_addr, state).await
        }
        AppCommand::Overview { symbol, range } => {
            cli::market::overview(&service, &symbol, &range).await
        }
        AppCommand::Company { symbol, range } => {
            cli::market::company(&service, &symbol, &range).await
        }
        AppCommand::Search { query } => {
            cli::market::search(&service, &query, DEFAULT_SEARCH_LIMIT).await
        }
    }
}
