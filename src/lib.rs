pub mod cli;
pub mod core;
pub mod providers;

use crate::core::config::AppConfig;
use anyhow::Result;
use tracing::{debug, info};

/// Commands the binary dispatches once configuration is loaded.
pub enum AppCommand {
    Summary,
    Matches,
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("coinlens starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };

    let ledger_base_url = config
        .providers
        .ledger
        .as_ref()
        .map_or("http://localhost:8080", |p| &p.base_url);
    let coingecko_base_url = config
        .providers
        .coingecko
        .as_ref()
        .map_or("https://api.coingecko.com", |p| &p.base_url);
    debug!("Using ledger at {ledger_base_url} and catalog at {coingecko_base_url}");

    let holdings_provider =
        providers::ledger::LedgerProvider::new(ledger_base_url, &config.api_key);
    let catalog_provider = providers::coingecko::CoinGeckoCatalogProvider::new(coingecko_base_url);
    let quote_provider = providers::coingecko::CoinGeckoQuoteProvider::new(coingecko_base_url);
    let settings = config.reconcile_settings();

    match command {
        AppCommand::Summary => {
            cli::summary::run(
                &holdings_provider,
                &catalog_provider,
                &quote_provider,
                &settings,
            )
            .await
        }
        AppCommand::Matches => {
            cli::matches::run(
                &holdings_provider,
                &catalog_provider,
                &quote_provider,
                &settings,
            )
            .await
        }
    }
}
