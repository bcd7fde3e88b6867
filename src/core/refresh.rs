//! One refresh cycle: fetch, match, normalize, assemble.
//!
//! Holdings and catalog are fetched concurrently, then every candidate id is
//! priced in a single batched quote call before the pure reconciliation
//! runs. A holdings failure aborts the cycle; a catalog or quote outage
//! degrades it to an unpriced valuation instead of failing it.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::warn;

use crate::core::catalog::{CatalogProvider, QuoteProvider};
use crate::core::error::RefreshError;
use crate::core::holdings::HoldingsProvider;
use crate::core::matcher::{self, MatchedQuote};
use crate::core::valuation::{self, ReconcileSettings, ValuationRecord};

/// Everything one cycle produced, for rendering and diagnostics.
#[derive(Debug)]
pub struct ValuationReport {
    pub records: Vec<ValuationRecord>,
    /// Symbol to bound catalog entry, for match diagnostics.
    pub matches: HashMap<String, MatchedQuote>,
    /// Every symbol the cycle tried to resolve, lowercased and sorted.
    pub symbols: Vec<String>,
    pub last_update: Option<DateTime<Utc>>,
    /// True when the upstream sync looked unfinished.
    pub refreshing: bool,
    /// Set when a pricing collaborator was down and the cycle carried on
    /// without prices.
    pub degraded: Option<String>,
}

/// Runs one full refresh cycle to completion. `on_progress` is invoked after
/// each of the three stages: collaborator fetches, quote pricing,
/// reconciliation.
pub async fn refresh_valuation(
    holdings: &dyn HoldingsProvider,
    catalog: &dyn CatalogProvider,
    quotes: &dyn QuoteProvider,
    settings: &ReconcileSettings,
    on_progress: &(dyn Fn()),
) -> Result<ValuationReport, RefreshError> {
    let (holdings_result, catalog_result) =
        futures::join!(holdings.fetch_holdings(), catalog.fetch_catalog());

    // Without holdings there is nothing to value.
    let snapshot = holdings_result?;

    let mut degraded = None;
    let catalog_entries = match catalog_result {
        Ok(entries) => entries,
        Err(error) if error.is_degradable() => {
            warn!("Pricing degraded for this cycle: {error}");
            degraded = Some(error.to_string());
            Vec::new()
        }
        Err(error) => return Err(error),
    };
    on_progress();

    let assets = snapshot.combined();
    let symbols = matcher::collect_symbols(&assets);
    let ids = matcher::candidate_ids(&symbols, &catalog_entries, &settings.exclude_id_patterns);

    let prices = if ids.is_empty() {
        HashMap::new()
    } else {
        match quotes.fetch_quotes(&ids).await {
            Ok(prices) => prices,
            Err(error) if error.is_degradable() => {
                warn!("Pricing degraded for this cycle: {error}");
                degraded = Some(error.to_string());
                HashMap::new()
            }
            Err(error) => return Err(error),
        }
    };
    on_progress();

    let matches = matcher::resolve(
        &symbols,
        &catalog_entries,
        &prices,
        &settings.exclude_id_patterns,
    );
    let records = valuation::assemble(&assets, &matches, settings);
    on_progress();

    Ok(ValuationReport {
        records,
        matches,
        symbols,
        last_update: snapshot.last_update,
        refreshing: snapshot.refreshing(),
        degraded,
    })
}
