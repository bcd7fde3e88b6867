//! Assembles the final per-asset valuation records.
//!
//! Every held asset produces exactly one record, including zero-balance,
//! untraded, and unmatched ones, so the output is a complete holdings list
//! with no silent gaps.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::core::catalog::{CatalogEntry, PriceQuote};
use crate::core::holdings::AssetHolding;
use crate::core::matcher::{self, MatchedQuote};
use crate::core::metrics;
use crate::core::normalize::normalize_asset;

/// Tuning knobs for catalog matching and USD normalization.
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    /// Catalog ids containing any of these substrings never match; used to
    /// keep cross-chain bridged clones out of the running.
    pub exclude_id_patterns: Vec<String>,
    /// Lowercase quote symbols that convert to USD at par.
    pub usd_equivalents: HashSet<String>,
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            exclude_id_patterns: vec!["wormhole".to_string()],
            usd_equivalents: ["usd", "usdt", "busd", "usdc", "tusd", "ust"]
                .into_iter()
                .map(str::to_string)
                .collect(),
        }
    }
}

/// One asset's complete valuation row. Fields stay `None` when their inputs
/// were undefined, so consumers can tell "no data" from "zero".
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationRecord {
    pub symbol: String,
    pub balance: f64,
    /// Total USD spent buying, when all quote currencies priced.
    pub cost: Option<f64>,
    /// Total USD received selling, when all quote currencies priced.
    pub revenue: Option<f64>,
    pub average_buy: Option<f64>,
    pub average_sell: Option<f64>,
    pub current_price: Option<f64>,
    pub change_24h: Option<f64>,
    pub price_differential: Option<f64>,
    pub percent_differential: Option<f64>,
    pub profit: Option<f64>,
    pub market_value: Option<f64>,
    pub total_fees: Option<f64>,
    pub distribution_value: Option<f64>,
    /// The catalog entry the symbol resolved to.
    pub catalog_id: Option<String>,
    /// Explains why pricing is partial, when it is.
    pub note: Option<String>,
}

/// The pure reconciliation seam: resolves symbols against the catalog,
/// normalizes every holding to USD, computes metrics, and returns one sorted
/// record per asset. No side effects.
pub fn reconcile(
    assets: &HashMap<String, AssetHolding>,
    catalog: &[CatalogEntry],
    prices: &HashMap<String, PriceQuote>,
    settings: &ReconcileSettings,
) -> Vec<ValuationRecord> {
    let symbols = matcher::collect_symbols(assets);
    let matches = matcher::resolve(&symbols, catalog, prices, &settings.exclude_id_patterns);
    assemble(assets, &matches, settings)
}

/// Builds the record set from already-resolved matches. Split out of
/// [`reconcile`] so a refresh cycle can reuse its match map for diagnostics.
pub fn assemble(
    assets: &HashMap<String, AssetHolding>,
    matches: &HashMap<String, MatchedQuote>,
    settings: &ReconcileSettings,
) -> Vec<ValuationRecord> {
    let mut records: Vec<ValuationRecord> = assets
        .iter()
        .map(|(symbol, holding)| {
            let asset = normalize_asset(symbol, holding, matches, &settings.usd_equivalents);
            let current_price = asset.matched.as_ref().map(|matched| matched.usd_price);
            let computed = metrics::compute(
                asset.usd_aggregate.as_ref(),
                asset.balance,
                asset.distribution_total,
                current_price,
            );
            ValuationRecord {
                symbol: asset.symbol,
                balance: asset.balance,
                cost: asset.usd_aggregate.as_ref().map(|usd| usd.cost),
                revenue: asset.usd_aggregate.as_ref().map(|usd| usd.revenue),
                average_buy: computed.average_buy,
                average_sell: computed.average_sell,
                current_price,
                change_24h: asset.matched.as_ref().and_then(|matched| matched.change_24h),
                price_differential: computed.price_differential,
                percent_differential: computed.percent_differential,
                profit: computed.profit,
                market_value: computed.market_value,
                total_fees: asset.total_fees,
                distribution_value: computed.distribution_value,
                catalog_id: asset.matched.map(|matched| matched.entry.id),
                note: asset.note,
            }
        })
        .collect();
    sort_records(&mut records);
    records
}

/// Descending percent differential; undefined sorts after defined, never as
/// zero. Symbol breaks ties so the order is reproducible.
fn sort_records(records: &mut [ValuationRecord]) {
    records.sort_by(|a, b| match (a.percent_differential, b.percent_differential) {
        (Some(left), Some(right)) => right
            .total_cmp(&left)
            .then_with(|| a.symbol.cmp(&b.symbol)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.symbol.cmp(&b.symbol),
    });
}
