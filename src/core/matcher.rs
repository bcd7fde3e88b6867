//! Resolves ticker symbols to priced catalog entries.
//!
//! Symbols and catalog tickers are compared case-insensitively. Catalog ids
//! matching a configured exclusion pattern (cross-chain bridged clones of
//! another asset) never take part. When several entries share a ticker the
//! one with the greatest market cap wins; equal caps keep the first
//! occurrence in catalog order, so resolution is deterministic.

use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

use crate::core::catalog::{CatalogEntry, PriceQuote};
use crate::core::holdings::AssetHolding;

/// A symbol bound to a priced catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedQuote {
    pub entry: CatalogEntry,
    pub usd_price: f64,
    pub change_24h: Option<f64>,
    /// Cap used for the tie-break; zero when the quote carried none.
    pub market_cap: f64,
}

/// Collects every symbol a cycle must resolve: each held asset, the quote
/// currency of each of its pairs, and the commission asset of each fee.
/// Lowercased, deduplicated, sorted.
pub fn collect_symbols(assets: &HashMap<String, AssetHolding>) -> Vec<String> {
    let mut symbols = BTreeSet::new();
    for (symbol, holding) in assets {
        symbols.insert(symbol.to_lowercase());
        if let Some(pairs) = &holding.pairs {
            for (quote, aggregate) in pairs {
                symbols.insert(quote.to_lowercase());
                if let Some(fees) = &aggregate.fees {
                    for asset in fees.keys() {
                        symbols.insert(asset.to_lowercase());
                    }
                }
            }
        }
    }
    symbols.into_iter().collect()
}

/// The ids to submit in the single batched quote request: every surviving
/// candidate of every symbol, in catalog order, deduplicated. Losing
/// candidates are fetched too since the tie-break needs their market caps.
pub fn candidate_ids(
    symbols: &[String],
    catalog: &[CatalogEntry],
    exclude_patterns: &[String],
) -> Vec<String> {
    let wanted: HashSet<String> = symbols.iter().map(|s| s.to_lowercase()).collect();
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for entry in catalog {
        if excluded(&entry.id, exclude_patterns) {
            continue;
        }
        if wanted.contains(&entry.symbol.to_lowercase()) && seen.insert(entry.id.clone()) {
            ids.push(entry.id.clone());
        }
    }
    ids
}

/// Binds each symbol to at most one priced catalog entry. Symbols with no
/// surviving priced candidate are absent from the result, never guessed.
pub fn resolve(
    symbols: &[String],
    catalog: &[CatalogEntry],
    prices: &HashMap<String, PriceQuote>,
    exclude_patterns: &[String],
) -> HashMap<String, MatchedQuote> {
    let wanted: HashSet<String> = symbols.iter().map(|s| s.to_lowercase()).collect();
    let mut matches: HashMap<String, MatchedQuote> = HashMap::new();

    for entry in catalog {
        if excluded(&entry.id, exclude_patterns) {
            continue;
        }
        let token = entry.symbol.to_lowercase();
        if !wanted.contains(&token) {
            continue;
        }
        // A candidate binds only when the batched call priced it; anything
        // else would fabricate a price downstream.
        if let Some(quote) = prices.get(&entry.id) {
            if let Some(usd_price) = quote.usd {
                let market_cap = quote.usd_market_cap.unwrap_or(0.0);
                // Strictly greater replaces, so equal caps keep the earlier
                // catalog occurrence.
                let replace = matches
                    .get(&token)
                    .map_or(true, |current| market_cap > current.market_cap);
                if replace {
                    matches.insert(
                        token,
                        MatchedQuote {
                            entry: entry.clone(),
                            usd_price,
                            change_24h: quote.usd_24h_change,
                            market_cap,
                        },
                    );
                }
            }
        }
    }

    debug!(
        "Resolved {} of {} symbols against the catalog",
        matches.len(),
        wanted.len()
    );
    matches
}

fn excluded(id: &str, patterns: &[String]) -> bool {
    let id = id.to_lowercase();
    patterns
        .iter()
        .any(|pattern| id.contains(&pattern.to_lowercase()))
}
