//! Converts per-quote-currency trade aggregates into a single USD view.
//!
//! Quote currencies in the USD-equivalent par set convert 1:1. Any other
//! quote converts at its resolved catalog price. A quote that resolved to no
//! USD price poisons the whole USD aggregate for that asset rather than
//! producing a partial sum; the asset keeps its balance and carries a note.

use std::collections::{HashMap, HashSet};

use crate::core::holdings::{AssetHolding, Trade, TradeAggregate};
use crate::core::matcher::MatchedQuote;

/// One asset with its trade history restated in USD.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalAsset {
    pub symbol: String,
    pub balance: f64,
    /// All pairs merged into USD terms; `None` when the asset was never
    /// traded or some quote currency could not be priced.
    pub usd_aggregate: Option<TradeAggregate>,
    /// The asset's own catalog binding, when one exists.
    pub matched: Option<MatchedQuote>,
    /// Commissions across all pairs restated in USD; `None` when a non-zero
    /// fee was charged in an asset that could not be priced.
    pub total_fees: Option<f64>,
    pub distribution_total: f64,
    pub note: Option<String>,
}

/// Restates one holding in USD terms against the resolved catalog matches.
pub fn normalize_asset(
    symbol: &str,
    holding: &AssetHolding,
    matches: &HashMap<String, MatchedQuote>,
    usd_equivalents: &HashSet<String>,
) -> CanonicalAsset {
    let matched = matches.get(&symbol.to_lowercase()).cloned();

    let pairs = match holding.pairs.as_ref().filter(|pairs| !pairs.is_empty()) {
        Some(pairs) => pairs,
        None => {
            return CanonicalAsset {
                symbol: symbol.to_string(),
                balance: holding.balance,
                usd_aggregate: None,
                matched,
                total_fees: None,
                distribution_total: holding.distribution_total,
                note: None,
            };
        }
    };

    // Quote order fixes the note order, nothing else; the merge itself is
    // commutative.
    let mut quotes: Vec<&String> = pairs.keys().collect();
    quotes.sort();

    let mut combined = TradeAggregate::default();
    let mut priced = true;
    let mut fee_total = 0.0;
    let mut fees_priced = true;
    let mut notes: Vec<String> = Vec::new();

    for quote in quotes {
        let aggregate = &pairs[quote];

        if let Some(fees) = &aggregate.fees {
            let mut fee_assets: Vec<&String> = fees.keys().collect();
            fee_assets.sort();
            for asset in fee_assets {
                let amount = fees[asset];
                match usd_rate(asset, matches, usd_equivalents) {
                    Some(rate) => fee_total += amount * rate,
                    None if amount != 0.0 => {
                        fees_priced = false;
                        let note = format!("no USD price for fee asset {asset}");
                        if !notes.contains(&note) {
                            notes.push(note);
                        }
                    }
                    None => {}
                }
            }
        }

        match usd_rate(quote, matches, usd_equivalents) {
            Some(rate) => {
                if priced {
                    combined.merge(&in_usd(aggregate, rate));
                }
            }
            None => {
                priced = false;
                notes.push(format!("no USD price for quote {quote}"));
            }
        }
    }

    CanonicalAsset {
        symbol: symbol.to_string(),
        balance: holding.balance,
        usd_aggregate: priced.then_some(combined),
        matched,
        total_fees: fees_priced.then_some(fee_total),
        distribution_total: holding.distribution_total,
        note: (!notes.is_empty()).then(|| notes.join("; ")),
    }
}

fn usd_rate(
    symbol: &str,
    matches: &HashMap<String, MatchedQuote>,
    usd_equivalents: &HashSet<String>,
) -> Option<f64> {
    let token = symbol.to_lowercase();
    if usd_equivalents.contains(&token) {
        return Some(1.0);
    }
    matches.get(&token).map(|matched| matched.usd_price)
}

fn in_usd(aggregate: &TradeAggregate, rate: f64) -> TradeAggregate {
    let scale_mark = |mark: &Option<Trade>| {
        mark.clone().map(|mut trade| {
            trade.price *= rate;
            trade
        })
    };
    TradeAggregate {
        buy_qty: aggregate.buy_qty,
        cost: aggregate.cost * rate,
        sell_qty: aggregate.sell_qty,
        revenue: aggregate.revenue * rate,
        // Fees are tracked separately in `total_fees`.
        fees: None,
        earliest_trade: scale_mark(&aggregate.earliest_trade),
        latest_trade: scale_mark(&aggregate.latest_trade),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::CatalogEntry;
    use chrono::{TimeZone, Utc};

    fn matched(id: &str, symbol: &str, usd_price: f64) -> (String, MatchedQuote) {
        (
            symbol.to_lowercase(),
            MatchedQuote {
                entry: CatalogEntry {
                    id: id.to_string(),
                    symbol: symbol.to_string(),
                    name: None,
                },
                usd_price,
                change_24h: None,
                market_cap: 0.0,
            },
        )
    }

    fn trade(timestamp: i64, is_buyer: bool, qty: f64, price: f64) -> Trade {
        Trade {
            time: Utc.timestamp_opt(timestamp, 0).unwrap(),
            is_buyer,
            qty,
            price,
        }
    }

    fn par_set() -> HashSet<String> {
        ["usd", "usdt", "busd", "usdc", "tusd", "ust"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_par_quote_passes_through_unscaled() {
        let holding = AssetHolding {
            balance: 10.0,
            pairs: Some(HashMap::from([(
                "USDT".to_string(),
                TradeAggregate {
                    buy_qty: 10.0,
                    cost: 420.0,
                    sell_qty: 2.0,
                    revenue: 90.0,
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };

        let asset = normalize_asset("SOL", &holding, &HashMap::new(), &par_set());
        let usd = asset.usd_aggregate.unwrap();
        assert_eq!(usd.cost, 420.0);
        assert_eq!(usd.revenue, 90.0);
        assert_eq!(usd.buy_qty, 10.0);
        assert_eq!(asset.total_fees, Some(0.0));
        assert!(asset.note.is_none());
    }

    #[test]
    fn test_non_usd_quote_scales_totals_and_marks() {
        let holding = AssetHolding {
            balance: 4_000.0,
            pairs: Some(HashMap::from([(
                "ETH".to_string(),
                TradeAggregate {
                    buy_qty: 4_000.0,
                    cost: 1.0,
                    earliest_trade: Some(trade(1_000, true, 4_000.0, 0.00025)),
                    latest_trade: Some(trade(2_000, true, 1_000.0, 0.00025)),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };
        let matches = HashMap::from([matched("ethereum", "ETH", 2_500.0)]);

        let asset = normalize_asset("HOT", &holding, &matches, &par_set());
        let usd = asset.usd_aggregate.unwrap();
        assert_eq!(usd.cost, 2_500.0);
        assert_eq!(usd.earliest_trade.unwrap().price, 0.625);
        assert_eq!(usd.latest_trade.unwrap().price, 0.625);
    }

    #[test]
    fn test_pairs_merge_across_quote_currencies() {
        let holding = AssetHolding {
            balance: 30_000.0,
            pairs: Some(HashMap::from([
                (
                    "USDT".to_string(),
                    TradeAggregate {
                        buy_qty: 20_000.0,
                        cost: 150.0,
                        earliest_trade: Some(trade(1_000, true, 20_000.0, 0.0075)),
                        latest_trade: Some(trade(1_000, true, 20_000.0, 0.0075)),
                        ..Default::default()
                    },
                ),
                (
                    "BTC".to_string(),
                    TradeAggregate {
                        buy_qty: 10_000.0,
                        cost: 0.002,
                        earliest_trade: Some(trade(3_000, true, 10_000.0, 0.0000002)),
                        latest_trade: Some(trade(3_000, true, 10_000.0, 0.0000002)),
                        ..Default::default()
                    },
                ),
            ])),
            ..Default::default()
        };
        let matches = HashMap::from([matched("bitcoin", "BTC", 50_000.0)]);

        let asset = normalize_asset("VET", &holding, &matches, &par_set());
        let usd = asset.usd_aggregate.unwrap();
        assert_eq!(usd.buy_qty, 30_000.0);
        assert!((usd.cost - 250.0).abs() < 1e-9);
        assert_eq!(usd.earliest_trade.unwrap().time.timestamp(), 1_000);
        let latest = usd.latest_trade.unwrap();
        assert_eq!(latest.time.timestamp(), 3_000);
        assert!((latest.price - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_unpriced_quote_poisons_whole_aggregate() {
        let holding = AssetHolding {
            balance: 100.0,
            pairs: Some(HashMap::from([
                (
                    "USDT".to_string(),
                    TradeAggregate {
                        buy_qty: 100.0,
                        cost: 500.0,
                        ..Default::default()
                    },
                ),
                (
                    "XYZ".to_string(),
                    TradeAggregate {
                        buy_qty: 50.0,
                        cost: 10.0,
                        ..Default::default()
                    },
                ),
            ])),
            ..Default::default()
        };

        let asset = normalize_asset("ADA", &holding, &HashMap::new(), &par_set());
        assert!(asset.usd_aggregate.is_none());
        assert_eq!(asset.note.as_deref(), Some("no USD price for quote XYZ"));
        // Fees stay computable, there were none.
        assert_eq!(asset.total_fees, Some(0.0));
    }

    #[test]
    fn test_fees_convert_per_commission_asset() {
        let holding = AssetHolding {
            balance: 1.0,
            pairs: Some(HashMap::from([(
                "USDT".to_string(),
                TradeAggregate {
                    buy_qty: 1.0,
                    cost: 30_000.0,
                    fees: Some(HashMap::from([
                        ("BNB".to_string(), 0.05),
                        ("USDT".to_string(), 1.5),
                    ])),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };
        let matches = HashMap::from([matched("binancecoin", "BNB", 400.0)]);

        let asset = normalize_asset("BTC", &holding, &matches, &par_set());
        assert!((asset.total_fees.unwrap() - 21.5).abs() < 1e-9);
    }

    #[test]
    fn test_unpriced_nonzero_fee_drops_fee_total() {
        let holding = AssetHolding {
            balance: 1.0,
            pairs: Some(HashMap::from([(
                "USDT".to_string(),
                TradeAggregate {
                    buy_qty: 1.0,
                    cost: 30_000.0,
                    fees: Some(HashMap::from([("XYZ".to_string(), 0.3)])),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        };

        let asset = normalize_asset("BTC", &holding, &HashMap::new(), &par_set());
        assert!(asset.total_fees.is_none());
        assert_eq!(
            asset.note.as_deref(),
            Some("no USD price for fee asset XYZ")
        );
        // The trade history itself is still priced.
        assert!(asset.usd_aggregate.is_some());
    }

    #[test]
    fn test_untraded_holding_keeps_balance_only() {
        let holding = AssetHolding {
            balance: 12.5,
            pairs: None,
            distribution_total: 0.5,
        };
        let matches = HashMap::from([matched("polkadot", "DOT", 6.0)]);

        let asset = normalize_asset("DOT", &holding, &matches, &par_set());
        assert_eq!(asset.balance, 12.5);
        assert_eq!(asset.distribution_total, 0.5);
        assert!(asset.usd_aggregate.is_none());
        assert!(asset.total_fees.is_none());
        assert!(asset.note.is_none());
        assert_eq!(asset.matched.unwrap().entry.id, "polkadot");
    }
}
