//! Holdings domain model and the holdings collaborator abstraction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::core::error::RefreshError;

/// A single trade mark. The wire format keeps the upstream exchange's field
/// casing (`Time`, `IsBuyer`, `Qty`, `Price`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trade {
    pub time: DateTime<Utc>,
    pub is_buyer: bool,
    pub qty: f64,
    pub price: f64,
}

/// Buy and sell totals for one asset against one quote currency.
///
/// `cost`, `revenue`, the fee amounts, and the trade-mark prices are
/// denominated in the quote currency until normalization. `buy_qty` and
/// `cost` are zero together or non-zero together; the sell pair likewise.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeAggregate {
    pub buy_qty: f64,
    pub cost: f64,
    pub sell_qty: f64,
    pub revenue: f64,
    /// Cumulated fees keyed by commission asset. `None` on the wire when no
    /// fee was ever charged for the pair.
    pub fees: Option<HashMap<String, f64>>,
    pub earliest_trade: Option<Trade>,
    pub latest_trade: Option<Trade>,
}

impl TradeAggregate {
    /// Folds another aggregate into this one: quantities, totals, and fees
    /// sum; the trade marks keep the overall minimum and maximum timestamps.
    pub fn merge(&mut self, other: &TradeAggregate) {
        self.buy_qty += other.buy_qty;
        self.cost += other.cost;
        self.sell_qty += other.sell_qty;
        self.revenue += other.revenue;

        if let Some(other_fees) = &other.fees {
            let fees = self.fees.get_or_insert_with(HashMap::new);
            for (asset, amount) in other_fees {
                *fees.entry(asset.clone()).or_insert(0.0) += amount;
            }
        }

        self.earliest_trade = match (self.earliest_trade.take(), &other.earliest_trade) {
            (Some(current), Some(candidate)) if candidate.time < current.time => {
                Some(candidate.clone())
            }
            (None, Some(candidate)) => Some(candidate.clone()),
            (current, _) => current,
        };
        self.latest_trade = match (self.latest_trade.take(), &other.latest_trade) {
            (Some(current), Some(candidate)) if candidate.time > current.time => {
                Some(candidate.clone())
            }
            (None, Some(candidate)) => Some(candidate.clone()),
            (current, _) => current,
        };
    }
}

/// One held asset: its current balance and, when the asset was ever traded,
/// its per-quote-currency trade aggregates.
///
/// `balance` may be negative when the upstream data is off; it is carried
/// through as-is, never rejected. `pairs` is `None` on the wire for
/// untraded, transferred-in holdings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetHolding {
    pub balance: f64,
    pub pairs: Option<HashMap<String, TradeAggregate>>,
    /// Quantity credited outside trading (earn/staking payouts).
    #[serde(default)]
    pub distribution_total: f64,
}

impl AssetHolding {
    /// Combines the same asset as reported by two exchange sections.
    pub fn merge(&mut self, other: &AssetHolding) {
        self.balance += other.balance;
        self.distribution_total += other.distribution_total;
        if let Some(other_pairs) = &other.pairs {
            let pairs = self.pairs.get_or_insert_with(HashMap::new);
            for (quote, aggregate) in other_pairs {
                pairs
                    .entry(quote.clone())
                    .and_modify(|existing| existing.merge(aggregate))
                    .or_insert_with(|| aggregate.clone());
            }
        }
    }
}

/// The holdings service payload: named exchange sections, each mapping an
/// asset symbol to its holding, plus the time the service last synced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub exchanges: HashMap<String, HashMap<String, AssetHolding>>,
}

impl HoldingsSnapshot {
    /// Merges all exchange sections into one asset set: balances and
    /// distribution totals sum, same-quote aggregates merge. Commutative,
    /// so the section iteration order does not matter.
    pub fn combined(&self) -> HashMap<String, AssetHolding> {
        let mut assets: HashMap<String, AssetHolding> = HashMap::new();
        for section in self.exchanges.values() {
            for (symbol, holding) in section {
                match assets.entry(symbol.clone()) {
                    Entry::Occupied(mut entry) => entry.get_mut().merge(holding),
                    Entry::Vacant(entry) => {
                        entry.insert(holding.clone());
                    }
                }
            }
        }
        assets
    }

    /// True when any asset still lacks pairs, a hint that the upstream sync
    /// has not finished filling in trade history.
    pub fn refreshing(&self) -> bool {
        self.exchanges
            .values()
            .flat_map(|section| section.values())
            .any(|holding| holding.pairs.as_ref().map_or(true, |pairs| pairs.is_empty()))
    }
}

/// Produces the credential-scoped holdings snapshot for a refresh cycle.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    async fn fetch_holdings(&self) -> Result<HoldingsSnapshot, RefreshError>;
}
