//! Derived per-asset figures.
//!
//! Every figure is `Option`: a metric whose inputs are missing stays `None`
//! instead of being coerced to zero, so displays can tell "no data" from
//! "zero".

use crate::core::holdings::TradeAggregate;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssetMetrics {
    /// Cost per unit bought, `cost / buy_qty`.
    pub average_buy: Option<f64>,
    /// Revenue per unit sold, `revenue / sell_qty`.
    pub average_sell: Option<f64>,
    /// Current price minus average buy.
    pub price_differential: Option<f64>,
    /// Price differential relative to the midpoint of price and average buy,
    /// in percent.
    pub percent_differential: Option<f64>,
    /// Realized plus unrealized outcome, `revenue - cost + balance * price`.
    pub profit: Option<f64>,
    pub market_value: Option<f64>,
    pub distribution_value: Option<f64>,
}

/// Computes the metric set for one asset from its USD aggregate, balance,
/// distribution total, and current USD price.
pub fn compute(
    aggregate: Option<&TradeAggregate>,
    balance: f64,
    distribution_total: f64,
    current_price: Option<f64>,
) -> AssetMetrics {
    let average_buy = aggregate.and_then(|aggregate| {
        (aggregate.buy_qty > 0.0).then(|| aggregate.cost / aggregate.buy_qty)
    });
    let average_sell = aggregate.and_then(|aggregate| {
        (aggregate.sell_qty > 0.0).then(|| aggregate.revenue / aggregate.sell_qty)
    });

    let price_differential = match (current_price, average_buy) {
        (Some(price), Some(buy)) => Some(price - buy),
        _ => None,
    };
    let percent_differential = match (current_price, average_buy) {
        (Some(price), Some(buy)) => {
            let midpoint = (price + buy) / 2.0;
            (midpoint != 0.0).then(|| (price - buy) / midpoint * 100.0)
        }
        _ => None,
    };

    let profit = match (aggregate, current_price) {
        (Some(aggregate), Some(price)) => {
            Some(aggregate.revenue - aggregate.cost + balance * price)
        }
        _ => None,
    };

    AssetMetrics {
        average_buy,
        average_sell,
        price_differential,
        percent_differential,
        profit,
        market_value: current_price.map(|price| balance * price),
        distribution_value: current_price.map(|price| distribution_total * price),
    }
}
