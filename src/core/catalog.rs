//! Catalog and price quote abstractions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::error::RefreshError;

/// One entry of the pricing catalog: a unique slug id and its ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    /// Ticker symbol; compared case-insensitively.
    pub symbol: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// USD pricing for one catalog id as returned by the batched quote call.
///
/// Every field may be absent upstream and stays absent here; a missing
/// market cap counts as zero only at tie-break time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub usd: Option<f64>,
    pub usd_24h_change: Option<f64>,
    pub usd_market_cap: Option<f64>,
}

/// Returns the full catalog list for a refresh cycle.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, RefreshError>;
}

/// Returns USD quotes for a set of catalog ids in one batched request.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quotes(&self, ids: &[String])
    -> Result<HashMap<String, PriceQuote>, RefreshError>;
}
