use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::catalog::{CatalogEntry, CatalogProvider, PriceQuote, QuoteProvider};
use crate::core::error::RefreshError;
use crate::providers::util::{service_client, with_retry};

const SERVICE: &str = "coingecko";

// CoinGeckoCatalogProvider implementation for CatalogProvider
pub struct CoinGeckoCatalogProvider {
    base_url: String,
}

impl CoinGeckoCatalogProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoCatalogProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl CatalogProvider for CoinGeckoCatalogProvider {
    #[instrument(name = "CatalogFetch", skip(self))]
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, RefreshError> {
        let url = format!("{}/api/v3/coins/list", self.base_url);
        debug!("Requesting catalog from {}", url);

        let client = service_client(SERVICE)?;
        let response = with_retry(|| async { client.get(&url).send().await }, 3, 500)
            .await
            .map_err(|e| RefreshError::unavailable(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::unavailable(SERVICE, format!("status {status}")));
        }

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|e| RefreshError::malformed(SERVICE, e))?;
        debug!("Catalog lists {} entries", entries.len());
        Ok(entries)
    }
}

// CoinGeckoQuoteProvider implementation for QuoteProvider
pub struct CoinGeckoQuoteProvider {
    base_url: String,
}

impl CoinGeckoQuoteProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoQuoteProvider {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl QuoteProvider for CoinGeckoQuoteProvider {
    #[instrument(name = "QuoteFetch", skip(self, ids), fields(ids = ids.len()))]
    async fn fetch_quotes(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, PriceQuote>, RefreshError> {
        let url = format!("{}/api/v3/simple/price", self.base_url);
        let joined = ids.join(",");
        debug!("Requesting {} quotes from {}", ids.len(), url);

        let client = service_client(SERVICE)?;
        let response = with_retry(
            || async {
                client
                    .get(&url)
                    .query(&[
                        ("ids", joined.as_str()),
                        ("vs_currencies", "usd"),
                        ("include_24hr_change", "true"),
                        ("include_market_cap", "true"),
                    ])
                    .send()
                    .await
            },
            3,
            500,
        )
        .await
        .map_err(|e| RefreshError::unavailable(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RefreshError::unavailable(SERVICE, format!("status {status}")));
        }

        response
            .json()
            .await
            .map_err(|e| RefreshError::malformed(SERVICE, e))
    }
}
