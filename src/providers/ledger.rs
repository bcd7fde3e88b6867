use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, instrument};

use crate::core::error::RefreshError;
use crate::core::holdings::{HoldingsProvider, HoldingsSnapshot};
use crate::providers::util::{service_client, with_retry};

const SERVICE: &str = "ledger";

/// Client for the trade-history ledger service. A single `GET /latest`,
/// scoped by the `X-API-Key` credential, returns the whole holdings
/// snapshot.
pub struct LedgerProvider {
    base_url: String,
    api_key: String,
}

impl LedgerProvider {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        LedgerProvider {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl HoldingsProvider for LedgerProvider {
    #[instrument(name = "HoldingsFetch", skip(self))]
    async fn fetch_holdings(&self) -> Result<HoldingsSnapshot, RefreshError> {
        let url = format!("{}/latest", self.base_url);
        debug!("Requesting holdings from {}", url);

        let client = service_client(SERVICE)?;
        let response = with_retry(
            || async {
                client
                    .get(&url)
                    .header("X-API-Key", &self.api_key)
                    .send()
                    .await
            },
            3,
            500,
        )
        .await
        .map_err(|e| RefreshError::unavailable(SERVICE, e))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(RefreshError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RefreshError::Unauthorized);
            }
            status if !status.is_success() => {
                return Err(RefreshError::unavailable(SERVICE, format!("status {status}")));
            }
            _ => {}
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| RefreshError::unavailable(SERVICE, e))?;
        if response_text.trim().is_empty() {
            return Err(RefreshError::malformed(SERVICE, "empty response body"));
        }

        let snapshot: HoldingsSnapshot = serde_json::from_str(&response_text)
            .map_err(|e| RefreshError::malformed(SERVICE, e))?;
        debug!(
            "Fetched holdings across {} exchange sections",
            snapshot.exchanges.len()
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(response: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(header("X-API-Key", "test-key"))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_holdings_fetch() {
        let body = r#"{
            "last_update": "2022-05-14T10:00:00Z",
            "binance": {
                "BTC": {
                    "balance": 0.5,
                    "pairs": {
                        "USDT": {
                            "buy_qty": 0.5,
                            "cost": 15000.0,
                            "sell_qty": 0,
                            "revenue": 0,
                            "fees": null
                        }
                    }
                },
                "DOT": {"balance": 12.0, "pairs": null}
            }
        }"#;
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let snapshot = provider.fetch_holdings().await.unwrap();

        assert!(snapshot.last_update.is_some());
        let btc = &snapshot.exchanges["binance"]["BTC"];
        assert_eq!(btc.balance, 0.5);
        assert_eq!(btc.pairs.as_ref().unwrap()["USDT"].cost, 15_000.0);
        assert!(snapshot.exchanges["binance"]["DOT"].pairs.is_none());
    }

    #[tokio::test]
    async fn test_missing_history_maps_to_not_found() {
        let mock_server = create_mock_server(ResponseTemplate::new(404)).await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let result = provider.fetch_holdings().await;

        assert!(matches!(result, Err(RefreshError::NotFound)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "no trade history recorded for this key"
        );
    }

    #[tokio::test]
    async fn test_rejected_key_maps_to_unauthorized() {
        let mock_server = create_mock_server(ResponseTemplate::new(401)).await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let result = provider.fetch_holdings().await;

        assert!(matches!(result, Err(RefreshError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_unavailable() {
        let mock_server = create_mock_server(ResponseTemplate::new(500)).await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let result = provider.fetch_holdings().await;

        let error = result.unwrap_err();
        assert!(error.is_degradable());
        assert_eq!(
            error.to_string(),
            "ledger is unavailable: status 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_empty_body_is_malformed() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("")).await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let result = provider.fetch_holdings().await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "ledger returned a malformed response: empty response body"
        );
    }

    #[tokio::test]
    async fn test_unparseable_body_is_malformed() {
        let mock_server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
                .await;

        let provider = LedgerProvider::new(&mock_server.uri(), "test-key");
        let result = provider.fetch_holdings().await;

        let error = result.unwrap_err();
        assert!(matches!(error, RefreshError::Malformed { .. }));
        assert!(!error.is_degradable());
    }
}
