use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::core::rates::{CurrencyPair, RankedRate, RateSource, RateTable, RatesSnapshot};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetches the full rates payload from a single JSON endpoint. Never retries;
/// the next poll is the retry.
pub struct HttpRateSource {
    url: String,
    client: reqwest::Client,
}

impl HttpRateSource {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("xrate/1.0")
            .timeout(timeout)
            .build()?;
        Ok(HttpRateSource {
            url: url.to_string(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct RatesResponse {
    rates: HashMap<String, f64>,
    #[serde(default)]
    top_rates: Vec<RankedRate>,
    updated_at: DateTime<Utc>,
    /// Seconds; servers may send it as `1800` or `1800.0`.
    next_update: f64,
}

impl RatesResponse {
    fn into_snapshot(self) -> Result<RatesSnapshot> {
        let mut rates = RateTable::new();
        for (key, rate) in self.rates {
            let Some(pair) = CurrencyPair::parse_key(&key) else {
                warn!(key = %key, "Skipping rate for unknown currency pair");
                continue;
            };
            if !rate.is_finite() || rate <= 0.0 {
                return Err(anyhow!("Invalid rate {} for pair {}", rate, key));
            }
            rates.insert(pair.from, pair.to, rate);
        }

        Ok(RatesSnapshot {
            rates,
            top_rates: self.top_rates,
            updated_at: self.updated_at,
            next_update_secs: next_update_secs(self.next_update),
        })
    }
}

/// Advisory only, so a value that is not a usable delay becomes zero.
fn next_update_secs(value: f64) -> u64 {
    if value.is_finite() && value >= 0.0 {
        value.round() as u64
    } else {
        warn!(next_update = value, "Ignoring invalid nextUpdate");
        0
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    #[instrument(name = "RatesFetch", skip(self), fields(url = %self.url))]
    async fn fetch_snapshot(&self) -> Result<RatesSnapshot> {
        debug!("Requesting rates from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| anyhow!("Request error: {} for URL: {}", e, self.url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for URL: {}",
                response.status(),
                self.url
            ));
        }

        let text = response.text().await?;
        let data: RatesResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse rates response from {}: {}", self.url, e))?;
        debug!(pairs = data.rates.len(), "Received rates response");

        data.into_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::currency::Currency;
    use crate::core::rates::Trend;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const FULL_RESPONSE: &str = r#"{
        "rates": {
            "USDT-RUB": 92.5,
            "RUB-USDT": 0.0108,
            "EUR-CASH-RUB": 101.2,
            "EUR-CARD-USDT": 1.099
        },
        "topRates": [
            {"from": "USDT", "to": "RUB", "rate": 92.5, "trend": "up", "change": 0.31},
            {"from": "EUR (нал)", "to": "RUB", "rate": 101.2, "trend": "down", "change": -0.12}
        ],
        "updatedAt": "2025-03-01T10:15:30.123456Z",
        "nextUpdate": 1800
    }"#;

    async fn create_mock_server(template: ResponseTemplate) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rates"))
            .respond_with(template)
            .mount(&mock_server)
            .await;
        mock_server
    }

    fn source_for(server: &MockServer) -> HttpRateSource {
        HttpRateSource::new(&format!("{}/rates", server.uri()), DEFAULT_TIMEOUT).unwrap()
    }

    #[tokio::test]
    async fn test_successful_rates_fetch() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_string(FULL_RESPONSE)).await;

        let snapshot = source_for(&server).fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.rates.len(), 4);
        assert_eq!(snapshot.rate(Currency::Usdt, Currency::Rub), 92.5);
        assert_eq!(snapshot.rate(Currency::Rub, Currency::Usdt), 0.0108);
        assert_eq!(snapshot.rate(Currency::EurCash, Currency::Rub), 101.2);
        assert_eq!(snapshot.rate(Currency::EurCard, Currency::Usdt), 1.099);
        assert_eq!(snapshot.top_rates.len(), 2);
        assert_eq!(snapshot.top_rates[1].from, "EUR (нал)");
        assert_eq!(snapshot.top_rates[1].trend, Trend::Down);
        assert_eq!(snapshot.top_rates[1].change, -0.12);
        assert_eq!(snapshot.next_update_secs, 1800);
        assert_eq!(
            snapshot.updated_at.to_rfc3339(),
            "2025-03-01T10:15:30.123456+00:00"
        );
    }

    #[tokio::test]
    async fn test_missing_top_rates_is_tolerated() {
        let body = r#"{
            "rates": {"USDT-RUB": 92.5},
            "updatedAt": "2025-03-01T10:15:30Z",
            "nextUpdate": 1800
        }"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let snapshot = source_for(&server).fetch_snapshot().await.unwrap();
        assert!(snapshot.top_rates.is_empty());
        assert_eq!(snapshot.rates.len(), 1);
    }

    #[tokio::test]
    async fn test_fractional_next_update_is_accepted() {
        let body = r#"{
            "rates": {"USDT-RUB": 92.5},
            "topRates": [],
            "updatedAt": "2025-03-01T10:15:30Z",
            "nextUpdate": 1800.0
        }"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let snapshot = source_for(&server).fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.next_update_secs, 1800);
        assert_eq!(snapshot.rate(Currency::Usdt, Currency::Rub), 92.5);
    }

    #[test]
    fn test_next_update_secs() {
        assert_eq!(next_update_secs(1800.0), 1800);
        assert_eq!(next_update_secs(899.6), 900);
        assert_eq!(next_update_secs(-5.0), 0);
    }

    #[tokio::test]
    async fn test_unknown_pairs_are_skipped() {
        let body = r#"{
            "rates": {"USDT-RUB": 92.5, "BTC-RUB": 5000000.0},
            "topRates": [],
            "updatedAt": "2025-03-01T10:15:30Z",
            "nextUpdate": 1800
        }"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let snapshot = source_for(&server).fetch_snapshot().await.unwrap();
        assert_eq!(snapshot.rates.len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_rejected() {
        let body = r#"{
            "rates": {"USDT-RUB": 0.0},
            "topRates": [],
            "updatedAt": "2025-03-01T10:15:30Z",
            "nextUpdate": 1800
        }"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let result = source_for(&server).fetch_snapshot().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Invalid rate 0 for pair USDT-RUB"
        );
    }

    #[tokio::test]
    async fn test_api_error_response() {
        let server = create_mock_server(ResponseTemplate::new(500)).await;
        let source = source_for(&server);

        let result = source.fetch_snapshot().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            format!("HTTP error: 500 Internal Server Error for URL: {}", source.url())
        );
    }

    #[tokio::test]
    async fn test_missing_fields_response() {
        let body = r#"{"rates": {"USDT-RUB": 92.5}, "topRates": []}"#;
        let server = create_mock_server(ResponseTemplate::new(200).set_body_string(body)).await;

        let result = source_for(&server).fetch_snapshot().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse rates response")
        );
    }

    #[tokio::test]
    async fn test_non_json_response() {
        let server =
            create_mock_server(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
                .await;

        let result = source_for(&server).fetch_snapshot().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse rates response")
        );
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let server = create_mock_server(
            ResponseTemplate::new(200)
                .set_body_string(FULL_RESPONSE)
                .set_delay(Duration::from_secs(2)),
        )
        .await;
        let source =
            HttpRateSource::new(&format!("{}/rates", server.uri()), Duration::from_millis(200))
                .unwrap();

        let result = source.fetch_snapshot().await;
        assert!(result.unwrap_err().to_string().contains("Request error"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let source = HttpRateSource::new("http://127.0.0.1:9/rates", DEFAULT_TIMEOUT).unwrap();
        let result = source.fetch_snapshot().await;
        assert!(result.unwrap_err().to_string().starts_with("Request error"));
    }
}
