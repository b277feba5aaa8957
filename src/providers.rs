// External collaborators: the availability search and the listing pages.
// HTTP implementations retry transient failures with exponential backoff.

use crate::config::{ProviderConfig, RetryConfig};
use crate::models::{PriceQuote, SearchRecord, Weekend};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const SEARCH_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("Provider unreachable: {0}")]
    Unreachable(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Provider error: {status_code} - {message}")]
    ResponseError {
        status_code: u16,
        message: String,
        is_retryable: bool,
    },

    #[error("Malformed provider payload: {0}")]
    Decode(String),
}

impl ProviderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Unreachable(_) | ProviderError::Timeout(_) => true,
            ProviderError::ResponseError { is_retryable, .. } => *is_retryable,
            ProviderError::Decode(_) => false,
        }
    }
}

#[async_trait]
pub trait AvailabilityProvider: Send + Sync + 'static {
    // Quotes for every cabin available over the weekend's stay window
    async fn search(&self, weekend: &Weekend) -> Result<Vec<PriceQuote>, ProviderError>;
}

#[async_trait]
pub trait ListingProvider: Send + Sync + 'static {
    // Raw listing page content
    async fn fetch_listing(&self, url: &str) -> Result<Bytes, ProviderError>;
}

// Helper to calculate exponential backoff with jitter
pub fn calculate_backoff(retry_attempt: u32, config: &RetryConfig) -> Duration {
    let base_backoff_ms = (config.initial_backoff_ms as f64
        * config.backoff_multiplier.powf(retry_attempt as f64))
    .min(config.max_backoff_ms as f64);

    let jitter = rand::random::<f64>() * config.jitter_factor * base_backoff_ms;
    let backoff_ms = base_backoff_ms * (1.0 - config.jitter_factor / 2.0) + jitter;

    Duration::from_millis(backoff_ms as u64)
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
pub async fn with_retry<T, F, Fut>(
    config: &RetryConfig,
    what: &str,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let backoff = calculate_backoff(attempt, config);
                warn!(
                    "{} failed (attempt {}): {}, retrying in {:?}",
                    what,
                    attempt + 1,
                    e,
                    backoff
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn map_transport_error(error: reqwest::Error, timeout_ms: u64) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout(timeout_ms)
    } else {
        ProviderError::Unreachable(error.to_string())
    }
}

async fn get_body(
    request: reqwest::RequestBuilder,
    timeout_ms: u64,
) -> Result<Bytes, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| map_transport_error(e, timeout_ms))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::ResponseError {
            status_code: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string(),
            is_retryable: status.is_server_error() || status.as_u16() == 429,
        });
    }

    response
        .bytes()
        .await
        .map_err(|e| map_transport_error(e, timeout_ms))
}

pub fn build_client(config: &ProviderConfig) -> Result<Client, ProviderError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_millis(config.timeout_ms))
        .build()
        .map_err(|e| ProviderError::Unreachable(e.to_string()))
}

/// Decode a search response body into quotes, skipping unpriced records.
pub fn parse_search_response(body: &[u8]) -> Result<Vec<PriceQuote>, ProviderError> {
    let records: Vec<SearchRecord> =
        serde_json::from_slice(body).map_err(|e| ProviderError::Decode(e.to_string()))?;

    Ok(records
        .into_iter()
        .filter_map(|record| {
            let name = record.name.clone();
            let quote = record.into_quote();
            if quote.is_none() {
                debug!("Skipping {}: no price in search result", name);
            }
            quote
        })
        .collect())
}

pub struct HttpAvailabilityProvider {
    client: Client,
    search_url: String,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl HttpAvailabilityProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            search_url: config.search_url.clone(),
            timeout_ms: config.timeout_ms,
            retry: config.retry.clone(),
        }
    }

    pub fn query_params(weekend: &Weekend) -> Vec<(&'static str, String)> {
        vec![
            ("rcav[begin]", weekend.begin.format(SEARCH_DATE_FORMAT).to_string()),
            ("rcav[end]", weekend.end.format(SEARCH_DATE_FORMAT).to_string()),
            ("rcav[adult]", "1".to_string()),
            ("rcav[child]", "0".to_string()),
            ("rcav[flex]", String::new()),
            ("rcav[flex_type]", "d".to_string()),
        ]
    }
}

#[async_trait]
impl AvailabilityProvider for HttpAvailabilityProvider {
    async fn search(&self, weekend: &Weekend) -> Result<Vec<PriceQuote>, ProviderError> {
        let params = Self::query_params(weekend);
        let what = format!("Search for {}", weekend.name);
        let body = with_retry(&self.retry, &what, || {
            get_body(
                self.client.get(self.search_url.as_str()).query(&params),
                self.timeout_ms,
            )
        })
        .await?;

        parse_search_response(&body)
    }
}

pub struct HttpListingProvider {
    client: Client,
    timeout_ms: u64,
    retry: RetryConfig,
}

impl HttpListingProvider {
    pub fn new(client: Client, config: &ProviderConfig) -> Self {
        Self {
            client,
            timeout_ms: config.timeout_ms,
            retry: config.retry.clone(),
        }
    }
}

#[async_trait]
impl ListingProvider for HttpListingProvider {
    async fn fetch_listing(&self, url: &str) -> Result<Bytes, ProviderError> {
        let what = format!("Listing fetch {}", url);
        with_retry(&self.retry, &what, || {
            get_body(self.client.get(url), self.timeout_ms)
        })
        .await
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = RetryConfig {
            jitter_factor: 0.0,
            ..RetryConfig::default()
        };
        assert_eq!(calculate_backoff(0, &config), Duration::from_millis(100));
        assert_eq!(calculate_backoff(1, &config), Duration::from_millis(200));
        assert_eq!(calculate_backoff(3, &config), Duration::from_millis(800));
        assert_eq!(calculate_backoff(20, &config), Duration::from_millis(10000));
    }

    #[test]
    fn test_backoff_jitter_stays_in_band() {
        let config = RetryConfig::default();
        for _ in 0..100 {
            let backoff = calculate_backoff(1, &config).as_millis();
            assert!((190..=210).contains(&backoff), "backoff {}ms out of band", backoff);
        }
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let attempts = AtomicU32::new(0);
        let result = with_retry(&fast_retry(), "flaky", || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::Unreachable("connection reset".to_string()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_budget() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_retry(), "down", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ProviderError::Timeout(10)) }
        })
        .await;

        assert!(matches!(result, Err(ProviderError::Timeout(10))));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let attempts = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast_retry(), "missing", || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::ResponseError {
                    status_code: 404,
                    message: "Not Found".to_string(),
                    is_retryable: false,
                })
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_query_params_use_us_dates() {
        let weekend = Weekend::new(
            "July Weekend 3",
            NaiveDate::from_ymd_opt(2026, 7, 17).unwrap(),
            NaiveDate::from_ymd_opt(2026, 7, 20).unwrap(),
        );
        let params = HttpAvailabilityProvider::query_params(&weekend);
        assert_eq!(params[0], ("rcav[begin]", "07/17/2026".to_string()));
        assert_eq!(params[1], ("rcav[end]", "07/20/2026".to_string()));
        assert_eq!(params[5], ("rcav[flex_type]", "d".to_string()));
    }

    #[test]
    fn test_parse_search_response() {
        let body = br#"[
            {"eid": 1, "name": "Tips Up", "prices": [{"p": 1200.0}, {"p": 1300.0}]},
            {"eid": 2, "name": "No Rates", "prices": []}
        ]"#;
        let quotes = parse_search_response(body).unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].price, 1200.0);

        assert!(matches!(
            parse_search_response(b"<html>maintenance</html>"),
            Err(ProviderError::Decode(_))
        ));
    }
}
