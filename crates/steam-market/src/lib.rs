//! Steam Community Market client
//!
//! Wraps the `priceoverview` endpoint. Steam throttles aggressively, so every
//! request goes through a small concurrency gate and a pacing delay that grows
//! with consecutive failures.

use flipper_core::{parse_price, FlipOpportunity};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;

pub const PRICEOVERVIEW_URL: &str = "https://steamcommunity.com/market/priceoverview/";

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Steam currency code for RUB
pub const CURRENCY_RUB: u32 = 5;

#[derive(Error, Debug)]
pub enum SteamError {
    #[error("Rate limited by Steam")]
    RateLimited,

    #[error("Steam HTTP {0}")]
    Http(u16),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Steam returned success=false")]
    Unsuccessful,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Client error: {0}")]
    Client(String),
}

/// Raw `priceoverview` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceOverview {
    pub success: bool,
    #[serde(default)]
    pub lowest_price: Option<String>,
    #[serde(default)]
    pub median_price: Option<String>,
    #[serde(default)]
    pub volume: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SteamMarketConfig {
    pub base_url: String,
    pub currency: u32,
    /// Pacing delay before every request
    pub base_delay: Duration,
    /// Extra pacing per consecutive failure
    pub delay_step: Duration,
    pub max_delay: Duration,
    /// How long to hold off after a 429
    pub rate_limit_backoff: Duration,
    pub max_concurrent: usize,
    pub timeout: Duration,
}

impl Default for SteamMarketConfig {
    fn default() -> Self {
        Self {
            base_url: PRICEOVERVIEW_URL.to_string(),
            currency: CURRENCY_RUB,
            base_delay: Duration::from_millis(1200),
            delay_step: Duration::from_millis(800),
            max_delay: Duration::from_secs(5),
            rate_limit_backoff: Duration::from_secs(60),
            max_concurrent: 3,
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Clone)]
pub struct SteamMarketClient {
    client: Client,
    config: SteamMarketConfig,
    semaphore: Arc<Semaphore>,
    failures: Arc<AtomicU32>,
}

impl SteamMarketClient {
    pub fn new(currency: u32) -> Result<Self, SteamError> {
        Self::with_config(SteamMarketConfig {
            currency,
            ..SteamMarketConfig::default()
        })
    }

    pub fn with_config(config: SteamMarketConfig) -> Result<Self, SteamError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SteamError::Client(e.to_string()))?;

        Ok(Self {
            client,
            semaphore: Arc::new(Semaphore::new(config.max_concurrent.max(1))),
            failures: Arc::new(AtomicU32::new(0)),
            config,
        })
    }

    /// Consecutive failed fetches since the last success
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    fn pacing_delay(&self) -> Duration {
        let delay = self.config.base_delay + self.config.delay_step * self.failures();
        delay.min(self.config.max_delay)
    }

    fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Fetch the price overview for one item.
    pub async fn fetch(&self, app_id: i64, market_hash_name: &str) -> Result<PriceOverview, SteamError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| SteamError::Client(e.to_string()))?;

        tokio::time::sleep(self.pacing_delay()).await;

        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[
                ("appid", app_id.to_string()),
                ("currency", self.config.currency.to_string()),
                ("market_hash_name", market_hash_name.to_string()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                self.record_failure();
                tracing::warn!("❗ {} Network error: {}", market_hash_name, e);
                return Err(SteamError::Network(e.to_string()));
            }
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!(
                "⏳ Rate limited, backing off for {}s",
                self.config.rate_limit_backoff.as_secs()
            );
            tokio::time::sleep(self.config.rate_limit_backoff).await;
            return Err(SteamError::RateLimited);
        }

        if status != StatusCode::OK {
            self.record_failure();
            tracing::warn!("❗ {} Steam HTTP {}", market_hash_name, status.as_u16());
            return Err(SteamError::Http(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.record_failure();
                tracing::warn!("❗ {} Network error: {}", market_hash_name, e);
                return Err(SteamError::Network(e.to_string()));
            }
        };

        let data: PriceOverview = match serde_json::from_str(&body) {
            Ok(data) => data,
            Err(e) => {
                self.record_failure();
                tracing::warn!("❗ {} Invalid JSON", market_hash_name);
                return Err(SteamError::InvalidJson(e.to_string()));
            }
        };

        if !data.success {
            self.record_failure();
            tracing::warn!("❗ {} Steam rate-limited", market_hash_name);
            return Err(SteamError::Unsuccessful);
        }

        self.failures.store(0, Ordering::Relaxed);
        Ok(data)
    }
}

/// Turn a price overview into a flip: buy at the lowest listing, sell at the median.
pub fn build_opportunity(name: &str, data: &PriceOverview) -> Option<FlipOpportunity> {
    let lowest = data.lowest_price.as_deref().filter(|s| !s.is_empty())?;
    let median = data.median_price.as_deref().filter(|s| !s.is_empty())?;

    let buy_price = parse_price(lowest);
    let sell_price = parse_price(median);

    let volume: i64 = data
        .volume
        .as_deref()
        .unwrap_or("0")
        .replace(',', "")
        .trim()
        .parse()
        .ok()?;

    if buy_price <= 0.0 || sell_price <= 0.0 {
        return None;
    }

    Some(FlipOpportunity::new(name, buy_price, sell_price, volume))
}
