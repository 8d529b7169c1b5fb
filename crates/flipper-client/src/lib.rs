//! Typed client for the SteamFlipper HTTP API
//!
//! One request per call, no retries: errors go straight back to the caller.

use flipper_core::{Opportunity, WatchlistEntry, WatchlistSubmission};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to add item to watchlist")]
    WatchlistRejected,
}

#[derive(Clone)]
pub struct FlipperClient {
    base_url: String,
    client: Client,
}

impl FlipperClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    /// Uses `FLIPPER_API_URL`, defaulting to the local API server.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("FLIPPER_API_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /opportunities`
    pub async fn fetch_opportunities(&self) -> Result<Vec<Opportunity>, ClientError> {
        let url = format!("{}/opportunities", self.base_url);
        let opportunities = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(opportunities)
    }

    /// `POST /watchlist` with `{ "url": url }`; the URL is sent as given.
    pub async fn add_watchlist_item(&self, url: &str) -> Result<serde_json::Value, ClientError> {
        let endpoint = format!("{}/watchlist", self.base_url);
        let response = self
            .client
            .post(&endpoint)
            .json(&WatchlistSubmission {
                url: url.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!("Watchlist add returned HTTP {}", response.status());
            return Err(ClientError::WatchlistRejected);
        }

        Ok(response.json().await?)
    }

    /// `GET /watchlist`
    pub async fn fetch_watchlist(&self) -> Result<Vec<WatchlistEntry>, ClientError> {
        let url = format!("{}/watchlist", self.base_url);
        let entries = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use flipper_core::RiskLevel;
    use std::sync::{Arc, Mutex};

    async fn spawn_api(router: Router) -> FlipperClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        FlipperClient::new(format!("http://{}/", addr)).unwrap()
    }

    fn sample_opportunities() -> Vec<Opportunity> {
        vec![
            Opportunity {
                id: 7,
                app_id: 730,
                item_name: "Fracture Case".to_string(),
                buy_price: 10.5,
                sell_price: 13.2,
                net_profit: 0.72,
                profit_pct: 0.0686,
                volume: 1204,
                risk_level: RiskLevel::Low,
                detected_at: "2025-01-03T12:00:00Z".to_string(),
            },
            Opportunity {
                id: 9,
                app_id: 730,
                item_name: "AK-47 | Redline (Field-Tested)".to_string(),
                buy_price: 1200.0,
                sell_price: 1500.0,
                net_profit: 75.0,
                profit_pct: 0.0625,
                volume: 88,
                risk_level: RiskLevel::Medium,
                detected_at: "2025-01-03T12:01:00Z".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_fetch_opportunities_returns_array_unchanged() {
        let expected = sample_opportunities();
        let body = serde_json::to_value(&expected).unwrap();
        let router = Router::new().route(
            "/opportunities",
            get(move || {
                let body = body.clone();
                async move { Json(body) }
            }),
        );
        let client = spawn_api(router).await;

        let opportunities = client.fetch_opportunities().await.unwrap();
        assert_eq!(opportunities, expected);
    }

    #[tokio::test]
    async fn test_fetch_opportunities_ignores_extra_fields() {
        let router = Router::new().route(
            "/opportunities",
            get(|| async {
                Json(serde_json::json!([{
                    "id": 1,
                    "app_id": 730,
                    "item_name": "Fracture Case",
                    "buy_price": 10.0,
                    "sell_price": 20.0,
                    "net_profit": 7.0,
                    "profit_pct": 0.7,
                    "volume": 1000,
                    "spread_pct": 1.0,
                    "risk_level": "HIGH",
                    "profitable": false,
                    "reject_reason": "HIGH_RISK",
                    "detected_at": "2025-01-03T12:00:00Z"
                }]))
            }),
        );
        let client = spawn_api(router).await;

        let opportunities = client.fetch_opportunities().await.unwrap();
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_fetch_opportunities_propagates_http_errors() {
        let router = Router::new().route(
            "/opportunities",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "db down") }),
        );
        let client = spawn_api(router).await;

        let err = client.fetch_opportunities().await.unwrap_err();
        match err {
            ClientError::Http(e) => assert_eq!(e.status(), Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_add_watchlist_item_resolves_to_body() {
        let received = Arc::new(Mutex::new(None));
        let sink = received.clone();
        let router = Router::new().route(
            "/watchlist",
            post(move |Json(body): Json<serde_json::Value>| {
                let sink = sink.clone();
                async move {
                    *sink.lock().unwrap() = Some(body);
                    Json(serde_json::json!({ "status": "ok" }))
                }
            }),
        );
        let client = spawn_api(router).await;

        // Sent verbatim, no client-side validation
        let body = client.add_watchlist_item("  not even a url ").await.unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ok" }));
        assert_eq!(
            received.lock().unwrap().clone(),
            Some(serde_json::json!({ "url": "  not even a url " }))
        );
    }

    #[tokio::test]
    async fn test_add_watchlist_item_rejects_non_success() {
        let router = Router::new().route(
            "/watchlist",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "detail": "Invalid Steam Market URL" })),
                )
            }),
        );
        let client = spawn_api(router).await;

        let err = client.add_watchlist_item("https://example.com").await.unwrap_err();
        assert!(matches!(err, ClientError::WatchlistRejected));
        assert_eq!(err.to_string(), "Failed to add item to watchlist");
    }

    #[tokio::test]
    async fn test_transport_errors_propagate() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = FlipperClient::new(format!("http://{}", addr)).unwrap();
        let err = client.add_watchlist_item("x").await.unwrap_err();
        assert!(matches!(err, ClientError::Http(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = FlipperClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }
}
