mod telegram;
mod templates;

pub use telegram::TelegramNotifier;
pub use templates::TelegramTemplate;

use async_trait::async_trait;
use flipper_core::RiskLevel;
use serde::{Deserialize, Serialize};

pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Alert types that trigger notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AlertType {
    FlipFound {
        app_id: i64,
        item_name: String,
        buy_price: f64,
        sell_price: f64,
        net_profit: f64,
        profit_pct: f64,
        volume: i64,
        risk_level: RiskLevel,
    },
    ScannerStarted {
        watchlist_size: usize,
        interval_secs: u64,
    },
    ScanFailed {
        reason: String,
    },
}

/// A notification alert to be dispatched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_type: AlertType,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub title: String,
    pub message: String,
}

impl Alert {
    pub fn new(
        alert_type: AlertType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            alert_type,
            timestamp: chrono::Utc::now(),
            title: title.into(),
            message: message.into(),
        }
    }
}

/// Trait for notification channels.
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError>;
    fn name(&self) -> &str;
}

/// Errors from the notification system.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Telegram error: {0}")]
    Telegram(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Configuration for the notification service.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub telegram_api_base: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: TELEGRAM_API_BASE.to_string(),
        }
    }
}

impl NotificationConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self {
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|s| !s.is_empty()),
            telegram_chat_id: std::env::var("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|s| !s.is_empty()),
            telegram_api_base: std::env::var("TELEGRAM_API_BASE")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| TELEGRAM_API_BASE.to_string()),
        }
    }
}

/// Dispatches alerts to all configured channels.
pub struct NotificationService {
    channels: std::sync::Arc<Vec<Box<dyn NotificationChannel>>>,
}

impl NotificationService {
    pub fn new(config: &NotificationConfig) -> Self {
        let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

        if config.telegram_bot_token.is_some() && config.telegram_chat_id.is_some() {
            match TelegramNotifier::new(config) {
                Ok(notifier) => {
                    tracing::info!("Telegram notifications enabled");
                    channels.push(Box::new(notifier));
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize Telegram notifier: {}", e);
                }
            }
        }

        if channels.is_empty() {
            tracing::info!(
                "No notification channels configured (set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID)"
            );
        }

        Self::with_channels(channels)
    }

    pub fn with_channels(channels: Vec<Box<dyn NotificationChannel>>) -> Self {
        Self {
            channels: std::sync::Arc::new(channels),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.channels.is_empty()
    }

    /// Send an alert to all configured channels (fire-and-forget via tokio::spawn).
    pub fn send_alert(&self, alert: Alert) {
        let channels = self.channels.clone();
        tokio::spawn(async move {
            for channel in channels.iter() {
                match channel.send(&alert).await {
                    Ok(()) => tracing::debug!("Sent notification via {}", channel.name()),
                    Err(e) => {
                        tracing::warn!("Failed to send notification via {}: {}", channel.name(), e)
                    }
                }
            }
        });
    }

    /// Send alert to all channels, awaiting completion.
    ///
    /// Returns `true` if at least one channel delivered it.
    pub async fn send_alert_async(&self, alert: &Alert) -> bool {
        let mut delivered = false;
        for channel in self.channels.iter() {
            match channel.send(alert).await {
                Ok(()) => {
                    tracing::debug!("Sent notification via {}", channel.name());
                    delivered = true;
                }
                Err(e) => {
                    tracing::warn!("Failed to send notification via {}: {}", channel.name(), e)
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct RecordingChannel {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationChannel for RecordingChannel {
        async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
            if self.fail {
                return Err(NotificationError::Telegram("chat not found".into()));
            }
            self.sent.lock().unwrap().push(alert.title.clone());
            Ok(())
        }

        fn name(&self) -> &str {
            "recording"
        }
    }

    fn started() -> Alert {
        Alert::new(
            AlertType::ScannerStarted {
                watchlist_size: 3,
                interval_secs: 300,
            },
            "Scanner started",
            "",
        )
    }

    #[test]
    fn test_unconfigured_service_is_disabled() {
        let service = NotificationService::new(&NotificationConfig::default());
        assert!(!service.is_enabled());
    }

    #[tokio::test]
    async fn test_send_alert_async_reports_delivery() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = NotificationService::with_channels(vec![
            Box::new(RecordingChannel { sent: sent.clone(), fail: true }),
            Box::new(RecordingChannel { sent: sent.clone(), fail: false }),
        ]);

        assert!(service.send_alert_async(&started()).await);
        assert_eq!(sent.lock().unwrap().as_slice(), ["Scanner started"]);
    }

    #[tokio::test]
    async fn test_all_channels_failing() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let service = NotificationService::with_channels(vec![Box::new(RecordingChannel {
            sent,
            fail: true,
        })]);
        assert!(!service.send_alert_async(&started()).await);
    }
}
