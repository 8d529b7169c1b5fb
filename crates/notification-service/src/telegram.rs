use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::templates::TelegramTemplate;
use crate::{Alert, NotificationChannel, NotificationConfig, NotificationError};

/// Telegram Bot API `sendMessage` channel.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let token = config
            .telegram_bot_token
            .as_deref()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_BOT_TOKEN not set".into()))?;
        let chat_id = config
            .telegram_chat_id
            .clone()
            .ok_or_else(|| NotificationError::Config("TELEGRAM_CHAT_ID not set".into()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| NotificationError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.telegram_api_base.trim_end_matches('/'),
                token
            ),
            chat_id,
        })
    }
}

#[async_trait]
impl NotificationChannel for TelegramNotifier {
    async fn send(&self, alert: &Alert) -> Result<(), NotificationError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": TelegramTemplate::render(alert),
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotificationError::Telegram(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Telegram(format!("HTTP {}: {}", status, body)));
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
