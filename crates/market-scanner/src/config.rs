use std::time::Duration;

use anyhow::{Context, Result};
use flipper_core::{env_or, FlipConfig};
use notification_service::NotificationConfig;
use steam_market::CURRENCY_RUB;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub check_interval_seconds: u64,  // 300 (5 minutes)
    pub item_pause_ms: u64,           // 1500, on top of the client's own pacing
    pub steam_currency: u32,          // 5 (RUB)
    pub notify_cooldown_minutes: i64, // 30
    pub database_url: String,

    pub flip: FlipConfig,

    pub notifications: NotificationConfig,
}

impl ScannerConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            check_interval_seconds: env_or("CHECK_INTERVAL_SECONDS", 300)?,
            item_pause_ms: env_or("ITEM_PAUSE_MS", 1500)?,
            steam_currency: env_or("STEAM_CURRENCY", CURRENCY_RUB)?,
            notify_cooldown_minutes: env_or("NOTIFY_COOLDOWN_MINUTES", 30)?,
            database_url: env_or("DATABASE_URL", "sqlite:steamflipper.db".to_string())?,
            flip: FlipConfig::from_env().context("invalid flip thresholds")?,
            notifications: NotificationConfig::from_env(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.check_interval_seconds == 0 {
            anyhow::bail!("CHECK_INTERVAL_SECONDS must be greater than zero");
        }
        if self.notify_cooldown_minutes < 0 {
            anyhow::bail!("NOTIFY_COOLDOWN_MINUTES cannot be negative");
        }
        if chrono::Duration::try_minutes(self.notify_cooldown_minutes).is_none() {
            anyhow::bail!(
                "NOTIFY_COOLDOWN_MINUTES is out of range: {}",
                self.notify_cooldown_minutes
            );
        }
        if !(0.0..1.0).contains(&self.flip.steam_fee) {
            anyhow::bail!("STEAM_FEE must be in [0, 1), got {}", self.flip.steam_fee);
        }
        Ok(())
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_seconds)
    }

    pub fn item_pause(&self) -> Duration {
        Duration::from_millis(self.item_pause_ms)
    }

    pub fn notify_cooldown(&self) -> chrono::Duration {
        chrono::Duration::try_minutes(self.notify_cooldown_minutes)
            .unwrap_or(chrono::Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ScannerConfig {
        ScannerConfig {
            check_interval_seconds: 300,
            item_pause_ms: 1500,
            steam_currency: CURRENCY_RUB,
            notify_cooldown_minutes: 30,
            database_url: "sqlite::memory:".to_string(),
            flip: FlipConfig::default(),
            notifications: NotificationConfig::default(),
        }
    }

    #[test]
    fn test_durations() {
        let config = sample();
        assert_eq!(config.check_interval(), Duration::from_secs(300));
        assert_eq!(config.item_pause(), Duration::from_millis(1500));
        assert_eq!(config.notify_cooldown(), chrono::Duration::minutes(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = ScannerConfig {
            check_interval_seconds: 0,
            ..sample()
        };
        assert!(zero_interval.validate().is_err());

        let bad_fee = ScannerConfig {
            flip: FlipConfig {
                steam_fee: 1.0,
                ..FlipConfig::default()
            },
            ..sample()
        };
        assert!(bad_fee.validate().is_err());
    }

    #[test]
    fn test_huge_cooldown_is_a_config_error() {
        let huge = ScannerConfig {
            notify_cooldown_minutes: i64::MAX,
            ..sample()
        };
        let err = huge.validate().unwrap_err();
        assert!(err.to_string().contains("NOTIFY_COOLDOWN_MINUTES"));
        assert_eq!(huge.notify_cooldown(), chrono::Duration::MAX);

        let week = ScannerConfig {
            notify_cooldown_minutes: 7 * 24 * 60,
            ..sample()
        };
        assert!(week.validate().is_ok());
        assert_eq!(week.notify_cooldown(), chrono::Duration::days(7));
    }
}
