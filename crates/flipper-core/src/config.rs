use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::FlipperError;

/// Thresholds used to price and judge a flip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipConfig {
    pub steam_fee: f64,              // 0.15 (Steam keeps ~15% of each sale)
    pub min_volume: i64,             // 20
    pub min_roi: f64,                // 0.03 (3%)
    pub min_profit: f64,             // 5.0 (account currency)
    pub risk_high_spread: f64,       // 0.40
    pub risk_medium_spread: f64,     // 0.25
    pub risk_high_min_volume: i64,   // 50
    pub risk_medium_min_volume: i64, // 150
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            steam_fee: 0.15,
            min_volume: 20,
            min_roi: 0.03,
            min_profit: 5.0,
            risk_high_spread: 0.40,
            risk_medium_spread: 0.25,
            risk_high_min_volume: 50,
            risk_medium_min_volume: 150,
        }
    }
}

impl FlipConfig {
    pub fn from_env() -> Result<Self, FlipperError> {
        let defaults = Self::default();
        Ok(Self {
            steam_fee: env_or("STEAM_FEE", defaults.steam_fee)?,
            min_volume: env_or("MIN_VOLUME", defaults.min_volume)?,
            min_roi: env_or("MIN_ROI", defaults.min_roi)?,
            min_profit: env_or("MIN_PROFIT", defaults.min_profit)?,
            risk_high_spread: env_or("RISK_HIGH_SPREAD", defaults.risk_high_spread)?,
            risk_medium_spread: env_or("RISK_MEDIUM_SPREAD", defaults.risk_medium_spread)?,
            risk_high_min_volume: env_or("RISK_HIGH_MIN_VOLUME", defaults.risk_high_min_volume)?,
            risk_medium_min_volume: env_or(
                "RISK_MEDIUM_MIN_VOLUME",
                defaults.risk_medium_min_volume,
            )?,
        })
    }
}

/// Read `key` from the environment, falling back to `default` when unset or blank.
pub fn env_or<T: FromStr>(key: &str, default: T) -> Result<T, FlipperError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| FlipperError::InvalidConfig {
                key: key.to_string(),
                value: raw,
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_when_unset() {
        let value: u64 = env_or("FLIPPER_TEST_SURELY_UNSET_KEY", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_env_or_rejects_garbage() {
        env::set_var("FLIPPER_TEST_GARBAGE_KEY", "not-a-number");
        let result: Result<i64, _> = env_or("FLIPPER_TEST_GARBAGE_KEY", 1);
        assert!(matches!(result, Err(FlipperError::InvalidConfig { .. })));
        env::remove_var("FLIPPER_TEST_GARBAGE_KEY");
    }

    #[test]
    fn test_env_or_parses_value() {
        env::set_var("FLIPPER_TEST_FEE_KEY", " 0.1 ");
        let fee: f64 = env_or("FLIPPER_TEST_FEE_KEY", 0.15).unwrap();
        assert!((fee - 0.1).abs() < f64::EPSILON);
        env::remove_var("FLIPPER_TEST_FEE_KEY");
    }
}
