//! Flip math and evaluation rules.
//!
//! A flip buys at the lowest listing and sells at the median price. Every
//! derived value is computed after the Steam market fee.

use serde::{Deserialize, Serialize};

use crate::{FlipConfig, RejectReason, RiskLevel};

/// Display width for item names in log lines
pub const MAX_NAME_LEN: usize = 28;

/// Outcome of running the evaluation rules on a flip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlipEvaluation {
    pub profitable: bool,
    pub reject_reason: Option<RejectReason>,
}

impl FlipEvaluation {
    pub fn accepted() -> Self {
        Self {
            profitable: true,
            reject_reason: None,
        }
    }

    pub fn rejected(reason: RejectReason) -> Self {
        Self {
            profitable: false,
            reject_reason: Some(reason),
        }
    }

    pub fn should_notify(&self) -> bool {
        self.profitable
    }
}

/// A candidate buy-low/sell-median trade for a single market item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipOpportunity {
    pub name: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub volume: i64,
}

impl FlipOpportunity {
    pub fn new(name: impl Into<String>, buy_price: f64, sell_price: f64, volume: i64) -> Self {
        Self {
            name: name.into(),
            buy_price,
            sell_price,
            volume,
        }
    }

    /// Profit (or loss) after buying at `buy_price` and selling at
    /// `sell_price` minus the market fee.
    pub fn net_profit(&self, config: &FlipConfig) -> f64 {
        self.sell_price * (1.0 - config.steam_fee) - self.buy_price
    }

    /// Return on the invested buy price, after fees.
    pub fn profit_pct(&self, config: &FlipConfig) -> f64 {
        if self.buy_price <= 0.0 {
            return 0.0;
        }
        self.net_profit(config) / self.buy_price
    }

    /// Relative gap between sell and buy price, as a fraction of the buy price.
    ///
    /// Large spreads usually mean thin liquidity or outlier sales rather than
    /// repeatable profit.
    pub fn spread_pct(&self) -> f64 {
        if self.buy_price <= 0.0 {
            return 0.0;
        }
        (self.sell_price - self.buy_price) / self.buy_price
    }

    pub fn risk_level(&self, config: &FlipConfig) -> RiskLevel {
        let spread = self.spread_pct();

        if spread >= config.risk_high_spread || self.volume <= config.risk_high_min_volume {
            return RiskLevel::High;
        }

        if spread >= config.risk_medium_spread || self.volume <= config.risk_medium_min_volume {
            return RiskLevel::Medium;
        }

        RiskLevel::Low
    }

    /// Apply the acceptance rules in order; the first failing rule wins.
    pub fn evaluate(&self, config: &FlipConfig) -> FlipEvaluation {
        let net_profit = self.net_profit(config);
        let profit_pct = self.profit_pct(config);

        if profit_pct < 0.0 {
            return FlipEvaluation::rejected(RejectReason::NegativeRoi);
        }
        if self.risk_level(config) == RiskLevel::High {
            return FlipEvaluation::rejected(RejectReason::HighRisk);
        }
        if self.volume < config.min_volume {
            return FlipEvaluation::rejected(RejectReason::LowVolume);
        }
        if net_profit < config.min_profit {
            return FlipEvaluation::rejected(RejectReason::LowProfit);
        }
        if profit_pct < config.min_roi {
            return FlipEvaluation::rejected(RejectReason::LowRoi);
        }

        FlipEvaluation::accepted()
    }

    pub fn short_name(&self) -> String {
        if self.name.chars().count() <= MAX_NAME_LEN {
            return self.name.clone();
        }
        let mut short: String = self.name.chars().take(MAX_NAME_LEN - 1).collect();
        short.push('…');
        short
    }

    /// One-line summary for the scan log.
    pub fn log_line(&self, evaluation: &FlipEvaluation, config: &FlipConfig) -> String {
        let name = self.short_name();
        if evaluation.profitable {
            return format!(
                "💰 {:<width$} | BUY {:.2} SELL {:.2} NET +{:.2} ROI {:.2}% VOL {} RISK {}",
                name,
                self.buy_price,
                self.sell_price,
                self.net_profit(config),
                self.profit_pct(config) * 100.0,
                self.volume,
                self.risk_level(config),
                width = MAX_NAME_LEN,
            );
        }

        let reason = evaluation
            .reject_reason
            .map(|r| r.as_str())
            .unwrap_or("—");

        format!(
            "❌ {:<width$} | {} BUY {:.2} SELL {:.2} SPREAD {:.3} NET {:.2} ROI {:.2}% VOL {} RISK {}",
            name,
            reason,
            self.buy_price,
            self.sell_price,
            self.spread_pct(),
            self.net_profit(config),
            self.profit_pct(config) * 100.0,
            self.volume,
            self.risk_level(config),
            width = MAX_NAME_LEN,
        )
    }
}
