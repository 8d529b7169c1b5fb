use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::FlipperError;

/// Liquidity/spread risk bucket of a flip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn badge(&self) -> &'static str {
        match self {
            RiskLevel::Low => "🟢",
            RiskLevel::Medium => "🟡",
            RiskLevel::High => "🔴",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = FlipperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(RiskLevel::Low),
            "MEDIUM" => Ok(RiskLevel::Medium),
            "HIGH" => Ok(RiskLevel::High),
            other => Err(FlipperError::InvalidData(format!("unknown risk level: {}", other))),
        }
    }
}

/// Why an evaluated flip was not considered profitable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectReason {
    LowVolume,
    LowProfit,
    LowRoi,
    NegativeRoi,
    HighRisk,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LowVolume => "LOW_VOLUME",
            RejectReason::LowProfit => "LOW_PROFIT",
            RejectReason::LowRoi => "LOW_ROI",
            RejectReason::NegativeRoi => "NEGATIVE_ROI",
            RejectReason::HighRisk => "HIGH_RISK",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RejectReason {
    type Err = FlipperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW_VOLUME" => Ok(RejectReason::LowVolume),
            "LOW_PROFIT" => Ok(RejectReason::LowProfit),
            "LOW_ROI" => Ok(RejectReason::LowRoi),
            "NEGATIVE_ROI" => Ok(RejectReason::NegativeRoi),
            "HIGH_RISK" => Ok(RejectReason::HighRisk),
            other => Err(FlipperError::InvalidData(format!("unknown reject reason: {}", other))),
        }
    }
}

/// Opportunity as delivered to API consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: i64,
    pub app_id: i64,
    pub item_name: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub net_profit: f64,
    pub profit_pct: f64,
    pub volume: i64,
    pub risk_level: RiskLevel,
    /// Detection time as text (RFC 3339)
    pub detected_at: String,
}

/// Full stored record of an evaluated flip, profitable or not
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub id: i64,
    pub app_id: i64,
    pub item_name: String,
    pub buy_price: f64,
    pub sell_price: f64,
    pub net_profit: f64,
    pub profit_pct: f64,
    pub volume: i64,
    pub spread_pct: f64,
    pub risk_level: RiskLevel,
    pub profitable: bool,
    pub reject_reason: Option<RejectReason>,
    pub detected_at: DateTime<Utc>,
}

/// Body of a watchlist submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistSubmission {
    pub url: String,
}

/// A market item the scanner should track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistItem {
    pub app_id: i64,
    pub item_name: String,
}

/// Stored watchlist row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub id: i64,
    pub app_id: i64,
    pub item_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<WatchlistEntry> for WatchlistItem {
    fn from(entry: WatchlistEntry) -> Self {
        Self {
            app_id: entry.app_id,
            item_name: entry.item_name,
        }
    }
}
