//! Evaluated flip history.
//!
//! Every evaluation is stored, profitable or not, so the API can show the
//! best recent result per item.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flipper_core::{
    FlipConfig, FlipEvaluation, FlipOpportunity, OpportunityRecord, RejectReason, RiskLevel,
};
use sqlx::FromRow;

use crate::db::FlipperDb;

pub const MAX_LIST_LIMIT: i64 = 500;

#[derive(Debug, FromRow)]
struct OpportunityRow {
    id: i64,
    app_id: i64,
    item_name: String,
    buy_price: f64,
    sell_price: f64,
    net_profit: f64,
    profit_pct: f64,
    volume: i64,
    spread_pct: f64,
    risk_level: String,
    profitable: bool,
    reject_reason: Option<String>,
    detected_at: DateTime<Utc>,
}

impl TryFrom<OpportunityRow> for OpportunityRecord {
    type Error = anyhow::Error;

    fn try_from(row: OpportunityRow) -> Result<Self> {
        let reject_reason = row
            .reject_reason
            .as_deref()
            .map(str::parse::<RejectReason>)
            .transpose()
            .with_context(|| format!("opportunity {} has a bad reject_reason", row.id))?;

        Ok(Self {
            id: row.id,
            app_id: row.app_id,
            risk_level: row
                .risk_level
                .parse::<RiskLevel>()
                .with_context(|| format!("opportunity {} has a bad risk_level", row.id))?,
            item_name: row.item_name,
            buy_price: row.buy_price,
            sell_price: row.sell_price,
            net_profit: row.net_profit,
            profit_pct: row.profit_pct,
            volume: row.volume,
            spread_pct: row.spread_pct,
            profitable: row.profitable,
            reject_reason,
            detected_at: row.detected_at,
        })
    }
}

pub struct OpportunityStore {
    db: FlipperDb,
}

impl OpportunityStore {
    pub fn new(db: FlipperDb) -> Self {
        Self { db }
    }

    /// Persist an evaluated flip (viable or rejected)
    pub async fn save_opportunity(
        &self,
        app_id: i64,
        flip: &FlipOpportunity,
        evaluation: &FlipEvaluation,
        config: &FlipConfig,
    ) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO opportunities (
                app_id, item_name, buy_price, sell_price, net_profit, profit_pct,
                volume, spread_pct, risk_level, profitable, reject_reason, detected_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(app_id)
        .bind(&flip.name)
        .bind(flip.buy_price)
        .bind(flip.sell_price)
        .bind(flip.net_profit(config))
        .bind(flip.profit_pct(config))
        .bind(flip.volume)
        .bind(flip.spread_pct())
        .bind(flip.risk_level(config).as_str())
        .bind(evaluation.profitable)
        .bind(evaluation.reject_reason.map(|r| r.as_str()))
        .bind(Utc::now())
        .fetch_one(self.db.pool())
        .await?;

        Ok(id)
    }

    /// Best row per item (highest net profit, then most recent), ordered by ROI.
    ///
    /// The `profitable` filter applies to that best row, not to the history.
    pub async fn list_opportunities(
        &self,
        profitable: Option<bool>,
        limit: i64,
    ) -> Result<Vec<OpportunityRecord>> {
        let mut sql = String::from(
            r#"
            SELECT
                id, app_id, item_name, buy_price, sell_price, net_profit, profit_pct,
                volume, spread_pct, risk_level, profitable, reject_reason, detected_at
            FROM (
                SELECT
                    o.*,
                    ROW_NUMBER() OVER (
                        PARTITION BY o.item_name
                        ORDER BY o.net_profit DESC, o.detected_at DESC
                    ) AS rn
                FROM opportunities o
            )
            WHERE rn = 1
            "#,
        );

        if profitable.is_some() {
            sql.push_str(" AND profitable = ?");
        }
        sql.push_str(" ORDER BY profit_pct DESC LIMIT ?");

        let mut query = sqlx::query_as::<_, OpportunityRow>(&sql);
        if let Some(flag) = profitable {
            query = query.bind(flag);
        }
        let rows = query
            .bind(limit.clamp(0, MAX_LIST_LIMIT))
            .fetch_all(self.db.pool())
            .await?;

        rows.into_iter().map(OpportunityRecord::try_from).collect()
    }
}
