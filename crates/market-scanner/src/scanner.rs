use std::time::Duration;

use anyhow::Result;
use flipper_core::{FlipConfig, FlipOpportunity, WatchlistItem};
use flipper_db::{FlipperDb, NotificationLedger, OpportunityStore, WatchlistStore};
use notification_service::{Alert, AlertType, NotificationService};
use steam_market::{build_opportunity, SteamMarketClient};

use crate::config::ScannerConfig;

/// Counters for one pass over the watchlist.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummary {
    pub items: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub profitable: usize,
    pub notified: usize,
}

pub struct MarketScanner {
    steam: SteamMarketClient,
    watchlist: WatchlistStore,
    opportunities: OpportunityStore,
    ledger: NotificationLedger,
    notifier: NotificationService,
    flip_config: FlipConfig,
    item_pause: Duration,
}

impl MarketScanner {
    pub fn new(
        config: &ScannerConfig,
        db: FlipperDb,
        steam: SteamMarketClient,
        notifier: NotificationService,
    ) -> Self {
        Self {
            steam,
            watchlist: WatchlistStore::new(db.clone()),
            opportunities: OpportunityStore::new(db.clone()),
            ledger: NotificationLedger::new(db, config.notify_cooldown()),
            notifier,
            flip_config: config.flip.clone(),
            item_pause: config.item_pause(),
        }
    }

    pub fn notifier(&self) -> &NotificationService {
        &self.notifier
    }

    pub async fn watchlist_size(&self) -> Result<usize> {
        Ok(self.watchlist.fetch_watchlist().await?.len())
    }

    /// Scan every watchlist item once.
    ///
    /// Steam failures skip the item; storage failures abort the cycle.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let items = self.watchlist.fetch_watchlist().await?;
        let mut summary = CycleSummary {
            items: items.len(),
            ..CycleSummary::default()
        };

        if items.is_empty() {
            tracing::warn!("Watchlist is empty, add items via POST /watchlist");
            return Ok(summary);
        }

        tracing::info!("🔍 Scanning {} watchlist items", items.len());

        for item in &items {
            let Some(flip) = self.price_item(item).await else {
                summary.skipped += 1;
                continue;
            };

            let evaluation = flip.evaluate(&self.flip_config);
            self.opportunities
                .save_opportunity(item.app_id, &flip, &evaluation, &self.flip_config)
                .await?;
            summary.evaluated += 1;

            let line = flip.log_line(&evaluation, &self.flip_config);
            if evaluation.profitable {
                tracing::info!("{}", line);
            } else {
                tracing::debug!("{}", line);
            }

            if evaluation.should_notify() {
                summary.profitable += 1;
                if self.notify(item.app_id, &flip).await? {
                    summary.notified += 1;
                }
            }
        }

        tracing::info!(
            "✅ Cycle done: {} evaluated, {} skipped, {} profitable, {} notified",
            summary.evaluated,
            summary.skipped,
            summary.profitable,
            summary.notified
        );

        Ok(summary)
    }

    async fn price_item(&self, item: &WatchlistItem) -> Option<FlipOpportunity> {
        let result = self.steam.fetch(item.app_id, &item.item_name).await;
        tokio::time::sleep(self.item_pause).await;

        let data = match result {
            Ok(data) => data,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", item.item_name, e);
                return None;
            }
        };

        let flip = build_opportunity(&item.item_name, &data);
        if flip.is_none() {
            tracing::debug!("Skipping {}: incomplete price data", item.item_name);
        }
        flip
    }

    /// Send a flip alert unless the item is still cooling down.
    ///
    /// The cooldown only starts once some channel actually delivered.
    async fn notify(&self, app_id: i64, flip: &FlipOpportunity) -> Result<bool> {
        if !self.notifier.is_enabled() {
            return Ok(false);
        }

        if self.ledger.already_notified(&flip.name).await? {
            tracing::debug!(
                "🔕 {} notified within the last {} min, skipping",
                flip.name,
                self.ledger.cooldown().num_minutes()
            );
            return Ok(false);
        }

        let alert = Alert::new(
            AlertType::FlipFound {
                app_id,
                item_name: flip.name.clone(),
                buy_price: flip.buy_price,
                sell_price: flip.sell_price,
                net_profit: flip.net_profit(&self.flip_config),
                profit_pct: flip.profit_pct(&self.flip_config),
                volume: flip.volume,
                risk_level: flip.risk_level(&self.flip_config),
            },
            "Flip found",
            flip.log_line(&flip.evaluate(&self.flip_config), &self.flip_config),
        );

        if !self.notifier.send_alert_async(&alert).await {
            return Ok(false);
        }

        self.ledger.mark_notified(&flip.name).await?;
        Ok(true)
    }
}
