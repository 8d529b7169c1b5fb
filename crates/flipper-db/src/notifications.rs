use anyhow::Result;
use chrono::{DateTime, Duration, Utc};

use crate::db::FlipperDb;

/// Remembers when each item was last announced so alerts can be rate-limited.
pub struct NotificationLedger {
    db: FlipperDb,
    cooldown: Duration,
}

impl NotificationLedger {
    pub fn new(db: FlipperDb, cooldown: Duration) -> Self {
        Self { db, cooldown }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// True if `item_name` was notified within the cooldown window.
    pub async fn already_notified(&self, item_name: &str) -> Result<bool> {
        self.already_notified_at(item_name, Utc::now()).await
    }

    async fn already_notified_at(&self, item_name: &str, now: DateTime<Utc>) -> Result<bool> {
        let row: Option<(DateTime<Utc>,)> = sqlx::query_as(
            "SELECT last_notified_at FROM notifications WHERE item_name = ?",
        )
        .bind(item_name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(match row {
            Some((last_notified_at,)) => now - last_notified_at < self.cooldown,
            None => false,
        })
    }

    pub async fn mark_notified(&self, item_name: &str) -> Result<()> {
        self.mark_notified_at(item_name, Utc::now()).await
    }

    async fn mark_notified_at(&self, item_name: &str, at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (item_name, last_notified_at)
            VALUES (?, ?)
            ON CONFLICT(item_name) DO UPDATE SET
                last_notified_at = excluded.last_notified_at
            "#,
        )
        .bind(item_name)
        .bind(at)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
