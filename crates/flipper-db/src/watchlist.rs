use anyhow::Result;
use chrono::{DateTime, Utc};
use flipper_core::{WatchlistEntry, WatchlistItem};
use sqlx::FromRow;

use crate::db::FlipperDb;

#[derive(Debug, FromRow)]
struct WatchlistRow {
    id: i64,
    app_id: i64,
    item_name: String,
    created_at: DateTime<Utc>,
}

impl From<WatchlistRow> for WatchlistEntry {
    fn from(row: WatchlistRow) -> Self {
        Self {
            id: row.id,
            app_id: row.app_id,
            item_name: row.item_name,
            created_at: row.created_at,
        }
    }
}

/// Items the scanner tracks, keyed by (app_id, item_name)
pub struct WatchlistStore {
    db: FlipperDb,
}

impl WatchlistStore {
    pub fn new(db: FlipperDb) -> Self {
        Self { db }
    }

    /// Add an item; returns `false` if it was already tracked.
    pub async fn add_item(&self, app_id: i64, item_name: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO watchlist (app_id, item_name, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(app_id)
        .bind(item_name)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All tracked items, oldest first
    pub async fn list_entries(&self) -> Result<Vec<WatchlistEntry>> {
        let rows = sqlx::query_as::<_, WatchlistRow>(
            r#"
            SELECT id, app_id, item_name, created_at
            FROM watchlist
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(WatchlistEntry::from).collect())
    }

    pub async fn fetch_watchlist(&self) -> Result<Vec<WatchlistItem>> {
        Ok(self
            .list_entries()
            .await?
            .into_iter()
            .map(WatchlistItem::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_store() -> WatchlistStore {
        WatchlistStore::new(FlipperDb::new("sqlite::memory:").await.unwrap())
    }

    #[tokio::test]
    async fn test_add_and_fetch_in_order() {
        let store = setup_store().await;
        assert!(store.add_item(730, "Fracture Case").await.unwrap());
        assert!(store.add_item(730, "AK-47 | Redline (Field-Tested)").await.unwrap());

        let items = store.fetch_watchlist().await.unwrap();
        assert_eq!(
            items,
            vec![
                WatchlistItem { app_id: 730, item_name: "Fracture Case".to_string() },
                WatchlistItem {
                    app_id: 730,
                    item_name: "AK-47 | Redline (Field-Tested)".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicates_are_ignored() {
        let store = setup_store().await;
        assert!(store.add_item(730, "Fracture Case").await.unwrap());
        assert!(!store.add_item(730, "Fracture Case").await.unwrap());
        // Same name under another app is a different item
        assert!(store.add_item(440, "Fracture Case").await.unwrap());

        let entries = store.list_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].id < entries[1].id);
    }

    #[tokio::test]
    async fn test_empty_watchlist() {
        let store = setup_store().await;
        assert!(store.fetch_watchlist().await.unwrap().is_empty());
    }
}
