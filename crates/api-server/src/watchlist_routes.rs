//! Watchlist API Routes
//!
//! Items added here are picked up by the scanner on its next cycle.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::get,
    Json, Router,
};
use flipper_core::{parse_steam_market_url, WatchlistEntry, WatchlistSubmission};
use flipper_db::WatchlistStore;
use serde_json::{json, Value};

use crate::{AppError, AppState};

pub fn watchlist_routes() -> Router<AppState> {
    Router::new()
        .route("/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/watchlist/", get(get_watchlist).post(add_to_watchlist))
}

/// POST /watchlist with `{"url": "https://steamcommunity.com/market/listings/730/..."}`
async fn add_to_watchlist(
    State(state): State<AppState>,
    payload: Result<Json<WatchlistSubmission>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(submission) =
        payload.map_err(|rejection| AppError::rejected(rejection.status(), rejection.body_text()))?;
    let (app_id, item_name) = parse_steam_market_url(&submission.url)
        .map_err(|e| AppError::bad_request(e.to_string()))?;

    let store = WatchlistStore::new(state.db.clone());
    if store.add_item(app_id, &item_name).await? {
        tracing::info!("➕ Watchlist: {} (app {})", item_name, app_id);
    } else {
        tracing::debug!("Watchlist already has {} (app {})", item_name, app_id);
    }

    Ok(Json(json!({ "status": "ok" })))
}

/// GET /watchlist
async fn get_watchlist(
    State(state): State<AppState>,
) -> Result<Json<Vec<WatchlistEntry>>, AppError> {
    let store = WatchlistStore::new(state.db.clone());
    Ok(Json(store.list_entries().await?))
}
