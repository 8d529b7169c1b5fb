//! Opportunity API Routes

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    routing::get,
    Json, Router,
};
use flipper_core::OpportunityRecord;
use flipper_db::{OpportunityStore, MAX_LIST_LIMIT};
use serde::Deserialize;

use crate::{AppError, AppState};

const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct OpportunityQuery {
    pub profitable: Option<bool>,
    pub limit: Option<i64>,
}

pub fn opportunity_routes() -> Router<AppState> {
    Router::new()
        .route("/opportunities", get(list_opportunities))
        .route("/opportunities/", get(list_opportunities))
}

/// GET /opportunities?profitable=true&limit=50
///
/// Best evaluation per item, highest ROI first.
async fn list_opportunities(
    State(state): State<AppState>,
    query: Result<Query<OpportunityQuery>, QueryRejection>,
) -> Result<Json<Vec<OpportunityRecord>>, AppError> {
    let Query(params) =
        query.map_err(|rejection| AppError::rejected(rejection.status(), rejection.body_text()))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if !(1..=MAX_LIST_LIMIT).contains(&limit) {
        return Err(AppError::bad_request(format!(
            "limit must be between 1 and {}",
            MAX_LIST_LIMIT
        )));
    }

    let store = OpportunityStore::new(state.db.clone());
    let rows = store.list_opportunities(params.profitable, limit).await?;

    tracing::debug!(
        count = rows.len(),
        profitable = ?params.profitable,
        "listed opportunities"
    );

    Ok(Json(rows))
}
