//! Store statistics handler

use crate::AppState;
use axum::{extract::State, Json};
use studyforge_common::errors::Result;
use studyforge_common::store::StoreStats;

/// Content store statistics. Grouped counts are computed over a bounded
/// sample; see `StoreStats::sampled` for how many rows backed them.
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StoreStats>> {
    let stats = state.store.stats().await?;

    tracing::info!(
        total_chunks = stats.total_chunks,
        sampled = stats.sampled,
        "Stats requested"
    );

    Ok(Json(stats))
}
