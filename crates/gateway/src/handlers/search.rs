//! Content search handler

use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use studyforge_common::errors::{AppError, Result};
use studyforge_common::models::ChunkMetadata;
use studyforge_common::store::{ChunkSource, QueryFilters};
use studyforge_generation::filter_trusted;

fn default_n_results() -> usize {
    10
}

/// Search query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,

    pub class_num: Option<i32>,
    pub subject: Option<String>,
    pub topic: Option<String>,

    #[serde(default = "default_n_results")]
    pub n_results: usize,

    /// Untrusted rows (seed data, missing provenance) are excluded by
    /// default; set true to inspect them
    #[serde(default)]
    pub include_untrusted: bool,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub results: Vec<SearchResultItem>,
    pub count: usize,
}

#[derive(Serialize)]
pub struct SearchResultItem {
    pub id: String,
    pub content: String,
    pub metadata: ChunkMetadata,
    pub distance: f64,
}

/// Search for content in the store
pub async fn search_content(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>> {
    if params.query.trim().is_empty() {
        return Err(AppError::Validation {
            message: "query must not be empty".to_string(),
            field: Some("query".to_string()),
        });
    }

    let filters = QueryFilters {
        class_num: params.class_num,
        subject: params.subject.clone(),
        topic: params.topic.clone(),
        ..Default::default()
    };

    let limit = params.n_results.clamp(1, 100);
    let results = state.store.query(&params.query, &filters, limit).await?;

    let results = if params.include_untrusted {
        results
    } else {
        filter_trusted(results)
    };

    tracing::info!(
        query = %params.query,
        results = results.len(),
        include_untrusted = params.include_untrusted,
        "Search completed"
    );

    let items: Vec<SearchResultItem> = results
        .into_iter()
        .map(|r| SearchResultItem {
            id: r.id,
            content: r.content,
            metadata: r.metadata,
            distance: r.distance,
        })
        .collect();

    Ok(Json(SearchResponse {
        success: true,
        query: params.query,
        count: items.len(),
        results: items,
    }))
}
