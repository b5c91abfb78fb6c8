//! Search endpoint over the derived index.

use crate::error::AppError;
use crate::state::SearchState;
use axum::Json;
use axum::extract::{Query, State};
use classhub_core::index::IndexDocument;
use serde::Deserialize;

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

/// Query parameters of `GET /search`.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Free-text query; empty matches every document.
    #[serde(default)]
    pub q: String,
    /// Page size, capped at 100.
    pub limit: Option<usize>,
    /// Number of documents to skip.
    pub offset: Option<usize>,
}

/// `GET /search?q=&limit=&offset=`: query the derived index.
///
/// The index is eventually consistent with the course store; results may
/// trail recent course mutations.
///
/// # Errors
///
/// Returns 503 when the index backend is unavailable.
pub async fn search_courses(
    State(state): State<SearchState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<IndexDocument>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let documents = state.index.search(&params.q, limit, offset).await?;
    Ok(Json(documents))
}
