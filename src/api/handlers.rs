//! Endpoint handlers

use crate::api::response::{reply, Acknowledged, ApiResponse};
use crate::config::Config;
use crate::crawler::IndexingController;
use crate::output::{load_statistics, Statistics};
use crate::search::{SearchEngine, SearchResponse};
use crate::storage::SharedStorage;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: SharedStorage,
    pub controller: Arc<IndexingController>,
    pub search: Arc<SearchEngine>,
}

/// Query parameters of `GET /api/search`
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    pub site: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct StatisticsPayload {
    pub statistics: Statistics,
}

pub async fn start_indexing(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Acknowledged>>) {
    reply(state.controller.start_indexing().await.map(|_| Acknowledged {}))
}

pub async fn stop_indexing(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Acknowledged>>) {
    reply(state.controller.stop_indexing().map(|_| Acknowledged {}))
}

pub async fn index_page(
    State(state): State<AppState>,
    body: String,
) -> (StatusCode, Json<ApiResponse<Acknowledged>>) {
    let result = state.controller.index_page(&body).await.map(|page| {
        info!(
            "Indexed {}{} (HTTP {}, {} postings)",
            page.site_url, page.path, page.status_code, page.postings
        );
        Acknowledged {}
    });
    reply(result)
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse<SearchResponse>>) {
    let result = state
        .search
        .search(
            &params.query,
            params.site.as_deref(),
            params.offset,
            params.limit,
        )
        .await;
    reply(result)
}

pub async fn statistics(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<StatisticsPayload>>) {
    let indexing = state.controller.is_indexing();
    let result = {
        let storage = state.storage.lock();
        load_statistics(&state.config, &*storage, indexing)
    };
    reply(result.map(|statistics| StatisticsPayload { statistics }))
}
