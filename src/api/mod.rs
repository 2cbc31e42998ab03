//! HTTP surface
//!
//! Routes under `/api`:
//! - `GET /startIndexing`, `GET /stopIndexing`
//! - `POST /indexPage` with the page url as the raw body
//! - `GET /search?query&site&offset&limit`
//! - `GET /statistics`

mod handlers;
mod response;

pub use handlers::{AppState, SearchParams, StatisticsPayload};
pub use response::{reply, Acknowledged, ApiResponse, ErrorStatus};

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Builds the application router
pub fn build_app(state: AppState) -> Router {
    let api = Router::new()
        .route("/startIndexing", get(handlers::start_indexing))
        .route("/stopIndexing", get(handlers::stop_indexing))
        .route("/indexPage", post(handlers::index_page))
        .route("/search", get(handlers::search))
        .route("/statistics", get(handlers::statistics));

    Router::new()
        .nest("/api", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serves the application until the process receives Ctrl-C
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let controller = state.controller.clone();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;

    if controller.stop_indexing().is_ok() {
        info!("Waiting for the active crawl to unwind");
    }
    controller.wait_until_idle().await;
    Ok(())
}
