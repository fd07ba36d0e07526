//! HTTP entry point
//!
//! `POST /crawl?url=<url>` runs the whole pipeline for one URL before answering.
//! Skipped URLs answer like crawled ones; only failures get an error status. Each
//! crawl runs on its own task and completes even if the caller disconnects.

use crate::crawler::{CrawlOrchestrator, CrawlOutcome};
use crate::CrawlError;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;
use tokio::net::TcpListener;

/// State shared with the handlers
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<CrawlOrchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct CrawlParams {
    pub url: String,
}

/// Builds the axum router
pub fn router(orchestrator: Arc<CrawlOrchestrator>) -> Router {
    Router::new()
        .route("/crawl", post(handle_crawl))
        .route("/health", get(health))
        .with_state(AppState { orchestrator })
}

/// Serves `app` until ctrl-c, then lets in-flight crawls finish
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested, draining in-flight requests");
}

async fn handle_crawl(
    State(state): State<AppState>,
    Query(params): Query<CrawlParams>,
) -> StatusCode {
    // Detached from the request so a client hanging up cannot stop a crawl halfway
    let orchestrator = state.orchestrator.clone();
    let url = params.url.clone();
    let task = tokio::spawn(async move { orchestrator.crawl(&url).await });

    let result = match task.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("{} | Crawl task panicked: {}", params.url, e);
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    match result {
        Ok(outcome) => {
            if !matches!(outcome, CrawlOutcome::Crawled { .. }) {
                tracing::debug!("{} | Not crawled: {:?}", params.url, outcome);
            }
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            tracing::error!("{} | Crawl failed: {}", params.url, e);
            status_for(&e)
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Maps a pipeline failure to the status reported to the caller
pub fn status_for(error: &CrawlError) -> StatusCode {
    match error {
        CrawlError::Fetch(_) | CrawlError::Publish(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
