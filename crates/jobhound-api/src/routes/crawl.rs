//! Crawl trigger and run-history endpoints.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use jobhound_db::{crawl_runs, CrawlRunRecord};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::AppState;

/// Response body for crawl triggers.
#[derive(Serialize)]
pub struct CrawlTriggerResponse {
    success: bool,
    message: String,
}

/// `POST /api/crawl` — start a crawl run in the background.
///
/// Returns 202 when a run was started, 409 when one is already in
/// progress.
pub async fn trigger_crawl(State(state): State<AppState>) -> (StatusCode, Json<CrawlTriggerResponse>) {
    // run_once also refuses to overlap; this up-front check gives the
    // caller an accurate status code.
    if state.crawl.is_running() {
        return (
            StatusCode::CONFLICT,
            Json(CrawlTriggerResponse {
                success: false,
                message: "a crawl run is already in progress".to_string(),
            }),
        );
    }

    let service = Arc::clone(&state.crawl);
    tokio::spawn(async move {
        service.run_once().await;
    });

    (
        StatusCode::ACCEPTED,
        Json(CrawlTriggerResponse {
            success: true,
            message: "crawl run started".to_string(),
        }),
    )
}

/// Query parameters for run history.
#[derive(Debug, Default, Deserialize)]
pub struct RunsQuery {
    /// Maximum number of runs to return
    pub limit: Option<i64>,
}

/// Response body for run history.
#[derive(Serialize)]
pub struct RunsResponse {
    success: bool,
    count: usize,
    runs: Vec<CrawlRunRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `GET /api/runs` — recent crawl runs, newest first.
pub async fn recent_runs(
    State(state): State<AppState>,
    Query(params): Query<RunsQuery>,
) -> (StatusCode, Json<RunsResponse>) {
    match crawl_runs::get_recent_runs(state.db.pool(), params.limit.unwrap_or(20)).await {
        Ok(runs) => (
            StatusCode::OK,
            Json(RunsResponse {
                success: true,
                count: runs.len(),
                runs,
                error: None,
            }),
        ),
        Err(e) => {
            error!("Run history query failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(RunsResponse {
                    success: false,
                    count: 0,
                    runs: Vec::new(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
