//! Application state and router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use jobhound_db::Database;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::crawl::CrawlService;
use crate::routes;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database handle
    pub db: Arc<Database>,
    /// Crawl execution service
    pub crawl: Arc<CrawlService>,
}

/// Build the Axum application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/jobs", get(routes::jobs::list_jobs))
        .route("/api/jobs/skills/:skills", get(routes::jobs::jobs_by_skills))
        .route("/api/skills", get(routes::jobs::list_skills))
        .route("/api/stats", get(routes::jobs::stats))
        .route("/api/crawl", post(routes::crawl::trigger_crawl))
        .route("/api/runs", get(routes::crawl::recent_runs))
        .route("/health", get(routes::health::health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
