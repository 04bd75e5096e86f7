//! Handler-level tests over an in-memory database.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use jobhound_api::routes::crawl::trigger_crawl;
use jobhound_api::routes::health::health_handler;
use jobhound_api::routes::jobs::{jobs_by_skills, list_jobs, list_skills, stats, JobsQuery};
use jobhound_api::{AppState, CrawlService};
use jobhound_core::{
    AppConfig, JobCategory, JobId, JobPosting, SourceId, Timestamp,
};
use jobhound_db::{jobs, Database};
use jobhound_session::SessionManager;
use jobhound_sources::SourceRegistry;

async fn test_state() -> AppState {
    let config = AppConfig::default();
    let db = Arc::new(Database::open(":memory:").await.expect("open database"));
    db.run_migrations().await.expect("run migrations");

    let sessions = Arc::new(
        SessionManager::new(config.session.clone(), &config.cache)
            .expect("build session manager"),
    );
    let registry = Arc::new(SourceRegistry::new());
    let crawl = Arc::new(CrawlService::new(
        config,
        sessions,
        registry,
        Arc::clone(&db),
    ));

    AppState { db, crawl }
}

fn posting(url: &str, title: &str, skills: &[&str]) -> JobPosting {
    let source = SourceId::new("test-board").expect("valid source ID");
    JobPosting {
        id: JobId::derive(&source, url, title),
        source,
        category: JobCategory::classify(title),
        title: title.to_string(),
        company: "Acme".to_string(),
        location: "Remote".to_string(),
        url: url.to_string(),
        description: "desc".to_string(),
        compensation: None,
        skills: skills.iter().map(|s| (*s).to_string()).collect(),
        posted_at: Timestamp::now(),
        scraped_at: Timestamp::now(),
    }
}

#[tokio::test]
async fn test_list_jobs_empty() {
    let state = test_state().await;
    let (status, body) = list_jobs(State(state), Query(JobsQuery::default())).await;

    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_list_jobs_returns_stored_postings() {
    let state = test_state().await;
    jobs::insert_job(state.db.pool(), &posting("https://x.com/1", "Rust Engineer", &["rust"]))
        .await
        .expect("insert");

    let (status, body) = list_jobs(State(state), Query(JobsQuery::default())).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["title"], "Rust Engineer");
}

#[tokio::test]
async fn test_jobs_by_skills_filters() {
    let state = test_state().await;
    jobs::insert_job(state.db.pool(), &posting("https://x.com/1", "Rust Engineer", &["rust"]))
        .await
        .expect("insert");
    jobs::insert_job(state.db.pool(), &posting("https://x.com/2", "Go Engineer", &["golang"]))
        .await
        .expect("insert");

    let (status, body) =
        jobs_by_skills(State(state), Path("rust, terraform".to_string())).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["count"], 1);
    assert_eq!(body["jobs"][0]["title"], "Rust Engineer");
}

#[tokio::test]
async fn test_list_skills_counts() {
    let state = test_state().await;
    jobs::insert_job(state.db.pool(), &posting("https://x.com/1", "A", &["rust", "aws"]))
        .await
        .expect("insert");
    jobs::insert_job(state.db.pool(), &posting("https://x.com/2", "B", &["rust"]))
        .await
        .expect("insert");

    let (status, body) = list_skills(State(state)).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["skills"][0]["skill"], "rust");
    assert_eq!(body["skills"][0]["count"], 2);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let state = test_state().await;
    jobs::insert_job(
        state.db.pool(),
        &posting("https://x.com/1", "DevOps Engineer", &[]),
    )
    .await
    .expect("insert");

    let (status, body) = stats(State(state)).await;
    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["stats"]["total"], 1);
    assert_eq!(body["stats"]["by_source"][0][0], "test-board");
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let state = test_state().await;
    let (status, body) = health_handler(State(state)).await;

    assert_eq!(status, StatusCode::OK);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"]["status"], "ok");
}

#[tokio::test]
async fn test_trigger_crawl_accepted_with_empty_registry() {
    let state = test_state().await;
    let (status, body) = trigger_crawl(State(state)).await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let body = serde_json::to_value(&body.0).expect("serialize body");
    assert_eq!(body["success"], true);
}
