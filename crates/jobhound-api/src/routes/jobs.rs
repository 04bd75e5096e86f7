//! Job query endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use jobhound_core::JobPosting;
use jobhound_db::{jobs, JobStats};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::app::AppState;

/// Query parameters for job listings.
#[derive(Debug, Default, Deserialize)]
pub struct JobsQuery {
    /// Maximum number of postings to return
    pub limit: Option<i64>,
}

/// Response body for job listings.
#[derive(Serialize)]
pub struct JobsResponse {
    success: bool,
    count: usize,
    jobs: Vec<JobPosting>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl JobsResponse {
    fn ok(jobs: Vec<JobPosting>) -> (StatusCode, Json<Self>) {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                count: jobs.len(),
                jobs,
                error: None,
            }),
        )
    }

    fn err(e: &sqlx::Error) -> (StatusCode, Json<Self>) {
        error!("Job query failed: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(Self {
                success: false,
                count: 0,
                jobs: Vec::new(),
                error: Some(e.to_string()),
            }),
        )
    }
}

/// `GET /api/jobs` — stored postings, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<JobsQuery>,
) -> (StatusCode, Json<JobsResponse>) {
    match jobs::get_all(state.db.pool(), params.limit).await {
        Ok(jobs) => JobsResponse::ok(jobs),
        Err(e) => JobsResponse::err(&e),
    }
}

/// `GET /api/jobs/skills/{skills}` — postings matching any of the
/// comma-separated skills.
pub async fn jobs_by_skills(
    State(state): State<AppState>,
    Path(skills): Path<String>,
) -> (StatusCode, Json<JobsResponse>) {
    let skills: Vec<String> = skills
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    match jobs::get_by_skills(state.db.pool(), &skills).await {
        Ok(jobs) => JobsResponse::ok(jobs),
        Err(e) => JobsResponse::err(&e),
    }
}

/// One skill with how many postings carry it.
#[derive(Serialize)]
pub struct SkillCount {
    skill: String,
    count: i64,
}

/// Response body for the skill index.
#[derive(Serialize)]
pub struct SkillsResponse {
    success: bool,
    skills: Vec<SkillCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `GET /api/skills` — all skills seen across postings, most common
/// first.
pub async fn list_skills(State(state): State<AppState>) -> (StatusCode, Json<SkillsResponse>) {
    match jobs::get_skill_counts(state.db.pool()).await {
        Ok(counts) => (
            StatusCode::OK,
            Json(SkillsResponse {
                success: true,
                skills: counts
                    .into_iter()
                    .map(|(skill, count)| SkillCount { skill, count })
                    .collect(),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Skill query failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SkillsResponse {
                    success: false,
                    skills: Vec::new(),
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}

/// Response body for aggregate stats.
#[derive(Serialize)]
pub struct StatsResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<JobStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// `GET /api/stats` — posting counts overall, per source, and per
/// category.
pub async fn stats(State(state): State<AppState>) -> (StatusCode, Json<StatsResponse>) {
    match jobs::get_stats(state.db.pool()).await {
        Ok(stats) => (
            StatusCode::OK,
            Json(StatsResponse {
                success: true,
                stats: Some(stats),
                error: None,
            }),
        ),
        Err(e) => {
            error!("Stats query failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(StatsResponse {
                    success: false,
                    stats: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
