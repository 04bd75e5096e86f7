//! Crawl run history: one row per aggregation run, plus per-source
//! outcome rows.

use jobhound_crawler::RunSummary;
use serde::Serialize;
use sqlx::{Pool, Row, Sqlite};

/// Stored summary of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlRunRecord {
    /// Run identifier
    pub id: String,
    /// When the run started (RFC 3339)
    pub started_at: String,
    /// When the run finished (RFC 3339)
    pub finished_at: String,
    /// New postings saved across all sources
    pub total_saved: i64,
    /// Duplicates recognized across all sources
    pub total_duplicates: i64,
    /// Outright failures across all sources
    pub total_failed: i64,
}

/// Stored per-source outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceCrawlRecord {
    /// Source identifier
    pub source_id: String,
    /// Human-readable source name
    pub source_name: String,
    /// Term/location pairs attempted
    pub searches: i64,
    /// Unique locators discovered
    pub discovered: i64,
    /// New postings saved
    pub saved: i64,
    /// Duplicates recognized
    pub duplicates: i64,
    /// Detail pages without a usable posting
    pub rejected: i64,
    /// Postings outside the freshness window
    pub stale: i64,
    /// Outright failures
    pub failed: i64,
    /// Abort reason when the circuit breaker tripped
    pub aborted: Option<String>,
}

/// Persist a run summary and its per-source outcomes.
#[allow(clippy::cast_possible_wrap)]
pub async fn record_run(pool: &Pool<Sqlite>, summary: &RunSummary) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO crawl_runs (id, started_at, finished_at,
                                 total_saved, total_duplicates, total_failed)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&summary.run_id)
    .bind(summary.started_at.to_rfc3339())
    .bind(summary.finished_at.to_rfc3339())
    .bind(summary.total_saved() as i64)
    .bind(summary.total_duplicates() as i64)
    .bind(summary.total_failed() as i64)
    .execute(pool)
    .await?;

    for outcome in &summary.sources {
        sqlx::query(
            "INSERT INTO source_crawls (id, run_id, source_id, source_name, searches,
                                        discovered, saved, duplicates, rejected, stale,
                                        failed, aborted)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&summary.run_id)
        .bind(outcome.source_id.as_str())
        .bind(&outcome.source_name)
        .bind(outcome.searches as i64)
        .bind(outcome.discovered as i64)
        .bind(outcome.saved as i64)
        .bind(outcome.duplicates as i64)
        .bind(outcome.rejected as i64)
        .bind(outcome.stale as i64)
        .bind(outcome.failed as i64)
        .bind(outcome.aborted.as_deref())
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Most recent runs, newest first.
pub async fn get_recent_runs(
    pool: &Pool<Sqlite>,
    limit: i64,
) -> Result<Vec<CrawlRunRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, started_at, finished_at, total_saved, total_duplicates, total_failed
         FROM crawl_runs
         ORDER BY started_at DESC
         LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(CrawlRunRecord {
                id: row.try_get("id")?,
                started_at: row.try_get("started_at")?,
                finished_at: row.try_get("finished_at")?,
                total_saved: row.try_get("total_saved")?,
                total_duplicates: row.try_get("total_duplicates")?,
                total_failed: row.try_get("total_failed")?,
            })
        })
        .collect()
}

/// Per-source outcomes of one run, in insertion order.
pub async fn get_run_sources(
    pool: &Pool<Sqlite>,
    run_id: &str,
) -> Result<Vec<SourceCrawlRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT source_id, source_name, searches, discovered, saved, duplicates,
                rejected, stale, failed, aborted
         FROM source_crawls
         WHERE run_id = ?
         ORDER BY rowid",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(SourceCrawlRecord {
                source_id: row.try_get("source_id")?,
                source_name: row.try_get("source_name")?,
                searches: row.try_get("searches")?,
                discovered: row.try_get("discovered")?,
                saved: row.try_get("saved")?,
                duplicates: row.try_get("duplicates")?,
                rejected: row.try_get("rejected")?,
                stale: row.try_get("stale")?,
                failed: row.try_get("failed")?,
                aborted: row.try_get("aborted")?,
            })
        })
        .collect()
}

/// Start timestamp of the most recent run (RFC 3339), if any run has
/// been recorded. The scheduler uses this to decide whether a run is
/// due.
pub async fn last_run_started_at(pool: &Pool<Sqlite>) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT MAX(started_at) FROM crawl_runs")
        .fetch_one(pool)
        .await
}
