//! CRUD operations for the `jobs` table.

use chrono::{Duration, Utc};
use jobhound_core::{JobCategory, JobId, JobPosting, SourceId, Timestamp};
use sqlx::{Pool, Row, Sqlite};

/// Insert a posting. Returns `true` when a new row was written, `false`
/// when a posting with the same canonical URL already existed.
pub async fn insert_job(pool: &Pool<Sqlite>, job: &JobPosting) -> Result<bool, sqlx::Error> {
    let skills_json = serde_json::to_string(&job.skills).unwrap_or_else(|_| "[]".to_string());

    let result = sqlx::query(
        "INSERT INTO jobs (id, source, title, company, location, url, description,
                           compensation, skills, category, posted_at, scraped_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(url) DO NOTHING",
    )
    .bind(job.id.as_str())
    .bind(job.source.as_str())
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.location)
    .bind(&job.url)
    .bind(&job.description)
    .bind(job.compensation.as_deref())
    .bind(&skills_json)
    .bind(category_to_str(job.category))
    .bind(job.posted_at.to_rfc3339())
    .bind(job.scraped_at.to_rfc3339())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Whether a posting with this canonical URL is already stored.
pub async fn exists_by_url(pool: &Pool<Sqlite>, url: &str) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs WHERE url = ?")
        .bind(url)
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}

/// All postings, newest first, optionally limited.
pub async fn get_all(
    pool: &Pool<Sqlite>,
    limit: Option<i64>,
) -> Result<Vec<JobPosting>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, source, title, company, location, url, description,
                compensation, skills, category, posted_at, scraped_at
         FROM jobs
         ORDER BY posted_at DESC
         LIMIT ?",
    )
    .bind(limit.unwrap_or(-1))
    .fetch_all(pool)
    .await?;

    parse_jobs_from_rows(rows)
}

/// Postings tagged with any of the given skills, newest first.
///
/// Skills are stored as a JSON array; matching is done against the
/// quoted lowercase token so `"go"` does not match `"golang"`.
pub async fn get_by_skills(
    pool: &Pool<Sqlite>,
    skills: &[String],
) -> Result<Vec<JobPosting>, sqlx::Error> {
    if skills.is_empty() {
        return Ok(Vec::new());
    }

    let clauses = vec!["skills LIKE ?"; skills.len()].join(" OR ");
    let sql = format!(
        "SELECT id, source, title, company, location, url, description,
                compensation, skills, category, posted_at, scraped_at
         FROM jobs
         WHERE {clauses}
         ORDER BY posted_at DESC"
    );

    let mut query = sqlx::query(&sql);
    for skill in skills {
        query = query.bind(format!("%\"{}\"%", skill.to_lowercase()));
    }

    parse_jobs_from_rows(query.fetch_all(pool).await?)
}

/// Distinct skills across all postings with how many postings carry
/// each, most common first.
pub async fn get_skill_counts(pool: &Pool<Sqlite>) -> Result<Vec<(String, i64)>, sqlx::Error> {
    let rows: Vec<String> = sqlx::query_scalar("SELECT skills FROM jobs")
        .fetch_all(pool)
        .await?;

    let mut counts: std::collections::HashMap<String, i64> = std::collections::HashMap::new();
    for skills_json in rows {
        let skills: Vec<String> = serde_json::from_str(&skills_json).unwrap_or_default();
        for skill in skills {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    let mut counts: Vec<(String, i64)> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Ok(counts)
}

/// Aggregate counts over stored postings.
#[derive(Debug, Clone, serde::Serialize)]
pub struct JobStats {
    /// Total stored postings
    pub total: i64,
    /// Postings per source, descending
    pub by_source: Vec<(String, i64)>,
    /// Postings per category, descending
    pub by_category: Vec<(String, i64)>,
}

/// Compute posting counts overall, per source, and per category.
pub async fn get_stats(pool: &Pool<Sqlite>) -> Result<JobStats, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
        .fetch_one(pool)
        .await?;

    let by_source = sqlx::query_as::<_, (String, i64)>(
        "SELECT source, COUNT(*) FROM jobs GROUP BY source ORDER BY COUNT(*) DESC, source",
    )
    .fetch_all(pool)
    .await?;

    let by_category = sqlx::query_as::<_, (String, i64)>(
        "SELECT category, COUNT(*) FROM jobs GROUP BY category ORDER BY COUNT(*) DESC, category",
    )
    .fetch_all(pool)
    .await?;

    Ok(JobStats {
        total,
        by_source,
        by_category,
    })
}

/// Delete postings older than the given number of days, by posted date.
/// Returns how many rows were removed.
pub async fn purge_older_than(pool: &Pool<Sqlite>, days: u32) -> Result<u64, sqlx::Error> {
    let cutoff = (Utc::now() - Duration::days(i64::from(days))).to_rfc3339();
    let result = sqlx::query("DELETE FROM jobs WHERE posted_at < ?")
        .bind(&cutoff)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Helper to parse postings from database rows.
fn parse_jobs_from_rows(
    rows: Vec<sqlx::sqlite::SqliteRow>,
) -> Result<Vec<JobPosting>, sqlx::Error> {
    let mut jobs = Vec::new();

    for row in rows {
        let source_str: String = row.try_get("source")?;
        let source = SourceId::new(source_str).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        let skills_json: String = row.try_get("skills")?;
        let skills: Vec<String> = serde_json::from_str(&skills_json).unwrap_or_default();

        let category_str: String = row.try_get("category")?;
        let posted_at_str: String = row.try_get("posted_at")?;
        let scraped_at_str: String = row.try_get("scraped_at")?;

        jobs.push(JobPosting {
            id: JobId::from_string(row.try_get("id")?),
            source,
            title: row.try_get("title")?,
            company: row.try_get("company")?,
            location: row.try_get("location")?,
            url: row.try_get("url")?,
            description: row.try_get("description")?,
            compensation: row.try_get("compensation")?,
            skills,
            category: category_from_str(&category_str),
            posted_at: Timestamp::from_rfc3339(&posted_at_str)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
            scraped_at: Timestamp::from_rfc3339(&scraped_at_str)
                .map_err(|e| sqlx::Error::Decode(Box::new(e)))?,
        });
    }

    Ok(jobs)
}

fn category_to_str(category: JobCategory) -> String {
    serde_json::to_string(&category)
        .map(|s| s.trim_matches('"').to_string())
        .unwrap_or_else(|_| "other".to_string())
}

fn category_from_str(s: &str) -> JobCategory {
    serde_json::from_str(&format!("\"{s}\"")).unwrap_or(JobCategory::Other)
}
