//! Storage seam between the crawl pipeline and persistence.

use jobhound_core::JobPosting;
use thiserror::Error;

/// Error raised by a job store backend.
#[derive(Debug, Error)]
#[error("job store error: {0}")]
pub struct StoreError(pub String);

/// Result of saving one posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The posting was new and has been persisted
    Inserted,
    /// A posting with the same canonical URL already existed
    Duplicate,
}

/// Persistence backend for crawled postings.
///
/// The crawl pipeline only needs existence checks by canonical URL and
/// idempotent saves; everything else (queries, stats) lives behind the
/// database crate's own API.
#[async_trait::async_trait]
pub trait JobStore: Send + Sync {
    /// Whether a posting with this canonical URL is already stored.
    async fn exists_by_url(&self, url: &str) -> std::result::Result<bool, StoreError>;

    /// Persist a posting. Saving an already-stored URL reports
    /// [`SaveOutcome::Duplicate`] instead of failing.
    async fn save(&self, job: &JobPosting) -> std::result::Result<SaveOutcome, StoreError>;
}

/// In-memory store, used by tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    jobs: std::sync::Mutex<Vec<JobPosting>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything saved so far.
    pub fn jobs(&self) -> Vec<JobPosting> {
        self.jobs.lock().expect("acquire jobs lock").clone()
    }
}

#[async_trait::async_trait]
impl JobStore for MemoryStore {
    async fn exists_by_url(&self, url: &str) -> std::result::Result<bool, StoreError> {
        let jobs = self.jobs.lock().expect("acquire jobs lock");
        Ok(jobs.iter().any(|j| j.url == url))
    }

    async fn save(&self, job: &JobPosting) -> std::result::Result<SaveOutcome, StoreError> {
        let mut jobs = self.jobs.lock().expect("acquire jobs lock");
        if jobs.iter().any(|j| j.url == job.url) {
            return Ok(SaveOutcome::Duplicate);
        }
        jobs.push(job.clone());
        Ok(SaveOutcome::Inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobhound_core::{JobCategory, JobId, SourceId, Timestamp};

    fn posting(url: &str) -> JobPosting {
        let source = SourceId::new("test-source").expect("valid source ID");
        JobPosting {
            id: JobId::derive(&source, url, "Rust Engineer"),
            source,
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
            url: url.to_string(),
            description: "Build things".to_string(),
            compensation: None,
            skills: vec!["rust".to_string()],
            category: JobCategory::Engineering,
            posted_at: Timestamp::now(),
            scraped_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn test_memory_store_save_and_exists() {
        let store = MemoryStore::new();
        let job = posting("https://example.com/jobs/1");

        assert!(!store.exists_by_url(&job.url).await.expect("exists check"));
        assert_eq!(
            store.save(&job).await.expect("save"),
            SaveOutcome::Inserted
        );
        assert!(store.exists_by_url(&job.url).await.expect("exists check"));
        assert_eq!(
            store.save(&job).await.expect("save again"),
            SaveOutcome::Duplicate
        );
        assert_eq!(store.jobs().len(), 1);
    }
}
