//! Runs the pipeline across every enabled source and funnels accepted
//! postings into the store through a run-scoped dedup sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use jobhound_core::{JobPosting, ScrapingConfig, Timestamp};
use jobhound_session::SessionManager;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::crawler::SourceCrawler;
use crate::dedup::SignatureSet;
use crate::error::Result;
use crate::pipeline::{CrawlOutcome, CrawlPipeline, RecordSink};
use crate::store::{JobStore, SaveOutcome};

/// Summary of one aggregation run across all sources.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Unique identifier for this run
    pub run_id: String,
    /// When the run started
    pub started_at: Timestamp,
    /// When the run finished
    pub finished_at: Timestamp,
    /// Per-source outcomes, in crawl order
    pub sources: Vec<CrawlOutcome>,
}

impl RunSummary {
    #[must_use]
    pub fn total_saved(&self) -> usize {
        self.sources.iter().map(|s| s.saved).sum()
    }

    #[must_use]
    pub fn total_duplicates(&self) -> usize {
        self.sources.iter().map(|s| s.duplicates).sum()
    }

    #[must_use]
    pub fn total_failed(&self) -> usize {
        self.sources.iter().map(|s| s.failed).sum()
    }
}

/// Sink for one run: postings are deduplicated first by content
/// signature within the run, then by canonical URL against the store.
struct RunSink {
    store: Arc<dyn JobStore>,
    signatures: Mutex<SignatureSet>,
}

impl RunSink {
    fn new(store: Arc<dyn JobStore>) -> Self {
        Self {
            store,
            signatures: Mutex::new(SignatureSet::new()),
        }
    }
}

#[async_trait::async_trait]
impl RecordSink for RunSink {
    async fn on_record(&self, job: JobPosting) -> Result<SaveOutcome> {
        let is_new = self
            .signatures
            .lock()
            .expect("acquire signatures lock")
            .insert(&job.title, &job.company);
        if !is_new {
            return Ok(SaveOutcome::Duplicate);
        }

        // An existence-check failure is not worth dropping the posting
        // over; the save itself stays idempotent on canonical URL.
        match self.store.exists_by_url(&job.url).await {
            Ok(true) => return Ok(SaveOutcome::Duplicate),
            Ok(false) => {}
            Err(e) => {
                warn!(url = %job.url, error = %e, "existence check failed, attempting save");
            }
        }

        Ok(self.store.save(&job).await?)
    }
}

/// Crawls sources sequentially and persists what they yield.
pub struct Aggregator {
    pipeline: CrawlPipeline,
    store: Arc<dyn JobStore>,
    pause_between_sources: Duration,
}

impl Aggregator {
    /// Create an aggregator writing to the given store.
    #[must_use]
    pub fn new(
        config: ScrapingConfig,
        sessions: Arc<SessionManager>,
        store: Arc<dyn JobStore>,
    ) -> Self {
        let pause_between_sources = Duration::from_millis(config.pause_between_sources_ms);
        Self {
            pipeline: CrawlPipeline::new(config, sessions),
            store,
            pause_between_sources,
        }
    }

    /// Fix the pipeline's search-plan shuffle, for reproducible runs.
    #[must_use]
    pub fn with_seeded_plan(mut self, seed: u64) -> Self {
        self.pipeline = self.pipeline.with_seeded_plan(seed);
        self
    }

    /// Run every crawler in order, pausing between sources. Per-source
    /// failures are contained in the summary; the run always completes.
    pub async fn run(&self, crawlers: &[Arc<dyn SourceCrawler>]) -> RunSummary {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Timestamp::now();
        info!(run_id, sources = crawlers.len(), "starting aggregation run");

        let sink = RunSink::new(Arc::clone(&self.store));
        let mut sources = Vec::with_capacity(crawlers.len());

        for (index, crawler) in crawlers.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.pause_between_sources).await;
            }
            sources.push(self.pipeline.run_source(crawler.as_ref(), &sink).await);
        }

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Timestamp::now(),
            sources,
        };
        info!(
            run_id = %summary.run_id,
            saved = summary.total_saved(),
            duplicates = summary.total_duplicates(),
            failed = summary.total_failed(),
            "aggregation run finished"
        );
        summary
    }
}
