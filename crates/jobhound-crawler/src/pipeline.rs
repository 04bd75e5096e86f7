//! The two-phase crawl pipeline: discover posting locators, then fetch
//! details in bounded batches, with a circuit breaker on consecutive
//! fully-failed batches.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use jobhound_core::{JobPosting, ScrapingConfig, SourceId};
use jobhound_session::SessionManager;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::crawler::SourceCrawler;
use crate::store::SaveOutcome;

/// Receives accepted postings from the pipeline.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Hand over one fresh posting. The sink decides whether it is new
    /// or a duplicate of something already delivered or stored.
    async fn on_record(&self, job: JobPosting) -> Result<SaveOutcome>;
}

/// Counters for one source's crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    /// Source the counters describe
    pub source_id: SourceId,
    /// Human-readable source name
    pub source_name: String,
    /// Term/location pairs attempted
    pub searches: usize,
    /// Unique locators discovered across all searches
    pub discovered: usize,
    /// Postings delivered to the sink and persisted as new
    pub saved: usize,
    /// Postings the sink recognized as already known
    pub duplicates: usize,
    /// Detail pages without a usable posting
    pub rejected: usize,
    /// Postings discarded for exceeding the freshness window
    pub stale: usize,
    /// Fetches or deliveries that failed outright
    pub failed: usize,
    /// Reason the crawl was aborted early, if the breaker tripped
    pub aborted: Option<String>,
}

impl CrawlOutcome {
    fn new(crawler: &dyn SourceCrawler) -> Self {
        Self {
            source_id: crawler.source_id().clone(),
            source_name: crawler.source_name().to_string(),
            searches: 0,
            discovered: 0,
            saved: 0,
            duplicates: 0,
            rejected: 0,
            stale: 0,
            failed: 0,
            aborted: None,
        }
    }
}

/// Drives one source at a time through discovery and detail fetching.
pub struct CrawlPipeline {
    config: ScrapingConfig,
    sessions: Arc<SessionManager>,
    plan_seed: Option<u64>,
}

impl CrawlPipeline {
    /// Create a pipeline over the shared session manager.
    #[must_use]
    pub fn new(config: ScrapingConfig, sessions: Arc<SessionManager>) -> Self {
        Self {
            config,
            sessions,
            plan_seed: None,
        }
    }

    /// Fix the search-plan shuffle, for reproducible runs.
    #[must_use]
    pub fn with_seeded_plan(mut self, seed: u64) -> Self {
        self.plan_seed = Some(seed);
        self
    }

    /// Term/location pairs for one source: the full cartesian product,
    /// shuffled so no source sees the same leading queries every run,
    /// truncated to `max_searches`.
    #[must_use]
    pub fn search_plan(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .config
            .search_terms
            .iter()
            .flat_map(|term| {
                self.config
                    .locations
                    .iter()
                    .map(move |location| (term.clone(), location.clone()))
            })
            .collect();

        let mut rng = match self.plan_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        pairs.shuffle(&mut rng);
        pairs.truncate(self.config.max_searches as usize);
        pairs
    }

    /// Crawl one source to completion or until the circuit breaker
    /// trips. Failures are absorbed into the outcome; this never
    /// propagates an error to the caller.
    pub async fn run_source(
        &self,
        crawler: &dyn SourceCrawler,
        sink: &dyn RecordSink,
    ) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::new(crawler);
        let mut seen: HashSet<String> = HashSet::new();
        // Blocked discover calls and batches that accept nothing both
        // count; any batch with an accepted posting resets.
        let mut consecutive_failures: u32 = 0;
        let breaker_limit = self.config.max_consecutive_blocks.max(1);
        let batch_size = self.config.concurrency_limit.max(1);

        info!(source = %outcome.source_id, "starting crawl");

        'searches: for (term, location) in self.search_plan() {
            outcome.searches += 1;

            let locators = match crawler.discover(&term, &location).await {
                Ok(locators) => locators,
                Err(e) if e.is_blocking() => {
                    consecutive_failures += 1;
                    warn!(source = %outcome.source_id, term, error = %e,
                        "discovery blocked ({consecutive_failures}/{breaker_limit})");
                    if consecutive_failures >= breaker_limit {
                        outcome.aborted = Some(e.to_string());
                        break 'searches;
                    }
                    continue;
                }
                Err(e) => {
                    warn!(source = %outcome.source_id, term, error = %e, "discovery failed");
                    outcome.failed += 1;
                    continue;
                }
            };

            let fresh: Vec<String> = locators
                .into_iter()
                .filter(|locator| seen.insert(locator.clone()))
                .collect();
            outcome.discovered += fresh.len();

            for batch in fresh.chunks(batch_size) {
                let results = join_all(batch.iter().map(|loc| crawler.fetch_detail(loc))).await;

                let mut accepted = Vec::new();
                for (locator, result) in batch.iter().zip(results) {
                    match result {
                        Ok(Some(job)) => {
                            if job.is_fresh(self.config.max_job_age_days) {
                                accepted.push(job);
                            } else {
                                outcome.stale += 1;
                            }
                        }
                        Ok(None) => outcome.rejected += 1,
                        Err(e) if e.is_blocking() => {
                            outcome.failed += 1;
                            warn!(source = %outcome.source_id, locator, error = %e,
                                "detail fetch blocked");
                        }
                        Err(e) => {
                            outcome.failed += 1;
                            warn!(source = %outcome.source_id, locator, error = %e,
                                "detail fetch failed");
                        }
                    }
                }

                if accepted.is_empty() {
                    consecutive_failures += 1;
                } else {
                    consecutive_failures = 0;
                }

                for job in accepted {
                    match sink.on_record(job).await {
                        Ok(SaveOutcome::Inserted) => outcome.saved += 1,
                        Ok(SaveOutcome::Duplicate) => outcome.duplicates += 1,
                        Err(e) => {
                            outcome.failed += 1;
                            warn!(source = %outcome.source_id, error = %e, "sink delivery failed");
                        }
                    }
                }

                if consecutive_failures >= breaker_limit {
                    outcome.aborted = Some(format!(
                        "{consecutive_failures} consecutive failed batches"
                    ));
                    break 'searches;
                }

                self.sessions.pause(crawler.origin()).await;
            }
        }

        info!(
            source = %outcome.source_id,
            saved = outcome.saved,
            duplicates = outcome.duplicates,
            rejected = outcome.rejected,
            stale = outcome.stale,
            failed = outcome.failed,
            aborted = outcome.aborted.is_some(),
            "crawl finished"
        );
        outcome
    }
}
