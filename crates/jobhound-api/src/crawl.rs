//! Crawl execution service shared by the API trigger and the scheduler.

use std::sync::Arc;

use jobhound_core::AppConfig;
use jobhound_crawler::{Aggregator, JobStore, RunSummary, SelectorCrawler, SourceCrawler};
use jobhound_db::{crawl_runs, Database};
use jobhound_scheduler::CrawlRunner;
use jobhound_session::SessionManager;
use jobhound_sources::SourceRegistry;
use tracing::{info, warn};

/// Runs full aggregation passes over every registered source.
///
/// At most one run executes at a time; concurrent triggers are
/// rejected instead of queued.
pub struct CrawlService {
    config: AppConfig,
    sessions: Arc<SessionManager>,
    registry: Arc<SourceRegistry>,
    db: Arc<Database>,
    running: tokio::sync::Mutex<()>,
}

impl CrawlService {
    /// Create the service over shared application components.
    #[must_use]
    pub fn new(
        config: AppConfig,
        sessions: Arc<SessionManager>,
        registry: Arc<SourceRegistry>,
        db: Arc<Database>,
    ) -> Self {
        Self {
            config,
            sessions,
            registry,
            db,
            running: tokio::sync::Mutex::new(()),
        }
    }

    fn build_crawlers(&self) -> Vec<Arc<dyn SourceCrawler>> {
        self.registry
            .get_all()
            .into_iter()
            .map(|definition| {
                Arc::new(SelectorCrawler::new(
                    definition,
                    Arc::clone(&self.sessions),
                    self.config.scraping.date_fallback,
                )) as Arc<dyn SourceCrawler>
            })
            .collect()
    }

    /// Whether a run is currently in progress.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Execute one run if none is in progress. Returns `None` when a
    /// run is already underway.
    pub async fn run_once(&self) -> Option<RunSummary> {
        let Ok(_guard) = self.running.try_lock() else {
            info!("Crawl run already in progress, skipping trigger");
            return None;
        };

        let crawlers = self.build_crawlers();
        if crawlers.is_empty() {
            warn!("No sources registered, nothing to crawl");
        }

        let store: Arc<dyn JobStore> = Arc::clone(&self.db) as Arc<dyn JobStore>;
        let aggregator = Aggregator::new(
            self.config.scraping.clone(),
            Arc::clone(&self.sessions),
            store,
        );
        let summary = aggregator.run(&crawlers).await;

        if let Err(e) = crawl_runs::record_run(self.db.pool(), &summary).await {
            warn!("Failed to record crawl run: {e}");
        }

        Some(summary)
    }
}

#[async_trait::async_trait]
impl CrawlRunner for CrawlService {
    async fn last_run_started_at(&self) -> Option<String> {
        match crawl_runs::last_run_started_at(self.db.pool()).await {
            Ok(last) => last,
            Err(e) => {
                warn!("Failed to read last run timestamp: {e}");
                None
            }
        }
    }

    async fn run_crawl(&self) {
        self.run_once().await;
    }
}
