//! End-to-end pipeline tests over scripted pages.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use jobhound_core::{CacheConfig, DateFallback, ScrapingConfig, SessionConfig, SourceId};
use jobhound_crawler::{Aggregator, MemoryStore, SelectorCrawler, SourceCrawler};
use jobhound_session::{BrowserIdentity, PageFetcher, SessionError, SessionManager};
use jobhound_sources::{
    DateSpec, DetailSelectors, ListSelectors, RenderChoice, SearchSpec, SelectorSet,
    SourceDefinition, SourceMetadata,
};

/// Serves pages from a fixed map; unknown URLs get a 404.
struct ScriptedFetcher {
    pages: Mutex<HashMap<String, String>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new(pages: HashMap<String, String>) -> Self {
        Self {
            pages: Mutex::new(pages),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(
        &self,
        url: &str,
        _identity: &BrowserIdentity,
    ) -> Result<String, SessionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .lock()
            .expect("pages lock")
            .get(url)
            .cloned()
            .ok_or_else(|| SessionError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

fn definition(search: SearchSpec) -> SourceDefinition {
    definition_named("test-board", "board.test", search)
}

fn definition_named(id: &str, domain: &str, search: SearchSpec) -> SourceDefinition {
    SourceDefinition {
        source: SourceMetadata {
            id: SourceId::new(id).expect("valid source ID"),
            name: format!("Board {domain}"),
            url: format!("https://{domain}"),
            domain: domain.to_string(),
            render: RenderChoice::Http,
            last_verified: NaiveDate::from_ymd_opt(2025, 8, 1).expect("valid date"),
        },
        search,
        selectors: SelectorSet {
            list: ListSelectors {
                item: "li.job".to_string(),
                link: "a.job-link".to_string(),
            },
            detail: DetailSelectors {
                title: vec!["h1".to_string()],
                company: vec![".company".to_string()],
                location: vec![".location".to_string()],
                description: vec![".description".to_string()],
                compensation: vec![".salary".to_string()],
                posted_date: vec!["time".to_string()],
                date_attr: Some("datetime".to_string()),
                skills: vec![".tag".to_string()],
            },
        },
        dates: DateSpec::default(),
    }
}

fn listing_page(links: &[&str]) -> String {
    let items: String = links
        .iter()
        .map(|href| format!(r#"<li class="job"><a class="job-link" href="{href}">job</a></li>"#))
        .collect();
    format!("<html><body><ul>{items}</ul></body></html>")
}

fn detail_page(title: &str, company: &str, posted_days_ago: i64) -> String {
    let posted = (Utc::now() - ChronoDuration::days(posted_days_ago)).to_rfc3339();
    format!(
        r#"<html><body>
            <h1>{title}</h1>
            <span class="company">{company}</span>
            <span class="location">Remote</span>
            <div class="description">We build backend systems in Rust on AWS.</div>
            <time datetime="{posted}">{posted_days_ago} days ago</time>
            <span class="tag">Rust</span>
        </body></html>"#
    )
}

fn scraping_config() -> ScrapingConfig {
    ScrapingConfig {
        search_terms: vec!["rust developer".to_string()],
        locations: vec!["remote".to_string()],
        max_searches: 8,
        concurrency_limit: 2,
        max_job_age_days: 7,
        max_consecutive_blocks: 2,
        date_fallback: DateFallback::Reject,
        pause_between_sources_ms: 0,
    }
}

fn session_manager(fetcher: Arc<ScriptedFetcher>) -> Arc<SessionManager> {
    let config = SessionConfig {
        base_delay_ms: 0,
        cooldown_secs: 0,
        ..SessionConfig::default()
    };
    Arc::new(
        SessionManager::with_fetchers(
            config,
            &CacheConfig::default(),
            fetcher.clone(),
            fetcher,
        )
        .with_seeded_rng(11),
    )
}

fn crawlers_for(
    def: SourceDefinition,
    sessions: &Arc<SessionManager>,
) -> Vec<Arc<dyn SourceCrawler>> {
    vec![Arc::new(SelectorCrawler::new(
        def,
        Arc::clone(sessions),
        DateFallback::Reject,
    ))]
}

#[tokio::test]
async fn test_run_saves_fresh_postings_and_collapses_locators() {
    let search_url = "https://board.test/search?q=rust-developer&l=remote";
    let mut pages = HashMap::new();
    // Three links, but two collapse to the same canonical locator.
    pages.insert(
        search_url.to_string(),
        listing_page(&[
            "/jobs/1?utm_source=feed",
            "/jobs/2",
            "https://board.test/jobs/1#apply",
        ]),
    );
    pages.insert(
        "https://board.test/jobs/1".to_string(),
        detail_page("Senior Rust Engineer", "Acme", 2),
    );
    pages.insert(
        "https://board.test/jobs/2".to_string(),
        detail_page("Platform Engineer", "Globex", 3),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher.clone());
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::UrlTemplate {
        template: "https://board.test/search?q={term}&l={location}".to_string(),
    });
    let crawlers = crawlers_for(def, &sessions);

    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());
    let summary = aggregator.run(&crawlers).await;

    assert_eq!(summary.sources.len(), 1);
    let outcome = &summary.sources[0];
    assert_eq!(outcome.discovered, 2);
    assert_eq!(outcome.saved, 2);
    assert_eq!(outcome.duplicates, 0);
    assert!(outcome.aborted.is_none());

    let jobs = store.jobs();
    assert_eq!(jobs.len(), 2);
    let saved = jobs
        .iter()
        .find(|j| j.title == "Senior Rust Engineer")
        .expect("saved posting");
    // Tracking params are gone from the stored URL.
    assert_eq!(saved.url, "https://board.test/jobs/1");
    assert_eq!(saved.skills, vec!["rust".to_string()]);
    // 1 listing + 2 detail fetches
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn test_rerun_reports_duplicates_not_new_saves() {
    let search_url = "https://board.test/search?q=rust-developer&l=remote";
    let mut pages = HashMap::new();
    pages.insert(search_url.to_string(), listing_page(&["/jobs/1"]));
    pages.insert(
        "https://board.test/jobs/1".to_string(),
        detail_page("Senior Rust Engineer", "Acme", 1),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher);
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::UrlTemplate {
        template: "https://board.test/search?q={term}&l={location}".to_string(),
    });
    let crawlers = crawlers_for(def, &sessions);
    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());

    let first = aggregator.run(&crawlers).await;
    assert_eq!(first.total_saved(), 1);

    // Each run gets a fresh signature set, so the store's URL check is
    // what must hold the line.
    let second = aggregator.run(&crawlers).await;
    assert_eq!(second.total_saved(), 0);
    assert_eq!(second.total_duplicates(), 1);
    assert_eq!(store.jobs().len(), 1);
}

#[tokio::test]
async fn test_stale_postings_are_discarded() {
    let search_url = "https://board.test/search?q=rust-developer&l=remote";
    let mut pages = HashMap::new();
    pages.insert(search_url.to_string(), listing_page(&["/jobs/1", "/jobs/2"]));
    pages.insert(
        "https://board.test/jobs/1".to_string(),
        detail_page("Fresh Role", "Acme", 2),
    );
    pages.insert(
        "https://board.test/jobs/2".to_string(),
        detail_page("Stale Role", "Acme", 30),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher);
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::UrlTemplate {
        template: "https://board.test/search?q={term}&l={location}".to_string(),
    });
    let crawlers = crawlers_for(def, &sessions);
    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());

    let summary = aggregator.run(&crawlers).await;
    let outcome = &summary.sources[0];
    assert_eq!(outcome.saved, 1);
    assert_eq!(outcome.stale, 1);
    assert_eq!(store.jobs().len(), 1);
    assert_eq!(store.jobs()[0].title, "Fresh Role");
}

#[tokio::test]
async fn test_missing_required_fields_reject_posting() {
    let search_url = "https://board.test/search?q=rust-developer&l=remote";
    let mut pages = HashMap::new();
    pages.insert(search_url.to_string(), listing_page(&["/jobs/1"]));
    // No company element: the posting is rejected, not saved half-empty.
    pages.insert(
        "https://board.test/jobs/1".to_string(),
        "<html><body><h1>Rust Engineer</h1>\
         <div class=\"description\">desc</div></body></html>"
            .to_string(),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher);
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::UrlTemplate {
        template: "https://board.test/search?q={term}&l={location}".to_string(),
    });
    let crawlers = crawlers_for(def, &sessions);
    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());

    let summary = aggregator.run(&crawlers).await;
    let outcome = &summary.sources[0];
    assert_eq!(outcome.rejected, 1);
    assert_eq!(outcome.saved, 0);
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn test_circuit_breaker_aborts_after_consecutive_blocks() {
    // Every listing page is an anti-bot challenge.
    let challenge = "<html><body><div class=\"g-recaptcha\">verify</div></body></html>";
    let mut pages = HashMap::new();
    pages.insert("https://board.test/jobs".to_string(), challenge.to_string());

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher);
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::Listing {
        urls: vec!["https://board.test/jobs".to_string()],
    });
    let crawlers = crawlers_for(def, &sessions);

    let config = ScrapingConfig {
        search_terms: vec!["rust".to_string(), "go".to_string(), "java".to_string()],
        max_consecutive_blocks: 2,
        ..scraping_config()
    };
    let aggregator = Aggregator::new(config, sessions, store.clone());

    let summary = aggregator.run(&crawlers).await;
    let outcome = &summary.sources[0];
    assert!(outcome.aborted.is_some());
    // Breaker trips on the second consecutive blocked search.
    assert_eq!(outcome.searches, 2);
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn test_circuit_breaker_aborts_after_failed_batches() {
    // The listing resolves, but every detail page 404s.
    let mut pages = HashMap::new();
    pages.insert(
        "https://board.test/jobs".to_string(),
        listing_page(&["/jobs/1", "/jobs/2", "/jobs/3", "/jobs/4", "/jobs/5", "/jobs/6"]),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher.clone());
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::Listing {
        urls: vec!["https://board.test/jobs".to_string()],
    });
    let crawlers = crawlers_for(def, &sessions);

    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());
    let summary = aggregator.run(&crawlers).await;

    let outcome = &summary.sources[0];
    // Batches of 2; the breaker trips after the second empty batch and
    // the remaining locators are never fetched.
    assert!(outcome.aborted.is_some());
    assert_eq!(outcome.failed, 4);
    assert_eq!(fetcher.calls(), 5);
    assert!(store.jobs().is_empty());
}

#[tokio::test]
async fn test_listing_source_ignores_search_terms() {
    let mut pages = HashMap::new();
    pages.insert(
        "https://board.test/jobs".to_string(),
        listing_page(&["/jobs/1"]),
    );
    pages.insert(
        "https://board.test/jobs/1".to_string(),
        detail_page("Rust Engineer", "Acme", 1),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher.clone());
    let store = Arc::new(MemoryStore::new());
    let def = definition(SearchSpec::Listing {
        urls: vec!["https://board.test/jobs".to_string()],
    });
    let crawlers = crawlers_for(def, &sessions);

    // Two terms, but the listing page is cached after the first search,
    // and its single posting is only fetched once.
    let config = ScrapingConfig {
        search_terms: vec!["rust".to_string(), "go".to_string()],
        ..scraping_config()
    };
    let aggregator = Aggregator::new(config, sessions, store.clone());
    let summary = aggregator.run(&crawlers).await;

    let outcome = &summary.sources[0];
    assert_eq!(outcome.searches, 2);
    assert_eq!(outcome.discovered, 1);
    assert_eq!(outcome.saved, 1);
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn test_failing_source_does_not_stop_later_sources() {
    // First source's listing 404s on every search; the second is healthy.
    let mut pages = HashMap::new();
    pages.insert(
        "https://b.test/search?q=rust-developer&l=remote".to_string(),
        listing_page(&["/jobs/1"]),
    );
    pages.insert(
        "https://b.test/jobs/1".to_string(),
        detail_page("Rust Engineer", "Acme", 1),
    );

    let fetcher = Arc::new(ScriptedFetcher::new(pages));
    let sessions = session_manager(fetcher);
    let store = Arc::new(MemoryStore::new());

    let broken = definition_named(
        "broken-board",
        "a.test",
        SearchSpec::UrlTemplate {
            template: "https://a.test/search?q={term}&l={location}".to_string(),
        },
    );
    let healthy = definition_named(
        "good-board",
        "b.test",
        SearchSpec::UrlTemplate {
            template: "https://b.test/search?q={term}&l={location}".to_string(),
        },
    );
    let crawlers: Vec<Arc<dyn SourceCrawler>> = vec![
        Arc::new(SelectorCrawler::new(
            broken,
            Arc::clone(&sessions),
            DateFallback::Reject,
        )),
        Arc::new(SelectorCrawler::new(
            healthy,
            Arc::clone(&sessions),
            DateFallback::Reject,
        )),
    ];

    let aggregator = Aggregator::new(scraping_config(), sessions, store.clone());
    let summary = aggregator.run(&crawlers).await;

    assert_eq!(summary.sources.len(), 2);
    let broken_outcome = summary
        .sources
        .iter()
        .find(|o| o.source_id.as_str() == "broken-board")
        .expect("broken source outcome");
    assert_eq!(broken_outcome.failed, 1);
    assert_eq!(broken_outcome.saved, 0);
    assert!(broken_outcome.aborted.is_none());

    let healthy_outcome = summary
        .sources
        .iter()
        .find(|o| o.source_id.as_str() == "good-board")
        .expect("healthy source outcome");
    assert_eq!(healthy_outcome.saved, 1);
    assert_eq!(store.jobs().len(), 1);
}
