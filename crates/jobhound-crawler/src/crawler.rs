//! Per-source crawling: discovery of posting locators and extraction of
//! full postings, driven entirely by the source's TOML definition.

use std::sync::Arc;

use jobhound_core::{DateFallback, JobCategory, JobId, JobPosting, SourceId, Timestamp};
use jobhound_session::{RenderMode, SessionManager};
use jobhound_sources::{parse_posted_date, RenderChoice, SourceDefinition};
use tracing::{debug, warn};

use crate::canonical::canonicalize_locator;
use crate::error::{CrawlError, Result};
use crate::parser::{DetailParser, ListParser};
use crate::url_builder::build_search_urls;

/// One retry for transient fetch failures; blocks are never retried.
const TRANSIENT_RETRIES: u32 = 1;

/// Skill keywords matched against descriptions when a source has no
/// skill tags of its own.
const SKILL_KEYWORDS: &[&str] = &[
    "rust",
    "python",
    "javascript",
    "typescript",
    "react",
    "vue",
    "node",
    "golang",
    "java",
    "kotlin",
    "swift",
    "c++",
    "sql",
    "postgresql",
    "redis",
    "aws",
    "gcp",
    "azure",
    "docker",
    "kubernetes",
    "terraform",
    "linux",
    "graphql",
    "machine learning",
];

/// A crawler for one job source.
#[async_trait::async_trait]
pub trait SourceCrawler: Send + Sync {
    /// Identifier of the source this crawler serves.
    fn source_id(&self) -> &SourceId;

    /// Human-readable source name, for logs and summaries.
    fn source_name(&self) -> &str;

    /// Origin used for pacing between requests to this source.
    fn origin(&self) -> &str;

    /// Discover canonical posting locators for one term/location pair.
    /// The result is deduplicated and ordered as found on the pages.
    async fn discover(&self, term: &str, location: &str) -> Result<Vec<String>>;

    /// Fetch and extract one posting. `Ok(None)` means the page was
    /// reachable but did not yield a usable posting (missing required
    /// fields, or an unusable date under the reject policy).
    async fn fetch_detail(&self, locator: &str) -> Result<Option<JobPosting>>;
}

/// Definition-driven crawler: CSS selectors from the source's TOML file
/// applied through the shared session manager.
pub struct SelectorCrawler {
    definition: SourceDefinition,
    sessions: Arc<SessionManager>,
    date_fallback: DateFallback,
}

impl SelectorCrawler {
    /// Create a crawler for one source definition.
    #[must_use]
    pub fn new(
        definition: SourceDefinition,
        sessions: Arc<SessionManager>,
        date_fallback: DateFallback,
    ) -> Self {
        Self {
            definition,
            sessions,
            date_fallback,
        }
    }

    fn render_mode(&self) -> RenderMode {
        match self.definition.render() {
            RenderChoice::Http => RenderMode::Http,
            RenderChoice::Browser => RenderMode::Browser,
        }
    }

    /// Fetch through the session manager, retrying transient failures
    /// once. Blocking failures are surfaced immediately so the pipeline
    /// can count them toward the circuit breaker.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let mode = self.render_mode();
        let mut attempt = 0;
        loop {
            match self.sessions.fetch(url, mode).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < TRANSIENT_RETRIES => {
                    attempt += 1;
                    warn!(url, attempt, error = %e, "transient fetch failure, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Resolve the posted date according to the source's formats and
    /// the configured fallback policy. `Ok(None)` means reject.
    fn resolve_posted_date(&self, raw: Option<&str>) -> Option<Timestamp> {
        if let Some(raw) = raw {
            if let Some(dt) = parse_posted_date(raw, &self.definition.dates.formats) {
                return Some(Timestamp::from_datetime(dt));
            }
            debug!(
                source = %self.definition.id(),
                raw,
                "unparseable posted date"
            );
        }
        match self.date_fallback {
            DateFallback::Reject => None,
            DateFallback::AssumeFresh => Some(Timestamp::now()),
        }
    }
}

#[async_trait::async_trait]
impl SourceCrawler for SelectorCrawler {
    fn source_id(&self) -> &SourceId {
        self.definition.id()
    }

    fn source_name(&self) -> &str {
        self.definition.name()
    }

    fn origin(&self) -> &str {
        &self.definition.source.domain
    }

    async fn discover(&self, term: &str, location: &str) -> Result<Vec<String>> {
        let pages = build_search_urls(&self.definition.search, term, location);
        let parser = ListParser::new(&self.definition.selectors.list);

        let mut locators: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut last_error: Option<CrawlError> = None;

        for page_url in &pages {
            let body = match self.fetch_page(page_url).await {
                Ok(body) => body,
                Err(e) if e.is_blocking() => return Err(e),
                Err(e) => {
                    warn!(source = %self.definition.id(), url = %page_url, error = %e,
                        "listing page fetch failed");
                    last_error = Some(e);
                    continue;
                }
            };
            for link in parser.parse(&body, page_url)? {
                match canonicalize_locator(&link) {
                    Ok(canonical) => {
                        if seen.insert(canonical.clone()) {
                            locators.push(canonical);
                        }
                    }
                    Err(e) => debug!(link, error = %e, "skipping uncanonicalizable link"),
                }
            }
        }

        // All pages failed: surface the failure instead of an empty result.
        if locators.is_empty() {
            if let Some(e) = last_error {
                return Err(e);
            }
        }

        debug!(
            source = %self.definition.id(),
            term,
            location,
            count = locators.len(),
            "discovered posting locators"
        );
        Ok(locators)
    }

    async fn fetch_detail(&self, locator: &str) -> Result<Option<JobPosting>> {
        let body = self.fetch_page(locator).await?;
        let detail = DetailParser::new(&self.definition.selectors.detail).parse(&body)?;

        let (Some(title), Some(company), Some(description)) =
            (detail.title, detail.company, detail.description)
        else {
            debug!(
                source = %self.definition.id(),
                locator,
                "detail page missing required fields"
            );
            return Ok(None);
        };

        let Some(posted_at) = self.resolve_posted_date(detail.posted_date.as_deref()) else {
            return Ok(None);
        };

        let url = canonicalize_locator(locator)?;
        let mut skills = detail.skills;
        if skills.is_empty() {
            skills = extract_skill_keywords(&description);
        }

        let source = self.definition.id().clone();
        Ok(Some(JobPosting {
            id: JobId::derive(&source, &url, &title),
            source,
            category: JobCategory::classify(&title),
            title,
            company,
            location: detail
                .location
                .unwrap_or_else(|| "Unspecified".to_string()),
            url,
            description,
            compensation: detail.compensation,
            skills,
            posted_at,
            scraped_at: Timestamp::now(),
        }))
    }
}

/// Keyword scan over a description, preserving keyword order.
#[must_use]
pub fn extract_skill_keywords(description: &str) -> Vec<String> {
    let haystack = description.to_lowercase();
    SKILL_KEYWORDS
        .iter()
        .filter(|k| contains_token(&haystack, k))
        .map(|k| (*k).to_string())
        .collect()
}

/// Substring match that refuses matches embedded in a longer word, so
/// "java" does not fire inside "javascript". Keywords themselves may
/// contain non-alphanumeric characters ("c++") or spaces.
fn contains_token(haystack: &str, keyword: &str) -> bool {
    haystack.match_indices(keyword).any(|(start, _)| {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[start + keyword.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skill_keyword_extraction() {
        let description = "We use Rust and TypeScript, deployed on AWS with Docker.";
        assert_eq!(
            extract_skill_keywords(description),
            vec!["rust", "typescript", "aws", "docker"]
        );
    }

    #[test]
    fn test_skill_keyword_extraction_empty() {
        assert!(extract_skill_keywords("We value teamwork.").is_empty());
    }

    #[test]
    fn test_skill_keywords_respect_word_boundaries() {
        // "javascript" must not also report "java"
        let description = "Senior JavaScript engineer building Node tooling.";
        assert_eq!(
            extract_skill_keywords(description),
            vec!["javascript", "node"]
        );

        let description = "Java backend services, no frontend work.";
        assert_eq!(extract_skill_keywords(description), vec!["java"]);
    }

    #[test]
    fn test_skill_keywords_with_punctuation() {
        let description = "Modern C++ (17 and later) and Python.";
        assert_eq!(extract_skill_keywords(description), vec!["python", "c++"]);
    }
}
