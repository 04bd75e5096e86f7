//! Error types for crawl operations.

use jobhound_core::SourceId;
use thiserror::Error;

/// Errors that can occur while crawling a source.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The origin is actively refusing the crawl
    #[error("source {source_id} is blocking the crawl: {reason}")]
    SourceBlocked {
        /// Source that blocked us
        source_id: SourceId,
        /// What the block looked like
        reason: String,
    },

    /// The source's selectors no longer match its markup
    #[error("selectors outdated for source {source_id}: {reason}")]
    SelectorsOutdated {
        /// Source whose definition needs updating
        source_id: SourceId,
        /// Which extraction failed
        reason: String,
    },

    /// A selector in the definition is not valid CSS
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// The offending selector
        selector: String,
        /// Parse failure detail
        reason: String,
    },

    /// A locator could not be parsed as a URL
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// Fetch or session failure
    #[error("session error: {0}")]
    Session(#[from] jobhound_session::SessionError),

    /// Source definition failure
    #[error("source error: {0}")]
    Source(#[from] jobhound_sources::SourceError),
}

impl CrawlError {
    /// Whether the failure means the origin is actively refusing us.
    #[must_use]
    pub fn is_blocking(&self) -> bool {
        match self {
            Self::SourceBlocked { .. } => true,
            Self::Session(e) => e.is_blocking(),
            _ => false,
        }
    }
}

/// Result alias for crawl operations.
pub type Result<T> = std::result::Result<T, CrawlError>;
