//! Crawl orchestration for JobHound.
//!
//! This crate turns source definitions into stored job postings. Each
//! source goes through a two-phase pipeline:
//!
//! 1. **Discover** — expand the source's search spec into listing pages,
//!    fetch them through the shared session manager, and extract
//!    canonical posting locators.
//! 2. **Fetch** — retrieve detail pages in bounded concurrent batches,
//!    extract postings with the source's selectors, filter by
//!    freshness, and deliver survivors to a [`RecordSink`].
//!
//! A circuit breaker aborts a source's crawl after too many consecutive
//! blocking failures, so one hostile origin cannot burn the rest of the
//! run's budget. Duplicate suppression happens at two tiers: content
//! signatures within a run, canonical URLs against the store.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod aggregator;
pub mod canonical;
pub mod crawler;
pub mod dedup;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod store;
pub mod url_builder;

pub use aggregator::{Aggregator, RunSummary};
pub use canonical::{canonicalize_locator, resolve_link};
pub use crawler::{SelectorCrawler, SourceCrawler};
pub use dedup::{signature, SignatureSet};
pub use error::{CrawlError, Result};
pub use pipeline::{CrawlOutcome, CrawlPipeline, RecordSink};
pub use store::{JobStore, MemoryStore, SaveOutcome, StoreError};
