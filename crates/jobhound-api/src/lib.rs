//! JobHound HTTP API and application composition.
//!
//! Exposes stored postings, skill and stats queries, crawl triggers,
//! and run history over a small REST surface. The `jobhound` binary in
//! this crate wires the whole system together: config, source
//! registry, session manager, database, scheduler, and this router.

pub mod app;
pub mod crawl;
pub mod routes;

pub use app::{build_router, AppState};
pub use crawl::CrawlService;
