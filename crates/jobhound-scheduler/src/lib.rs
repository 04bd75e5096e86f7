//! Periodic crawl scheduling for JobHound.
//!
//! A small loop that checks whether a crawl run is due based on the
//! last run's start time and the configured interval, and triggers one
//! when it is.

pub mod runner;
pub mod scheduler;

pub use runner::{CrawlRunner, CrawlScheduler, SchedulerHandle};
pub use scheduler::{is_run_due, next_run_timestamp};
