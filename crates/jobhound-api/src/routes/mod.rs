//! HTTP route handlers.

pub mod crawl;
pub mod health;
pub mod jobs;
