//! JobHound Core - Foundation crate for the JobHound job aggregator.
//!
//! This crate provides shared types, error handling, and configuration
//! management that all other JobHound crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes and enums (`SourceId`, `JobId`, `JobPosting`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use jobhound_core::{AppConfig, JobCategory};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration
//! let config = AppConfig::default();
//!
//! // Classify a posting title
//! let category = JobCategory::classify("Senior Rust Developer");
//! assert_eq!(category, JobCategory::Engineering);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{
    ApiConfig, AppConfig, CacheConfig, DateFallback, SchedulerConfig, ScrapingConfig,
    SessionConfig, StorageConfig,
};
pub use error::{ConfigError, ConfigResult, JobHoundError, Result};
pub use types::{JobCategory, JobId, JobPosting, SourceId, Timestamp};
