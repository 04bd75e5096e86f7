//! JobHound Sources - Source definition system for job board crawling.
//!
//! This crate provides the core types and functionality for managing job
//! source definitions. It handles loading TOML definition files, caching
//! them in memory, and providing query capabilities.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): Strongly-typed source metadata and selectors
//! - **Loader** ([`loader`]): TOML file loading from `source-definitions/` directory
//! - **Registry** ([`registry`]): In-memory cache with query support
//! - **Dates** ([`dates`]): Posted-date parsing (ISO, human-formatted, relative)
//! - **Errors** ([`error`]): Source-specific error types
//!
//! # Example
//!
//! ```rust
//! use jobhound_sources::{SourceLoader, SourceRegistry};
//! use jobhound_core::SourceId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load source definitions from the default directory
//! let loader = SourceLoader::with_default_dir()?;
//! let registry = SourceRegistry::load_from(&loader)?;
//!
//! // Query a specific source
//! let source_id = SourceId::new("remoteok")?;
//! let definition = registry.get(&source_id)?;
//!
//! println!("Source: {}", definition.name());
//! println!("Render: {:?}", definition.render());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod dates;
pub mod definition;
pub mod error;
pub mod loader;
pub mod registry;

// Re-export commonly used types
pub use dates::parse_posted_date;
pub use definition::{
    DateSpec, DetailSelectors, ListSelectors, RenderChoice, SearchSpec, SelectorSet,
    SourceDefinition, SourceMetadata,
};
pub use error::{Result, SourceError};
pub use loader::SourceLoader;
pub use registry::SourceRegistry;
