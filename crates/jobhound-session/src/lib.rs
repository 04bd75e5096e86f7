//! Origin session management for polite, detection-resistant scraping.
//!
//! Every outbound request JobHound makes flows through the
//! [`SessionManager`]: per-origin rotating identities with request
//! budgets and cooldowns, adaptive inter-request delays, a TTL response
//! cache, and a global cap on heavyweight fetch contexts.

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod session;
pub mod sweep;

pub use error::{Result, SessionError};
pub use fetcher::{ChromeFetcher, HttpFetcher, PageFetcher, RenderMode};
pub use identity::BrowserIdentity;
pub use session::{SessionManager, SessionState, SessionStats, SweepReport};
pub use sweep::SweepHandle;
