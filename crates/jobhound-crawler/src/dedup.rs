//! Run-level duplicate detection.
//!
//! Different sources list the same opening under different URLs, so URL
//! dedup alone is not enough. Within a single run, postings are also
//! compared by a coarse content signature built from the title prefix
//! and the company name. The signature is deliberately lossy: "Senior
//! Rust Engineer (Remote)" and "Senior Rust Engineer - Platform" at the
//! same company collapse to one record.

use std::collections::HashSet;

/// Lowercase, replace non-alphanumeric characters with spaces, and
/// collapse runs of whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Content signature: first three normalized title tokens joined with
/// spaces, then `::`, then the normalized company.
#[must_use]
pub fn signature(title: &str, company: &str) -> String {
    let title_norm = normalize(title);
    let prefix: Vec<&str> = title_norm.split_whitespace().take(3).collect();
    format!("{}::{}", prefix.join(" "), normalize(company))
}

/// Set of signatures seen during one run.
#[derive(Debug, Default)]
pub struct SignatureSet {
    seen: HashSet<String>,
}

impl SignatureSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a signature. Returns `true` if it was new.
    pub fn insert(&mut self, title: &str, company: &str) -> bool {
        self.seen.insert(signature(title, company))
    }

    /// Number of distinct signatures recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
