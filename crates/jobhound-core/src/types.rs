//! Shared types used across the JobHound application.
//!
//! This module defines common newtypes and enums that provide type safety
//! and clear domain modeling.

use crate::error::JobHoundError;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::OnceLock;

/// Newtype for source identifiers with validation.
///
/// Source IDs must be lowercase alphanumeric with hyphens, 3-50 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId(String);

impl SourceId {
    /// Create a new `SourceId` from a string.
    ///
    /// # Errors
    /// Returns error if the ID doesn't match the required format.
    pub fn new(id: impl Into<String>) -> Result<Self, JobHoundError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate source ID format: lowercase alphanumeric with hyphens, 3-50 chars.
    fn validate(id: &str) -> Result<(), JobHoundError> {
        static SOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SOURCE_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{1,48}[a-z0-9]$").expect("valid regex"));

        if id.len() < 3 || id.len() > 50 {
            return Err(JobHoundError::Validation(format!(
                "invalid source ID: must be 3-50 characters, got {} characters",
                id.len()
            )));
        }

        if regex.is_match(id) {
            Ok(())
        } else {
            Err(JobHoundError::Validation(format!(
                "invalid source ID: must be lowercase alphanumeric with hyphens, got '{id}'"
            )))
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Newtype for job posting identifiers.
///
/// Job IDs are derived deterministically from the source, canonical URL,
/// and title, so re-crawling the same posting always produces the same ID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    /// Derive a job ID from its identifying fields.
    ///
    /// The ID is the hex-encoded SHA-256 digest of
    /// `source + canonical_url + title`.
    #[must_use]
    pub fn derive(source: &SourceId, canonical_url: &str, title: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(source.as_str().as_bytes());
        hasher.update(canonical_url.as_bytes());
        hasher.update(title.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an already-derived ID (e.g. read back from storage).
    #[must_use]
    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Broad categories a job posting can be classified into.
///
/// Classification is keyword-based on the posting title, so it is a
/// coarse signal rather than an authoritative label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobCategory {
    /// Software engineering and development roles
    Engineering,
    /// Data science, analytics, and ML roles
    Data,
    /// Design and UX roles
    Design,
    /// Product management roles
    Product,
    /// DevOps, SRE, and infrastructure roles
    Infrastructure,
    /// Security roles
    Security,
    /// QA and testing roles
    QualityAssurance,
    /// Marketing and sales roles
    Marketing,
    /// Everything else
    Other,
}

impl JobCategory {
    /// Get a human-readable display name for the category.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Engineering => "Engineering",
            Self::Data => "Data",
            Self::Design => "Design",
            Self::Product => "Product",
            Self::Infrastructure => "Infrastructure",
            Self::Security => "Security",
            Self::QualityAssurance => "Quality Assurance",
            Self::Marketing => "Marketing",
            Self::Other => "Other",
        }
    }

    /// Classify a posting title into a category by keyword matching.
    ///
    /// Matching is case-insensitive and first-match-wins, with more
    /// specific categories checked before broader ones.
    #[must_use]
    pub fn classify(title: &str) -> Self {
        let title = title.to_lowercase();
        let matches = |keywords: &[&str]| keywords.iter().any(|k| title.contains(k));

        if matches(&["devops", "sre", "site reliability", "infrastructure", "platform engineer"]) {
            Self::Infrastructure
        } else if matches(&["security", "appsec", "penetration"]) {
            Self::Security
        } else if matches(&["qa ", "quality assurance", "test engineer", "sdet"]) {
            Self::QualityAssurance
        } else if matches(&["data scientist", "data engineer", "data analyst", "machine learning", "ml engineer"]) {
            Self::Data
        } else if matches(&["designer", "ux", "ui design"]) {
            Self::Design
        } else if matches(&["product manager", "product owner"]) {
            Self::Product
        } else if matches(&["marketing", "sales", "growth", "seo"]) {
            Self::Marketing
        } else if matches(&["engineer", "developer", "programmer", "software", "backend", "frontend", "full stack", "fullstack"]) {
            Self::Engineering
        } else {
            Self::Other
        }
    }
}

impl fmt::Display for JobCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Wrapper around `chrono::DateTime<Utc>` for consistent timestamp handling.
///
/// Provides serialization/deserialization and utility methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp representing the current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parse a timestamp from an RFC3339 string.
    pub fn from_rfc3339(s: &str) -> Result<Self, JobHoundError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| JobHoundError::Validation(format!("invalid timestamp: {e}")))
    }

    /// Format as RFC3339 string.
    #[must_use]
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Get seconds since Unix epoch.
    #[must_use]
    pub fn timestamp(&self) -> i64 {
        self.0.timestamp()
    }

    /// Whole days elapsed between this timestamp and now.
    ///
    /// Future timestamps report zero age.
    #[must_use]
    pub fn age_days(&self) -> i64 {
        (Utc::now() - self.0).num_days().max(0)
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

/// A fully extracted job posting.
///
/// This is the record the crawl pipeline hands to the aggregator after
/// parsing a detail page. The `url` field always holds the canonical
/// form of the posting locator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    /// Deterministic identifier derived from source, URL, and title
    pub id: JobId,
    /// Source the posting was crawled from
    pub source: SourceId,
    /// Posting title
    pub title: String,
    /// Hiring company
    pub company: String,
    /// Location string as published (may be "Remote")
    pub location: String,
    /// Canonical posting URL
    pub url: String,
    /// Posting description text
    pub description: String,
    /// Compensation string as published, when the source exposes one
    pub compensation: Option<String>,
    /// Extracted skill keywords, lowercase, deduplicated
    pub skills: Vec<String>,
    /// Coarse category classified from the title
    pub category: JobCategory,
    /// When the posting was published
    pub posted_at: Timestamp,
    /// When the posting was scraped
    pub scraped_at: Timestamp,
}

impl JobPosting {
    /// Whether the posting was published within the last `max_age_days` days.
    #[must_use]
    pub fn is_fresh(&self, max_age_days: u32) -> bool {
        self.posted_at.age_days() <= i64::from(max_age_days)
    }
}
