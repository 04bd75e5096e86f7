//! Source definition types and structures.
//!
//! This module defines the data structures for job source definitions
//! loaded from TOML files.

use crate::error::{Result, SourceError};
use chrono::NaiveDate;
use jobhound_core::SourceId;
use serde::{Deserialize, Serialize};

/// Complete job source definition loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Core source metadata
    pub source: SourceMetadata,

    /// Search/discovery configuration
    pub search: SearchSpec,

    /// CSS selectors for list and detail pages
    pub selectors: SelectorSet,

    /// Posted-date parsing configuration
    #[serde(default)]
    pub dates: DateSpec,
}

impl SourceDefinition {
    /// Get the source ID.
    #[must_use]
    pub fn id(&self) -> &SourceId {
        &self.source.id
    }

    /// Get the source name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.source.name
    }

    /// Get the render mode required by the source.
    #[must_use]
    pub fn render(&self) -> RenderChoice {
        self.source.render
    }

    /// Validate the source definition for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.source.name.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: self.source.id.to_string(),
                reason: "source name cannot be empty".to_string(),
            });
        }

        if self.source.url.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: self.source.id.to_string(),
                reason: "source URL cannot be empty".to_string(),
            });
        }

        if self.source.domain.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: self.source.id.to_string(),
                reason: "source domain cannot be empty".to_string(),
            });
        }

        self.search.validate(&self.source.id)?;
        self.selectors.validate(&self.source.id)?;

        Ok(())
    }
}

/// Core source metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Unique source identifier (e.g., "remoteok", "simplyhired")
    pub id: SourceId,

    /// Human-readable source name
    pub name: String,

    /// Source website URL
    pub url: String,

    /// Source domain (e.g., "remoteok.com")
    pub domain: String,

    /// How pages must be rendered before extraction
    #[serde(default)]
    pub render: RenderChoice,

    /// Date when this definition was last verified against the live site (YYYY-MM-DD)
    pub last_verified: NaiveDate,
}

/// Rendering requirement for a source's pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderChoice {
    /// Plain HTTP is enough
    #[default]
    Http,
    /// Needs a headless browser to render JavaScript
    Browser,
}

/// Methods for discovering posting locators on a source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum SearchSpec {
    /// URL template with `{term}` and `{location}` placeholders
    #[serde(rename = "url-template")]
    UrlTemplate {
        /// Template such as `https://example.com/jobs?q={term}&l={location}`
        template: String,
    },

    /// Fixed listing pages crawled regardless of search terms
    Listing {
        /// Listing page URLs
        urls: Vec<String>,
    },
}

impl SearchSpec {
    /// Validate the search configuration.
    fn validate(&self, source_id: &SourceId) -> Result<()> {
        match self {
            Self::UrlTemplate { template } => {
                if template.is_empty() {
                    return Err(SourceError::ValidationError {
                        source_id: source_id.to_string(),
                        reason: "URL template cannot be empty".to_string(),
                    });
                }
                if !template.contains("{term}") {
                    return Err(SourceError::ValidationError {
                        source_id: source_id.to_string(),
                        reason: "URL template must contain a {term} placeholder".to_string(),
                    });
                }
            }
            Self::Listing { urls } => {
                if urls.is_empty() {
                    return Err(SourceError::ValidationError {
                        source_id: source_id.to_string(),
                        reason: "listing search requires at least one URL".to_string(),
                    });
                }
                if urls.iter().any(String::is_empty) {
                    return Err(SourceError::ValidationError {
                        source_id: source_id.to_string(),
                        reason: "listing URLs cannot be empty".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// CSS selectors for a source's list and detail pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Selectors applied to search-result/listing pages
    pub list: ListSelectors,
    /// Selectors applied to posting detail pages
    pub detail: DetailSelectors,
}

impl SelectorSet {
    fn validate(&self, source_id: &SourceId) -> Result<()> {
        if self.list.item.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: source_id.to_string(),
                reason: "selectors.list.item cannot be empty".to_string(),
            });
        }
        if self.list.link.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: source_id.to_string(),
                reason: "selectors.list.link cannot be empty".to_string(),
            });
        }
        if self.detail.title.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: source_id.to_string(),
                reason: "selectors.detail.title requires at least one selector".to_string(),
            });
        }
        if self.detail.company.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: source_id.to_string(),
                reason: "selectors.detail.company requires at least one selector".to_string(),
            });
        }
        if self.detail.description.is_empty() {
            return Err(SourceError::ValidationError {
                source_id: source_id.to_string(),
                reason: "selectors.detail.description requires at least one selector".to_string(),
            });
        }
        Ok(())
    }
}

/// Selectors for extracting posting links from a listing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSelectors {
    /// Selector matching one result row/card
    pub item: String,
    /// Selector, within an item, for the anchor carrying the posting URL
    pub link: String,
}

/// Ordered selector lists for a posting detail page.
///
/// Each field lists selectors in priority order; extraction uses the
/// first one that matches. Sites change their markup, so later entries
/// act as fallbacks for older layouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailSelectors {
    /// Posting title
    pub title: Vec<String>,
    /// Hiring company
    pub company: Vec<String>,
    /// Location string
    #[serde(default)]
    pub location: Vec<String>,
    /// Description body
    pub description: Vec<String>,
    /// Compensation/salary element
    #[serde(default)]
    pub compensation: Vec<String>,
    /// Posted-date element
    #[serde(default)]
    pub posted_date: Vec<String>,
    /// Attribute to read the date from (e.g. `datetime`); element text when unset
    #[serde(default)]
    pub date_attr: Option<String>,
    /// Skill/tag elements
    #[serde(default)]
    pub skills: Vec<String>,
}

/// Posted-date parsing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DateSpec {
    /// chrono format strings tried in order after the built-in
    /// RFC3339 and relative-phrase parsers
    pub formats: Vec<String>,
}

impl Default for DateSpec {
    fn default() -> Self {
        Self {
            formats: vec![
                "%Y-%m-%d".to_string(),
                "%B %d, %Y".to_string(),
                "%b %d, %Y".to_string(),
            ],
        }
    }
}
