//! HTML extraction for listing and detail pages.

use jobhound_sources::{DetailSelectors, ListSelectors};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::canonical::resolve_link;
use crate::error::{CrawlError, Result};

/// Extracts posting links from a search-result or listing page.
pub struct ListParser<'a> {
    selectors: &'a ListSelectors,
}

impl<'a> ListParser<'a> {
    /// Create a parser for the given list selectors.
    #[must_use]
    pub fn new(selectors: &'a ListSelectors) -> Self {
        Self { selectors }
    }

    /// Parse a listing page into absolute posting URLs, in page order.
    ///
    /// `page_url` is the address the page was fetched from; relative
    /// hrefs are resolved against it. Anchors without an href are
    /// skipped.
    pub fn parse(&self, html: &str, page_url: &str) -> Result<Vec<String>> {
        let document = Html::parse_document(html);
        let item_sel = compile(&self.selectors.item)?;
        let link_sel = compile(&self.selectors.link)?;

        let mut links = Vec::new();
        for item in document.select(&item_sel) {
            let Some(anchor) = item.select(&link_sel).next() else {
                continue;
            };
            let Some(href) = anchor.value().attr("href") else {
                debug!(selector = %self.selectors.link, "anchor without href, skipping");
                continue;
            };
            if let Some(url) = resolve_link(page_url, href) {
                links.push(url);
            } else {
                debug!(href, "unresolvable href, skipping");
            }
        }

        Ok(links)
    }
}

/// Fields extracted from one detail page. All fields are optional at
/// this stage; the crawler decides which absences are fatal.
#[derive(Debug, Default, Clone)]
pub struct ParsedDetail {
    /// Posting title
    pub title: Option<String>,
    /// Hiring company
    pub company: Option<String>,
    /// Location string as shown on the page
    pub location: Option<String>,
    /// Description body text
    pub description: Option<String>,
    /// Compensation string as shown on the page
    pub compensation: Option<String>,
    /// Raw posted-date string, not yet parsed
    pub posted_date: Option<String>,
    /// Skill tags, lowercased and deduplicated
    pub skills: Vec<String>,
}

/// Extracts posting fields from a detail page using ordered selector
/// fallback lists.
pub struct DetailParser<'a> {
    selectors: &'a DetailSelectors,
}

impl<'a> DetailParser<'a> {
    /// Create a parser for the given detail selectors.
    #[must_use]
    pub fn new(selectors: &'a DetailSelectors) -> Self {
        Self { selectors }
    }

    /// Extract posting fields from one detail page.
    pub fn parse(&self, html: &str) -> Result<ParsedDetail> {
        let document = Html::parse_document(html);

        let posted_date = self.extract_date(&document)?;
        Ok(ParsedDetail {
            title: first_match(&document, &self.selectors.title)?,
            company: first_match(&document, &self.selectors.company)?,
            location: first_match(&document, &self.selectors.location)?,
            description: first_match(&document, &self.selectors.description)?,
            compensation: first_match(&document, &self.selectors.compensation)?,
            posted_date,
            skills: self.extract_skills(&document)?,
        })
    }

    /// The date comes from an attribute when `date_attr` is configured
    /// (e.g. `<time datetime="...">`), otherwise from element text.
    fn extract_date(&self, document: &Html) -> Result<Option<String>> {
        for selector in &self.selectors.posted_date {
            let compiled = compile(selector)?;
            let Some(element) = document.select(&compiled).next() else {
                continue;
            };
            let raw = match &self.selectors.date_attr {
                Some(attr) => element.value().attr(attr).map(str::trim).map(String::from),
                None => non_empty_text(element),
            };
            if let Some(raw) = raw.filter(|r| !r.is_empty()) {
                return Ok(Some(raw));
            }
        }
        Ok(None)
    }

    /// Skill tags from the first selector that matches anything,
    /// lowercased, order preserved, duplicates dropped.
    fn extract_skills(&self, document: &Html) -> Result<Vec<String>> {
        for selector in &self.selectors.skills {
            let compiled = compile(selector)?;
            let mut skills: Vec<String> = Vec::new();
            for element in document.select(&compiled) {
                if let Some(text) = non_empty_text(element) {
                    let skill = text.to_lowercase();
                    if !skills.contains(&skill) {
                        skills.push(skill);
                    }
                }
            }
            if !skills.is_empty() {
                return Ok(skills);
            }
        }
        Ok(Vec::new())
    }
}

/// Try selectors in order; first non-empty text wins.
fn first_match(document: &Html, selectors: &[String]) -> Result<Option<String>> {
    for selector in selectors {
        let compiled = compile(selector)?;
        if let Some(text) = document.select(&compiled).next().and_then(non_empty_text) {
            return Ok(Some(text));
        }
    }
    Ok(None)
}

fn non_empty_text(element: ElementRef<'_>) -> Option<String> {
    let text = element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| CrawlError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}
