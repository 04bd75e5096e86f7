//! Canonical form for job locators.
//!
//! Sources decorate listing links with tracking parameters and fragments
//! that vary between visits; two links to the same posting must collapse
//! to one canonical URL before dedup and storage see them.

use url::Url;

use crate::error::{CrawlError, Result};

/// Query parameters that carry no identity, only tracking state.
const TRACKING_PARAMS: &[&str] = &["ref", "fbclid", "gclid", "mc_cid", "mc_eid", "source"];

/// Resolve a possibly-relative href against the page it was found on.
#[must_use]
pub fn resolve_link(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// Reduce a locator to its canonical form: drop the fragment, strip
/// tracking query parameters, and trim the trailing slash from the path.
pub fn canonicalize_locator(locator: &str) -> Result<String> {
    let mut url =
        Url::parse(locator).map_err(|e| CrawlError::InvalidLocator(format!("{locator}: {e}")))?;

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Ok(url.into())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_tracking_params() {
        let url = "https://example.com/jobs/123?utm_source=feed&utm_campaign=x&id=5";
        assert_eq!(
            canonicalize_locator(url).expect("canonicalize"),
            "https://example.com/jobs/123?id=5"
        );
    }

    #[test]
    fn test_strips_fragment_and_trailing_slash() {
        let url = "https://example.com/jobs/123/#apply";
        assert_eq!(
            canonicalize_locator(url).expect("canonicalize"),
            "https://example.com/jobs/123"
        );
    }

    #[test]
    fn test_root_path_keeps_slash() {
        assert_eq!(
            canonicalize_locator("https://example.com/").expect("canonicalize"),
            "https://example.com/"
        );
    }

    #[test]
    fn test_ref_and_fbclid_removed() {
        let url = "https://example.com/j/9?ref=homepage&fbclid=abc123&page=2";
        assert_eq!(
            canonicalize_locator(url).expect("canonicalize"),
            "https://example.com/j/9?page=2"
        );
    }

    #[test]
    fn test_equivalent_links_collapse() {
        let a = canonicalize_locator("https://example.com/jobs/42?utm_medium=email")
            .expect("canonicalize");
        let b = canonicalize_locator("https://example.com/jobs/42/#top").expect("canonicalize");
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_locator_rejected() {
        assert!(canonicalize_locator("not a url").is_err());
    }

    #[test]
    fn test_resolve_relative_link() {
        assert_eq!(
            resolve_link("https://example.com/jobs", "/jobs/123").as_deref(),
            Some("https://example.com/jobs/123")
        );
        assert_eq!(
            resolve_link("https://example.com/jobs", "https://other.com/x").as_deref(),
            Some("https://other.com/x")
        );
    }
}
