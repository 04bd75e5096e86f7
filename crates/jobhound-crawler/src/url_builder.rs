//! Builds search URLs from source definitions.

use jobhound_sources::SearchSpec;

/// Turn free text into the URL-safe slug that search templates expect:
/// lowercase, with whitespace collapsed to single hyphens.
#[must_use]
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Expand a search spec into the URLs to fetch for one term/location
/// pair. Listing sources ignore the pair and return their fixed URLs.
#[must_use]
pub fn build_search_urls(spec: &SearchSpec, term: &str, location: &str) -> Vec<String> {
    match spec {
        SearchSpec::UrlTemplate { template } => {
            let url = template
                .replace("{term}", &slugify(term))
                .replace("{location}", &slugify(location));
            vec![url]
        }
        SearchSpec::Listing { urls } => urls.clone(),
    }
}
