//! URL handling module for ATC Spider
//!
//! This module provides domain extraction, allowed-domain matching and the
//! index site's relative-link convention.

mod domain;
mod matcher;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use matcher::matches_wildcard;

/// Marker the index site puts in front of every relative link (`./?code=...`)
pub const RELATIVE_LINK_MARKER: &str = "./";

/// Returns true if `domain` matches any of the allowed domain patterns
pub fn is_allowed_domain(domain: &str, allowed: &[String]) -> bool {
    allowed
        .iter()
        .any(|pattern| matches_wildcard(&pattern.to_lowercase(), domain))
}

/// Returns true if the URL points outside the allowed domains
///
/// URLs without a host are always off-site.
pub fn is_offsite(url: &Url, allowed: &[String]) -> bool {
    match extract_domain(url) {
        Some(domain) => !is_allowed_domain(&domain, allowed),
        None => true,
    }
}

/// Drops the two-character relative-link marker from an href
///
/// The marker is removed positionally, exactly as the site writes it; hrefs
/// that already start at the query string are returned unchanged.
pub fn strip_relative_marker(href: &str) -> &str {
    if href.starts_with(RELATIVE_LINK_MARKER) {
        &href[RELATIVE_LINK_MARKER.len()..]
    } else {
        href
    }
}

/// Builds the absolute URL of a child page
///
/// The href is concatenated onto the base URL as text (not resolved), which
/// is how the index builds its `?code=<code>&showdescription=no` links.
/// The href is used as extracted; surrounding whitespace is not removed.
///
/// # Examples
///
/// ```
/// use atc_spider::url::child_url;
/// use url::Url;
///
/// let base = Url::parse("https://www.whocc.no/atc_ddd_index/").unwrap();
/// let url = child_url(&base, "./?code=A&showdescription=no").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.whocc.no/atc_ddd_index/?code=A&showdescription=no"
/// );
/// ```
pub fn child_url(base_url: &Url, href: &str) -> Result<Url, UrlError> {
    let joined = format!("{}{}", base_url.as_str(), strip_relative_marker(href));
    let url = Url::parse(&joined).map_err(|e| UrlError::Parse(format!("{}: {}", joined, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
