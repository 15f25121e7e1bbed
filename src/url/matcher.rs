/// Checks if a domain matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "www.whocc.no" matches only "www.whocc.no"
/// 2. Wildcard match: "*.whocc.no" matches "whocc.no" and any subdomain of it
///
/// # Arguments
///
/// * `pattern` - The domain pattern, optionally starting with "*."
/// * `candidate` - The domain to check against the pattern
///
/// # Returns
///
/// * `true` - If the candidate matches the pattern
/// * `false` - Otherwise
///
/// # Examples
///
/// ```
/// use atc_spider::url::matches_wildcard;
///
/// assert!(matches_wildcard("www.whocc.no", "www.whocc.no"));
/// assert!(!matches_wildcard("www.whocc.no", "whocc.no"));
///
/// assert!(matches_wildcard("*.whocc.no", "whocc.no"));
/// assert!(matches_wildcard("*.whocc.no", "www.whocc.no"));
/// assert!(!matches_wildcard("*.whocc.no", "whocc.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let Some(base) = pattern.strip_prefix("*.") else {
        return candidate == pattern;
    };

    // What is left in front of the base must end on a label boundary
    match candidate.strip_suffix(base) {
        Some(labels) => labels.is_empty() || labels.ends_with('.'),
        None => false,
    }
}
