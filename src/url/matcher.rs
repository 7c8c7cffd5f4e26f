/// Checks if a domain matches a wildcard pattern
///
/// Two pattern forms are supported:
/// 1. Exact match: `example.com` matches only `example.com`
/// 2. Wildcard match: `*.example.com` matches `example.com` itself,
///    `docs.example.com`, and nested subdomains like `api.v2.example.com`
///
/// Used by [`BackendCriteria`](crate::backend::BackendCriteria) to scope
/// backends to particular domains. Both sides are expected to be
/// lowercase; normalization happens upstream.
///
/// # Examples
///
/// ```
/// use docharvest::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "other.com"));
///
/// assert!(matches_wildcard("*.example.com", "example.com"));
/// assert!(matches_wildcard("*.example.com", "docs.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        // Wildcard pattern: matches the base domain itself or any subdomain
        candidate == base || candidate.ends_with(&format!(".{}", base))
    } else {
        // Exact match only
        candidate == pattern
    }
}
