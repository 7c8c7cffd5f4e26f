use crate::UrlError;
use url::Url;

/// List of tracking query parameters to remove during normalization
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "fbclid",
    "gclid",
    "mc_eid",
    "ref",
    "source",
];

/// Normalizes a URL into the canonical form used for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Validate scheme: only `http`, `https`, and `file` are accepted
/// 3. Lowercase the host (the `url` crate strips default ports itself)
/// 4. Remove `www.` prefix from the host
/// 5. Normalize path:
///    - Remove dot segments (`.` and `..`)
///    - Collapse duplicate slashes
///    - Remove trailing slash (except for root `/`)
///    - Empty path becomes `/`
/// 6. Remove fragment (everything after `#`)
/// 7. Remove tracking query parameters
/// 8. Sort remaining query parameters alphabetically
/// 9. Remove empty query string (trailing `?`)
///
/// `file://` URLs skip the host steps and keep their full path.
///
/// # Examples
///
/// ```
/// use docharvest::url::normalize_url;
///
/// let url = normalize_url("https://WWW.EXAMPLE.COM/page/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {
            if let Some(host) = url.host_str() {
                let mut normalized_host = host.to_lowercase();
                if normalized_host.starts_with("www.") {
                    normalized_host = normalized_host[4..].to_string();
                }
                url.set_host(Some(&normalized_host))
                    .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;
            } else {
                return Err(UrlError::MissingDomain);
            }
        }
        "file" => {}
        other => {
            return Err(UrlError::InvalidScheme(format!(
                "Only http, https, and file schemes are supported, got: {}",
                other
            )));
        }
    }

    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    url.set_fragment(None);

    if url.query().is_some() {
        let filtered_params = filter_and_sort_query_params(&url);
        if filtered_params.is_empty() {
            url.set_query(None);
        } else {
            let query_string = filtered_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("&");
            url.set_query(Some(&query_string));
        }
    }

    Ok(url)
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        return "/".to_string();
    }

    let segments: Vec<&str> = path.split('/').collect();
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in segments {
        match segment {
            // Skip empty segments (from multiple slashes) and current directory markers
            "" | "." => continue,
            // Parent directory - pop the last segment if possible
            ".." => {
                if !normalized_segments.is_empty() {
                    normalized_segments.pop();
                }
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    let result = format!("/{}", normalized_segments.join("/"));

    // Remove trailing slash unless it's the root
    if result.len() > 1 && result.ends_with('/') {
        result[..result.len() - 1].to_string()
    } else {
        result
    }
}

/// Filters out tracking parameters and sorts remaining query parameters
fn filter_and_sort_query_params(url: &Url) -> Vec<(String, String)> {
    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    params.sort_by(|a, b| a.0.cmp(&b.0));

    params
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    if TRACKING_PARAMS.contains(&key) {
        return true;
    }

    // Catch any utm parameter
    if key.starts_with("utm_") {
        return true;
    }

    false
}
