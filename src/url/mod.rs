//! URL handling module for DocHarvest
//!
//! This module provides URL normalization, registered-domain extraction,
//! wildcard matching, the parsed [`UrlInfo`] form used throughout the
//! crawl engine, and the in-scope filter applied to discovered links.

mod domain;
mod filter;
mod matcher;
mod normalize;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use url::Url;

use crate::UrlError;

// Re-export main functions
pub use domain::{registered_domain, same_registered_domain};
pub use filter::UrlFilter;
pub use matcher::matches_wildcard;
pub use normalize::normalize_url;

/// Parsed and normalized form of a URL
///
/// Computed once per raw URL and immutable afterwards. Invalid URLs are
/// not an error at this layer: the validity flag and reason are carried
/// so the filter can reject them without unwinding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlInfo {
    /// The raw string this info was computed from
    pub raw: String,

    /// Canonical string form used for visited-set deduplication
    pub normalized: String,

    /// URL scheme (lowercase)
    pub scheme: String,

    /// Full host, if any
    pub host: Option<String>,

    /// Registered domain (eTLD+1) of the host, if any
    pub domain: Option<String>,

    /// URL path component
    pub path: String,

    /// Whether the raw string parsed and normalized successfully
    pub is_valid: bool,

    /// Reason the URL is invalid, when it is
    pub error: Option<String>,
}

impl UrlInfo {
    /// Parses and normalizes a raw URL string
    ///
    /// Never fails: malformed input yields an info with `is_valid == false`
    /// and the parse error recorded.
    pub fn parse(raw: &str) -> UrlInfo {
        match normalize_url(raw) {
            Ok(url) => {
                let host = url.host_str().map(|h| h.to_string());
                let domain = host.as_deref().map(domain::registered_domain);
                UrlInfo {
                    raw: raw.to_string(),
                    normalized: url.as_str().to_string(),
                    scheme: url.scheme().to_string(),
                    host,
                    domain,
                    path: url.path().to_string(),
                    is_valid: true,
                    error: None,
                }
            }
            Err(e) => UrlInfo {
                raw: raw.to_string(),
                normalized: raw.to_string(),
                scheme: String::new(),
                host: None,
                domain: None,
                path: String::new(),
                is_valid: false,
                error: Some(e.to_string()),
            },
        }
    }

    /// Reparses the normalized form into a [`Url`]
    pub fn as_url(&self) -> Result<Url, UrlError> {
        if !self.is_valid {
            return Err(UrlError::Malformed(self.raw.clone()));
        }
        Url::parse(&self.normalized).map_err(|e| UrlError::Parse(e.to_string()))
    }
}

/// Per-crawl memoization of [`UrlInfo::parse`]
///
/// Discovered links repeat heavily within one crawl; the cache keeps the
/// normalization cost to one pass per distinct raw string. Safe to share
/// across concurrently running pipeline tasks.
#[derive(Debug, Default)]
pub struct UrlInfoCache {
    inner: Mutex<HashMap<String, Arc<UrlInfo>>>,
}

impl UrlInfoCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached info for `raw`, computing it on first use
    pub fn get(&self, raw: &str) -> Arc<UrlInfo> {
        let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(info) = map.get(raw) {
            return Arc::clone(info);
        }
        let info = Arc::new(UrlInfo::parse(raw));
        map.insert(raw.to_string(), Arc::clone(&info));
        info
    }

    /// Number of distinct raw URLs seen so far
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
