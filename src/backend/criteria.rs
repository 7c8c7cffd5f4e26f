//! Backend selection criteria

use regex::Regex;

use crate::url::{matches_wildcard, UrlInfo};
use crate::CrawlError;

/// Selection criteria attached to a backend at registration time
///
/// Read-only during a crawl. Empty lists mean "no restriction"; the
/// load and success-rate bounds are checked against live metrics at
/// selection time.
#[derive(Debug, Clone)]
pub struct BackendCriteria {
    /// Higher wins
    pub priority: i32,

    /// Content types this backend should handle (hint-matched)
    pub content_types: Vec<String>,

    /// Regexes the normalized URL must match (any)
    pub url_patterns: Vec<String>,

    /// Domain patterns, wildcard-capable (`*.example.com`)
    pub domains: Vec<String>,

    /// Reject the backend when its in-flight count exceeds this
    pub max_load: Option<usize>,

    /// Reject the backend when its recent success rate falls below this
    pub min_success_rate: Option<f64>,
}

impl Default for BackendCriteria {
    fn default() -> Self {
        BackendCriteria {
            priority: 0,
            content_types: Vec::new(),
            url_patterns: Vec::new(),
            domains: Vec::new(),
            max_load: None,
            min_success_rate: None,
        }
    }
}

impl BackendCriteria {
    pub fn with_priority(priority: i32) -> BackendCriteria {
        BackendCriteria {
            priority,
            ..Default::default()
        }
    }
}

/// Criteria with its URL regexes compiled once at registration
#[derive(Debug)]
pub(crate) struct CompiledCriteria {
    pub criteria: BackendCriteria,
    patterns: Vec<Regex>,
}

impl CompiledCriteria {
    pub fn compile(criteria: BackendCriteria) -> Result<CompiledCriteria, CrawlError> {
        let patterns = criteria
            .url_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| CrawlError::InvalidPattern {
                    pattern: p.clone(),
                    source: e,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CompiledCriteria { criteria, patterns })
    }

    /// Static match: URL patterns, domains, and content-type hint
    ///
    /// A missing hint passes the content-type check; the pipeline's
    /// response gate enforces the real content type after the fetch.
    pub fn matches(&self, info: &UrlInfo, content_type_hint: Option<&str>) -> bool {
        if !self.patterns.is_empty() && !self.patterns.iter().any(|re| re.is_match(&info.normalized))
        {
            return false;
        }

        if !self.criteria.domains.is_empty() {
            let host = match &info.host {
                Some(h) => h.as_str(),
                None => return false,
            };
            if !self
                .criteria
                .domains
                .iter()
                .any(|pattern| matches_wildcard(pattern, host))
            {
                return false;
            }
        }

        if let Some(hint) = content_type_hint {
            if !self.criteria.content_types.is_empty()
                && !self
                    .criteria
                    .content_types
                    .iter()
                    .any(|ct| hint.contains(ct.as_str()))
            {
                return false;
            }
        }

        true
    }
}
