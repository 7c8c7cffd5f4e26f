//! Crawl target definition

use std::collections::HashMap;

use crate::CrawlError;

/// Parameters describing one crawl
///
/// The target is immutable once a crawl starts; per-crawl mutable state
/// lives in the crawl context, never here. All scoping parameters are
/// explicit at this layer; defaulting belongs to the caller or the
/// configuration layer.
#[derive(Debug, Clone)]
pub struct CrawlTarget {
    /// Seed URL, or a package/project name for the discovery collaborator
    pub url: String,

    /// Maximum link depth from the seed (0 = seed only)
    pub depth: u32,

    /// Whether links outside the seed's registered domain are in scope
    pub follow_external: bool,

    /// Content types accepted by the pipeline's response gate
    pub content_types: Vec<String>,

    /// Regexes that reject a URL; exclude always wins over include
    pub exclude_patterns: Vec<String>,

    /// Regexes a URL must match (at least one) when non-empty
    pub include_patterns: Vec<String>,

    /// Upper bound on pages crawled
    pub max_pages: u32,

    /// Path prefixes a URL must start with (one of) when non-empty
    pub allowed_paths: Vec<String>,

    /// Path prefixes that reject a URL
    pub excluded_paths: Vec<String>,

    /// Free-form metadata forwarded to the document organizer
    pub metadata: HashMap<String, String>,
}

impl CrawlTarget {
    /// Creates a target with the given seed and depth
    ///
    /// Other fields start at their neutral values: HTML-only content,
    /// no pattern or path restrictions, internal links only, and a
    /// generous page cap.
    pub fn new(url: &str, depth: u32) -> CrawlTarget {
        CrawlTarget {
            url: url.to_string(),
            depth,
            follow_external: false,
            content_types: vec!["text/html".to_string()],
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            max_pages: 1000,
            allowed_paths: Vec::new(),
            excluded_paths: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    /// Checks target invariants before a crawl starts
    pub fn validate(&self) -> Result<(), CrawlError> {
        if self.url.trim().is_empty() {
            return Err(CrawlError::InvalidTarget("empty target URL".to_string()));
        }
        if self.max_pages == 0 {
            return Err(CrawlError::InvalidTarget(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.content_types.is_empty() {
            return Err(CrawlError::InvalidTarget(
                "content_types must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
