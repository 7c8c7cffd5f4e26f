//! In-scope predicate for discovered URLs
//!
//! The filter decides whether a URL belongs to a crawl target. It is a
//! pure function of `(url info, target, visited set)`: the regexes are
//! compiled once at construction and no state is mutated by a check, so
//! concurrent pipeline tasks can share one filter.

use std::collections::HashSet;

use regex::Regex;

use crate::crawler::CrawlTarget;
use crate::url::{same_registered_domain, UrlInfo};
use crate::CrawlError;

/// Compiled in-scope filter for one crawl target
#[derive(Debug)]
pub struct UrlFilter {
    follow_external: bool,
    seed_host: Option<String>,
    seed_scheme: String,
    /// Directory containing the seed, for `file://` containment checks
    seed_base_path: String,
    exclude: Vec<Regex>,
    include: Vec<Regex>,
    allowed_paths: Vec<String>,
    excluded_paths: Vec<String>,
}

impl UrlFilter {
    /// Builds a filter for `target`, anchored at the resolved seed URL
    ///
    /// Fails only when an include/exclude pattern does not compile.
    pub fn new(target: &CrawlTarget, seed: &UrlInfo) -> Result<UrlFilter, CrawlError> {
        let exclude = compile_patterns(&target.exclude_patterns)?;
        let include = compile_patterns(&target.include_patterns)?;

        let seed_base_path = match seed.path.rfind('/') {
            Some(idx) => seed.path[..=idx].to_string(),
            None => "/".to_string(),
        };

        Ok(UrlFilter {
            follow_external: target.follow_external,
            seed_host: seed.host.clone(),
            seed_scheme: seed.scheme.clone(),
            seed_base_path,
            exclude,
            include,
            allowed_paths: target.allowed_paths.clone(),
            excluded_paths: target.excluded_paths.clone(),
        })
    }

    /// Decides whether a URL is in scope for this crawl
    ///
    /// Checks are ordered and short-circuiting:
    /// 1. invalid URLs are rejected
    /// 2. already-visited URLs are rejected
    /// 3. schemes outside {http, https, file} are rejected
    /// 4. with `follow_external == false`, the URL must stay on the
    ///    seed's registered domain (any subdomain, and an http→https
    ///    upgrade counts as internal); `file` URLs must stay under the
    ///    seed's base directory
    /// 5. any exclude pattern match rejects (exclude always wins)
    /// 6. with include patterns present, at least one must match
    /// 7. with allowed paths present, the path must start with one
    /// 8. any excluded path prefix rejects
    pub fn should_crawl(&self, info: &UrlInfo, visited: &HashSet<String>) -> bool {
        if !info.is_valid {
            tracing::trace!("Rejecting invalid URL: {}", info.raw);
            return false;
        }

        if visited.contains(&info.normalized) {
            return false;
        }

        if !matches!(info.scheme.as_str(), "http" | "https" | "file") {
            return false;
        }

        if !self.follow_external && !self.is_internal(info) {
            tracing::trace!("Rejecting external URL: {}", info.normalized);
            return false;
        }

        if self.exclude.iter().any(|re| re.is_match(&info.normalized)) {
            tracing::trace!("Rejecting excluded URL: {}", info.normalized);
            return false;
        }

        if !self.include.is_empty() && !self.include.iter().any(|re| re.is_match(&info.normalized))
        {
            return false;
        }

        if !self.allowed_paths.is_empty()
            && !self.allowed_paths.iter().any(|p| info.path.starts_with(p))
        {
            return false;
        }

        if self.excluded_paths.iter().any(|p| info.path.starts_with(p)) {
            return false;
        }

        true
    }

    /// Same-site classification relative to the seed
    fn is_internal(&self, info: &UrlInfo) -> bool {
        if self.seed_scheme == "file" || info.scheme == "file" {
            // File URLs are internal only to a file seed, and must stay
            // within the seed's directory tree
            return self.seed_scheme == "file"
                && info.scheme == "file"
                && info.path.starts_with(&self.seed_base_path);
        }

        match (&self.seed_host, &info.host) {
            // Covers subdomains and http→https upgrades alike: only the
            // registered domain matters
            (Some(seed), Some(candidate)) => same_registered_domain(seed, candidate),
            _ => false,
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Regex>, CrawlError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| CrawlError::InvalidPattern {
                pattern: p.clone(),
                source: e,
            })
        })
        .collect()
}
