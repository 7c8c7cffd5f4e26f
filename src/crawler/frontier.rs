//! Frontier worklist and shared per-crawl state
//!
//! The frontier is a FIFO of `(normalized url, depth)` pairs owned by
//! the orchestrator's dispatch loop; FIFO order gives approximate BFS
//! with no ordering guarantee among same-depth entries. [`CrawlState`]
//! holds everything pipeline tasks mutate concurrently - the visited
//! set, statistics counters, and result accumulators - behind a single
//! mutex so redirect reconciliation and counting stay race-free.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::processor::QualityIssue;
use crate::stats::{CrawlDocument, CrawlStats};

/// FIFO worklist of not-yet-fetched URLs
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<(String, u32)>,
}

impl Frontier {
    pub fn new() -> Frontier {
        Frontier::default()
    }

    /// Enqueues a normalized URL at the given depth
    pub fn push(&mut self, url: String, depth: u32) {
        self.queue.push_back((url, depth));
    }

    /// Dequeues the oldest entry
    pub fn pop(&mut self) -> Option<(String, u32)> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Mutable state scoped to one `crawl()` call
///
/// Exclusively owned by the orchestrator and mutated only through the
/// surrounding mutex, even though multiple pipeline tasks run
/// concurrently. Not instance-global: one orchestrator can run several
/// crawls at once, each with its own state.
#[derive(Debug)]
pub struct CrawlState {
    /// Normalized URLs already scheduled or reached via redirect
    pub visited: HashSet<String>,

    pub stats: CrawlStats,

    /// Documents in completion order
    pub documents: Vec<CrawlDocument>,

    /// Quality findings keyed by URL
    pub issues: HashMap<String, Vec<QualityIssue>>,

    /// Quality metrics keyed by URL
    pub metrics: HashMap<String, HashMap<String, f64>>,

    pub crawled_urls: Vec<String>,
    pub failed_urls: Vec<String>,

    /// Terminal failure detail keyed by URL
    pub errors: HashMap<String, String>,
}

/// The single serialization point shared by pipeline tasks
pub type SharedCrawlState = Arc<Mutex<CrawlState>>;

impl CrawlState {
    pub fn new() -> CrawlState {
        CrawlState {
            visited: HashSet::new(),
            stats: CrawlStats::new(),
            documents: Vec::new(),
            issues: HashMap::new(),
            metrics: HashMap::new(),
            crawled_urls: Vec::new(),
            failed_urls: Vec::new(),
            errors: HashMap::new(),
        }
    }

    /// Marks a URL visited; returns false if it already was
    pub fn mark_visited(&mut self, normalized: &str) -> bool {
        self.visited.insert(normalized.to_string())
    }

    /// Records a successfully processed page
    pub fn record_success(&mut self, url: &str, document: CrawlDocument, content_bytes: usize) {
        self.stats.successful_crawls += 1;
        self.stats.pages_crawled += 1;
        self.stats.bytes_processed += content_bytes as u64;
        self.crawled_urls.push(url.to_string());
        self.documents.push(document);
    }

    /// Records a terminal per-URL failure
    pub fn record_failure(&mut self, url: &str, error: String) {
        self.stats.failed_crawls += 1;
        self.failed_urls.push(url.to_string());
        self.errors.insert(url.to_string(), error);
    }

    /// Merges quality findings for a URL
    pub fn record_quality(
        &mut self,
        url: &str,
        issues: Vec<QualityIssue>,
        metrics: HashMap<String, f64>,
    ) {
        self.stats.quality_issues += issues.len() as u64;
        if !issues.is_empty() {
            self.issues.entry(url.to_string()).or_default().extend(issues);
        }
        if !metrics.is_empty() {
            self.metrics.entry(url.to_string()).or_default().extend(metrics);
        }
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::IssueSeverity;

    #[test]
    fn test_frontier_fifo_order() {
        let mut frontier = Frontier::new();
        frontier.push("https://example.com/a".to_string(), 0);
        frontier.push("https://example.com/b".to_string(), 1);

        assert_eq!(frontier.len(), 2);
        assert_eq!(
            frontier.pop(),
            Some(("https://example.com/a".to_string(), 0))
        );
        assert_eq!(
            frontier.pop(),
            Some(("https://example.com/b".to_string(), 1))
        );
        assert!(frontier.is_empty());
    }

    #[test]
    fn test_mark_visited_dedup() {
        let mut state = CrawlState::new();
        assert!(state.mark_visited("https://example.com/page"));
        assert!(!state.mark_visited("https://example.com/page"));
    }

    #[test]
    fn test_record_success_updates_counters() {
        let mut state = CrawlState::new();
        state.record_success(
            "https://example.com/doc",
            CrawlDocument {
                doc_id: "doc-1".to_string(),
                url: "https://example.com/doc".to_string(),
                title: Some("Doc".to_string()),
            },
            1024,
        );

        assert_eq!(state.stats.successful_crawls, 1);
        assert_eq!(state.stats.pages_crawled, 1);
        assert_eq!(state.stats.bytes_processed, 1024);
        assert_eq!(state.documents.len(), 1);
        assert_eq!(state.crawled_urls, vec!["https://example.com/doc"]);
    }

    #[test]
    fn test_record_failure_keyed_by_url() {
        let mut state = CrawlState::new();
        state.record_failure("https://example.com/bad", "HTTP 404".to_string());

        assert_eq!(state.stats.failed_crawls, 1);
        assert_eq!(state.failed_urls, vec!["https://example.com/bad"]);
        assert_eq!(
            state.errors.get("https://example.com/bad").map(String::as_str),
            Some("HTTP 404")
        );
    }

    #[test]
    fn test_record_quality_merges() {
        let mut state = CrawlState::new();
        let issue = QualityIssue {
            severity: IssueSeverity::Warning,
            message: "missing title".to_string(),
        };
        let mut metrics = HashMap::new();
        metrics.insert("word_count".to_string(), 42.0);

        state.record_quality("https://example.com/doc", vec![issue], metrics);

        assert_eq!(state.stats.quality_issues, 1);
        assert_eq!(state.issues["https://example.com/doc"].len(), 1);
        assert_eq!(state.metrics["https://example.com/doc"]["word_count"], 42.0);
    }
}
