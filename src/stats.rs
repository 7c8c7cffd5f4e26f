//! Crawl statistics and result assembly
//!
//! [`CrawlStats`] counters are mutated incrementally behind the crawl
//! state lock while pipeline tasks run, and finalized exactly once when
//! the orchestrator reaches its terminal state. [`CrawlResult`] is the
//! immutable value handed back to the caller.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::crawler::CrawlTarget;
use crate::processor::{CorpusStructure, QualityIssue};

/// Incrementally updated counters for one crawl invocation
#[derive(Debug, Clone)]
pub struct CrawlStats {
    /// Wall-clock time the crawl started
    pub start_time: DateTime<Utc>,

    /// Wall-clock time the crawl finished; set by `finalize`
    pub end_time: Option<DateTime<Utc>>,

    /// Pages that produced a document
    pub pages_crawled: u64,

    /// Fetch-and-process runs that completed successfully
    pub successful_crawls: u64,

    /// Fetch-and-process runs that terminally failed
    pub failed_crawls: u64,

    /// Total crawl duration; set by `finalize`
    pub total_time: Duration,

    /// `total_time / pages_crawled`, zero when nothing was crawled
    pub average_time_per_page: Duration,

    /// Total quality findings across all documents
    pub quality_issues: u64,

    /// Bytes of raw content handed to the processor
    pub bytes_processed: u64,
}

impl CrawlStats {
    pub fn new() -> Self {
        CrawlStats {
            start_time: Utc::now(),
            end_time: None,
            pages_crawled: 0,
            successful_crawls: 0,
            failed_crawls: 0,
            total_time: Duration::ZERO,
            average_time_per_page: Duration::ZERO,
            quality_issues: 0,
            bytes_processed: 0,
        }
    }

    /// Closes out the stats with the measured crawl duration
    ///
    /// Called once when the orchestrator reaches its terminal state.
    pub fn finalize(&mut self, elapsed: Duration) {
        self.end_time = Some(Utc::now());
        self.total_time = elapsed;
        self.average_time_per_page = if self.pages_crawled > 0 {
            Duration::from_secs_f64(elapsed.as_secs_f64() / self.pages_crawled as f64)
        } else {
            Duration::ZERO
        };
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A document produced by the crawl, in completion order
#[derive(Debug, Clone)]
pub struct CrawlDocument {
    /// Identifier assigned by the document organizer
    pub doc_id: String,

    /// Final (post-redirect) normalized URL the document came from
    pub url: String,

    /// Document title, if the processor extracted one
    pub title: Option<String>,
}

/// Final result of one `crawl()` call
///
/// Created fresh per call and immutable once returned. `documents`
/// reflects completion order, not discovery order.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// The target this crawl was run against
    pub target: CrawlTarget,

    /// Finalized statistics
    pub stats: CrawlStats,

    /// Documents in completion order
    pub documents: Vec<CrawlDocument>,

    /// Quality findings keyed by URL
    pub issues: HashMap<String, Vec<QualityIssue>>,

    /// Quality metrics keyed by URL
    pub metrics: HashMap<String, HashMap<String, f64>>,

    /// URLs successfully crawled, in completion order
    pub crawled_urls: Vec<String>,

    /// URLs that terminally failed
    pub failed_urls: Vec<String>,

    /// Failure detail keyed by URL
    pub errors: HashMap<String, String>,

    /// Corpus summary provided by the document organizer
    pub structure: Option<CorpusStructure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalize_sets_end_time_and_average() {
        let mut stats = CrawlStats::new();
        stats.pages_crawled = 4;
        stats.finalize(Duration::from_secs(8));

        assert!(stats.end_time.is_some());
        assert_eq!(stats.total_time, Duration::from_secs(8));
        assert_eq!(stats.average_time_per_page, Duration::from_secs(2));
    }

    #[test]
    fn test_finalize_average_beyond_u32_pages() {
        let mut stats = CrawlStats::new();
        stats.pages_crawled = 5_000_000_000; // exceeds u32::MAX
        stats.finalize(Duration::from_secs(10));

        assert_eq!(stats.average_time_per_page, Duration::from_nanos(2));
    }

    #[test]
    fn test_finalize_with_zero_pages() {
        let mut stats = CrawlStats::new();
        stats.finalize(Duration::from_secs(5));

        assert_eq!(stats.average_time_per_page, Duration::ZERO);
    }
}
