//! Crawl orchestrator
//!
//! Owns the dispatch loop: resolves the seed, builds the per-crawl
//! state, and moves through the phases init -> running -> draining ->
//! done. During `running` it dispatches frontier entries in batches
//! bounded by the concurrency limit and the remaining page budget;
//! `draining` is the await of in-flight tasks after the frontier empties
//! or the crawl is cancelled. The orchestrator itself holds no per-crawl
//! state, so one instance can serve several concurrent crawls.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;

use crate::backend::{BackendRegistry, FetchConfig};
use crate::config::Config;
use crate::crawler::frontier::{CrawlState, Frontier, SharedCrawlState};
use crate::crawler::pipeline::Pipeline;
use crate::crawler::retry::RetryStrategy;
use crate::crawler::{CrawlTarget, RateLimiter, UrlDiscovery};
use crate::processor::{ContentProcessor, DocumentOrganizer, QualityChecker};
use crate::stats::CrawlResult;
use crate::url::{UrlFilter, UrlInfo, UrlInfoCache};
use crate::{CrawlError, Result};

/// Drives crawls against a set of registered backends
///
/// Construction wires in the pluggable collaborators; each `crawl()`
/// call then runs independently with its own frontier and state.
pub struct CrawlOrchestrator {
    config: Config,
    registry: Arc<BackendRegistry>,
    processor: Arc<dyn ContentProcessor>,
    quality: Arc<dyn QualityChecker>,
    organizer: Arc<dyn DocumentOrganizer>,
    discovery: Option<Arc<dyn UrlDiscovery>>,
}

impl CrawlOrchestrator {
    pub fn new(
        config: Config,
        registry: Arc<BackendRegistry>,
        processor: Arc<dyn ContentProcessor>,
        quality: Arc<dyn QualityChecker>,
        organizer: Arc<dyn DocumentOrganizer>,
    ) -> CrawlOrchestrator {
        CrawlOrchestrator {
            config,
            registry,
            processor,
            quality,
            organizer,
            discovery: None,
        }
    }

    /// Attaches a collaborator that resolves non-URL targets to seeds
    pub fn with_discovery(mut self, discovery: Arc<dyn UrlDiscovery>) -> CrawlOrchestrator {
        self.discovery = Some(discovery);
        self
    }

    /// Runs a crawl to completion
    pub async fn crawl(&self, target: &CrawlTarget) -> Result<CrawlResult> {
        let (_tx, rx) = watch::channel(false);
        self.crawl_with_cancel(target, rx).await
    }

    /// Runs a crawl that can be cancelled between dispatch batches
    ///
    /// Setting the watch value to `true` stops new dispatches; tasks
    /// already in flight finish and their results are included in the
    /// returned partial result.
    pub async fn crawl_with_cancel(
        &self,
        target: &CrawlTarget,
        cancel: watch::Receiver<bool>,
    ) -> Result<CrawlResult> {
        target.validate()?;

        let started = Instant::now();
        let cache = Arc::new(UrlInfoCache::new());

        let seed = self.resolve_seed(&target.url, &cache).await?;
        tracing::info!(
            "Starting crawl of {} (depth {}, max {} pages)",
            seed.normalized,
            target.depth,
            target.max_pages
        );

        let filter = UrlFilter::new(target, &seed)?;

        // A target no registered backend can serve is fatal up front;
        // per-URL selection failures later are recorded, not raised.
        let hint = target.content_types.first().map(String::as_str);
        self.registry.select(&seed, hint)?;

        let crawler = &self.config.crawler;
        let state: SharedCrawlState = Arc::new(Mutex::new(CrawlState::new()));
        let pipeline = Arc::new(Pipeline {
            registry: Arc::clone(&self.registry),
            processor: Arc::clone(&self.processor),
            quality: Arc::clone(&self.quality),
            organizer: Arc::clone(&self.organizer),
            limiter: Arc::new(RateLimiter::new(
                crawler.rate_limit_secs,
                crawler.rate_burst,
            )),
            retry: RetryStrategy::new(
                crawler.max_retries,
                std::time::Duration::from_millis(crawler.retry_base_delay_ms),
                std::time::Duration::from_millis(crawler.retry_max_delay_ms),
            ),
            fetch_config: FetchConfig {
                request_timeout: std::time::Duration::from_secs(crawler.request_timeout_secs),
                user_agent: self.config.user_agent.full_agent(),
            },
            semaphore: Arc::new(Semaphore::new(crawler.concurrent_requests as usize)),
            state: Arc::clone(&state),
            cache: Arc::clone(&cache),
            content_types: target.content_types.clone(),
            target_metadata: target.metadata.clone(),
        });

        let mut frontier = Frontier::new();
        frontier.push(seed.normalized.clone(), 0);

        self.run_dispatch_loop(target, &filter, &mut frontier, &pipeline, &state, cancel)
            .await;

        // Done: close out the corpus and assemble the result
        let structure = match self.organizer.organize().await {
            Ok(structure) => Some(structure),
            Err(e) => {
                tracing::warn!("Organizer failed to summarize corpus: {}", e);
                None
            }
        };

        let result = {
            let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
            guard.stats.finalize(started.elapsed());
            CrawlResult {
                target: target.clone(),
                stats: guard.stats.clone(),
                documents: guard.documents.clone(),
                issues: guard.issues.clone(),
                metrics: guard.metrics.clone(),
                crawled_urls: guard.crawled_urls.clone(),
                failed_urls: guard.failed_urls.clone(),
                errors: guard.errors.clone(),
                structure,
            }
        };

        tracing::info!(
            "Crawl finished: {} pages, {} failures, {} quality findings in {:.2}s",
            result.stats.pages_crawled,
            result.stats.failed_crawls,
            result.stats.quality_issues,
            result.stats.total_time.as_secs_f64()
        );

        Ok(result)
    }

    /// Batch dispatch until the frontier drains, the page budget is
    /// spent, or the crawl is cancelled
    async fn run_dispatch_loop(
        &self,
        target: &CrawlTarget,
        filter: &UrlFilter,
        frontier: &mut Frontier,
        pipeline: &Arc<Pipeline>,
        state: &SharedCrawlState,
        cancel: watch::Receiver<bool>,
    ) {
        while !frontier.is_empty() {
            if *cancel.borrow() {
                tracing::info!(
                    "Crawl cancelled with {} URLs still queued",
                    frontier.len()
                );
                break;
            }

            let pages_crawled = {
                let guard = state.lock().unwrap_or_else(|e| e.into_inner());
                guard.stats.pages_crawled
            };
            if pages_crawled >= u64::from(target.max_pages) {
                tracing::info!("Page limit of {} reached", target.max_pages);
                break;
            }

            // Never put more work in flight than can still count toward
            // the page limit.
            let remaining = u64::from(target.max_pages) - pages_crawled;
            let budget = remaining.min(u64::from(self.config.crawler.concurrent_requests)) as usize;

            let mut tasks: JoinSet<Vec<(String, u32)>> = JoinSet::new();
            while tasks.len() < budget {
                let Some((url, depth)) = frontier.pop() else {
                    break;
                };
                if depth > target.depth {
                    continue;
                }
                {
                    let mut guard = state.lock().unwrap_or_else(|e| e.into_inner());
                    if !guard.mark_visited(&url) {
                        continue;
                    }
                }
                tasks.spawn(Arc::clone(pipeline).fetch_and_process(url, depth));
            }

            if tasks.is_empty() {
                break;
            }

            // Draining: the batch runs to completion even if cancellation
            // arrives meanwhile.
            let mut discovered: Vec<(String, u32)> = Vec::new();
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(links) => discovered.extend(links),
                    Err(e) => tracing::error!("Pipeline task panicked: {}", e),
                }
            }

            let guard = state.lock().unwrap_or_else(|e| e.into_inner());
            for (url, depth) in discovered {
                if depth > target.depth {
                    continue;
                }
                let info = pipeline.cache.get(&url);
                if filter.should_crawl(&info, &guard.visited) {
                    frontier.push(info.normalized.clone(), depth);
                }
            }
        }
    }

    /// Turns the target's `url` field into a usable seed
    ///
    /// A string that parses as a URL is used directly; otherwise the
    /// discovery collaborator is consulted once. Without one, a non-URL
    /// target is a fatal error.
    async fn resolve_seed(&self, raw: &str, cache: &UrlInfoCache) -> Result<Arc<UrlInfo>> {
        let info = cache.get(raw);
        if info.is_valid {
            return Ok(info);
        }

        let Some(discovery) = &self.discovery else {
            return Err(CrawlError::Discovery {
                target: raw.to_string(),
                reason: "not a valid URL and no discovery collaborator is configured".to_string(),
            });
        };

        tracing::info!("Resolving target '{}' via discovery", raw);
        let resolved = discovery
            .resolve(raw)
            .await
            .map_err(|e| CrawlError::Discovery {
                target: raw.to_string(),
                reason: e.to_string(),
            })?;

        let info = cache.get(&resolved);
        if !info.is_valid {
            return Err(CrawlError::Discovery {
                target: raw.to_string(),
                reason: format!("discovery returned unusable URL '{}'", resolved),
            });
        }
        Ok(info)
    }
}
