//! Per-URL fetch-and-process pipeline
//!
//! The critical path for one discovered URL: acquire a concurrency slot,
//! pass the rate limiter, fetch through the selected backend with
//! retries, reconcile redirects against the visited set, gate on content
//! type, then hand off to the content processor, quality checker, and
//! document organizer before extracting candidate links.
//!
//! Failures here never escape: every terminal condition is recorded in
//! the shared crawl state and the task returns whatever links it found
//! (none, on failure). Only the orchestrator decides when a crawl dies.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::backend::{BackendRegistry, FetchConfig, FetchResponse};
use crate::crawler::frontier::SharedCrawlState;
use crate::crawler::retry::{AttemptOutcome, RetryStrategy};
use crate::crawler::RateLimiter;
use crate::processor::{
    extract_links, ContentProcessor, DocumentOrganizer, QualityChecker, QualityContext,
};
use crate::stats::CrawlDocument;
use crate::url::{UrlInfo, UrlInfoCache};
use crate::BackendError;

/// Everything a pipeline task needs, shared across the crawl
pub(crate) struct Pipeline {
    pub registry: Arc<BackendRegistry>,
    pub processor: Arc<dyn ContentProcessor>,
    pub quality: Arc<dyn QualityChecker>,
    pub organizer: Arc<dyn DocumentOrganizer>,
    pub limiter: Arc<RateLimiter>,
    pub retry: RetryStrategy,
    pub fetch_config: FetchConfig,
    pub semaphore: Arc<Semaphore>,
    pub state: SharedCrawlState,
    pub cache: Arc<UrlInfoCache>,
    /// Accepted content types from the crawl target
    pub content_types: Vec<String>,
    /// Target metadata forwarded to the organizer
    pub target_metadata: HashMap<String, String>,
}

impl Pipeline {
    /// Runs the full pipeline for one URL, returning discovered links
    pub(crate) async fn fetch_and_process(
        self: Arc<Self>,
        url: String,
        depth: u32,
    ) -> Vec<(String, u32)> {
        let _permit = match self.semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return Vec::new(),
        };

        let waited = self.limiter.acquire().await;
        if waited > Duration::ZERO {
            tracing::trace!("Rate limiter held {} for {:?}", url, waited);
        }

        let info = self.cache.get(&url);

        let hint = self.content_types.first().map(String::as_str);
        let selected = match self.registry.select(&info, hint) {
            Ok(selected) => selected,
            Err(e) => {
                tracing::warn!("No backend for {}: {}", info.normalized, e);
                self.record_failure(&info.normalized, e.to_string());
                return Vec::new();
            }
        };

        if !selected.backend.validate(&info).await {
            self.record_failure(
                &info.normalized,
                format!("Backend '{}' cannot serve this URL", selected.name),
            );
            return Vec::new();
        }

        tracing::debug!(
            "Fetching {} (depth {}) via '{}'",
            info.normalized,
            depth,
            selected.name
        );

        selected.metrics.record_start();
        let fetched = self.fetch_with_retry(&info, &selected.backend).await;

        let response = match fetched {
            Ok(response) => {
                selected.metrics.record_success();
                response
            }
            Err(e) => {
                selected.metrics.record_failure();
                tracing::debug!("Fetch failed for {}: {}", info.normalized, e);
                self.record_failure(&info.normalized, e.to_string());
                return Vec::new();
            }
        };

        // Redirect reconciliation: a fetch that converged on an
        // already-visited final URL must not produce a second document.
        let final_info = match &response.final_url {
            Some(final_url) => self.cache.get(final_url),
            None => Arc::clone(&info),
        };
        if !final_info.is_valid {
            self.record_failure(
                &info.normalized,
                format!("Redirected to unusable URL: {}", final_info.raw),
            );
            return Vec::new();
        }
        if final_info.normalized != info.normalized {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if !state.mark_visited(&final_info.normalized) {
                tracing::debug!(
                    "Discarding {}: redirect target {} already visited",
                    info.normalized,
                    final_info.normalized
                );
                return Vec::new();
            }
        }

        // Content-type gate: a mismatch is neither a success nor a
        // failure, and does not count toward the page limit.
        let content_type = response.content_type.as_deref().unwrap_or("");
        if !self
            .content_types
            .iter()
            .any(|accepted| content_type.contains(accepted.as_str()))
        {
            tracing::debug!(
                "Skipping {}: content type '{}' not accepted",
                final_info.normalized,
                content_type
            );
            return Vec::new();
        }

        let base_url = match final_info.as_url() {
            Ok(u) => u,
            Err(e) => {
                self.record_failure(&final_info.normalized, e.to_string());
                return Vec::new();
            }
        };

        let processed = match self.processor.process(&response.content, &base_url).await {
            Ok(processed) => processed,
            Err(e) => {
                self.record_failure(
                    &final_info.normalized,
                    format!("Processing error: {}", e),
                );
                return Vec::new();
            }
        };

        let context = QualityContext {
            url: final_info.normalized.clone(),
            content_type: response.content_type.clone(),
        };
        let (issues, metrics) = match self.quality.check_quality(&processed, &context).await {
            Ok(findings) => findings,
            Err(e) => {
                self.record_failure(
                    &final_info.normalized,
                    format!("Quality check error: {}", e),
                );
                return Vec::new();
            }
        };

        let mut doc_metadata = self.target_metadata.clone();
        doc_metadata.insert("url".to_string(), final_info.normalized.clone());
        if let Some(ct) = &response.content_type {
            doc_metadata.insert("content_type".to_string(), ct.clone());
        }
        let doc_id = match self.organizer.add_document(&processed, &doc_metadata).await {
            Ok(id) => id,
            Err(e) => {
                self.record_failure(
                    &final_info.normalized,
                    format!("Organizer error: {}", e),
                );
                return Vec::new();
            }
        };

        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            state.record_quality(&final_info.normalized, issues, metrics);
            state.record_success(
                &final_info.normalized,
                CrawlDocument {
                    doc_id,
                    url: final_info.normalized.clone(),
                    title: processed.title.clone(),
                },
                response.content.len(),
            );
        }

        extract_links(&processed.structure, &base_url, depth)
    }

    /// Retried fetch, each attempt individually bounded by the timeout
    async fn fetch_with_retry(
        &self,
        info: &UrlInfo,
        backend: &Arc<dyn crate::backend::Backend>,
    ) -> Result<FetchResponse, BackendError> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = match tokio::time::timeout(
                self.fetch_config.request_timeout,
                backend.fetch(info, &self.fetch_config),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(BackendError::Timeout {
                    url: info.normalized.clone(),
                }),
            };

            match AttemptOutcome::classify(result, &info.normalized) {
                AttemptOutcome::Success(response) => return Ok(response),
                AttemptOutcome::Transient(e) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::debug!(
                        "Transient failure for {} (attempt {}/{}), retrying in {:?}: {}",
                        info.normalized,
                        attempt,
                        self.retry.max_retries,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
                AttemptOutcome::Transient(e) | AttemptOutcome::Permanent(e) => return Err(e),
            }
        }
    }

    fn record_failure(&self, url: &str, error: String) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.record_failure(url, error);
    }
}
