//! Crawl engine: target definition, frontier, rate limiting, retry
//! policy, the per-URL pipeline, and the orchestrator that drives them.

mod frontier;
mod limiter;
mod orchestrator;
mod pipeline;
mod retry;
mod target;

use async_trait::async_trait;

pub use frontier::{CrawlState, Frontier, SharedCrawlState};
pub use limiter::RateLimiter;
pub use orchestrator::CrawlOrchestrator;
pub use retry::{AttemptOutcome, RetryStrategy};
pub use target::CrawlTarget;

/// Resolves non-URL targets (package or project names) to a seed URL
///
/// An external collaborator, typically backed by a registry lookup or a
/// search engine. Consulted once per crawl, before any fetch; a
/// resolution failure aborts the crawl.
#[async_trait]
pub trait UrlDiscovery: Send + Sync {
    async fn resolve(&self, name: &str) -> crate::Result<String>;
}
