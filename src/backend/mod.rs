//! Pluggable fetch backends
//!
//! A backend is an opaque fetch capability behind the [`Backend`] trait.
//! The registry pairs each implementation with [`BackendCriteria`] at
//! registration time and ranks matching candidates per URL. Two basic
//! backends ship with the crate: a plain HTTP client and a static-file
//! reader. Headless-browser and search-backed strategies plug in through
//! the same trait from outside.

mod criteria;
mod file;
mod http;
mod selector;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::url::UrlInfo;
use crate::BackendError;

pub use criteria::BackendCriteria;
pub use file::FileBackend;
pub use http::HttpBackend;
pub use selector::{BackendMetrics, BackendRegistry, SelectedBackend};

/// Per-fetch settings passed down to backends
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Bound on a single fetch attempt
    pub request_timeout: Duration,

    /// User agent presented to remote servers
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            request_timeout: Duration::from_secs(30),
            user_agent: format!("docharvest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Raw fetch result returned by a backend
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// HTTP-style status code (file backends synthesize 200)
    pub status: u16,

    /// Final URL after redirects, when it differs from the request URL
    pub final_url: Option<String>,

    /// Response body
    pub content: String,

    /// Content-Type header value, if any
    pub content_type: Option<String>,

    /// Backend-specific response metadata
    pub metadata: HashMap<String, String>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A pluggable fetch strategy
///
/// Implementations must be cheap to share (`Arc`) and safe to call from
/// many pipeline tasks at once. The engine never retries inside a
/// backend; retry policy lives in the pipeline.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetches the URL, bounded by `config.request_timeout`
    async fn fetch(
        &self,
        info: &UrlInfo,
        config: &FetchConfig,
    ) -> Result<FetchResponse, BackendError>;

    /// Cheap pre-flight check that this backend can serve the URL
    ///
    /// Criteria matching happens in the registry; this hook covers
    /// conditions only the backend itself can see (e.g. a file path
    /// that does not exist). Defaults to accepting everything.
    async fn validate(&self, _info: &UrlInfo) -> bool {
        true
    }

    /// Releases held resources; called once when the registry shuts down
    async fn close(&self) {}
}
