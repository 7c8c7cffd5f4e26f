//! DocHarvest: a documentation crawl orchestration engine
//!
//! This crate implements the stateful core of a documentation retrieval
//! system: it manages a URL frontier, filters and deduplicates discovered
//! links, dispatches fetches to pluggable backends under concurrency and
//! rate constraints, retries transient failures, and assembles a final
//! result with statistics. Content conversion, quality scoring, and
//! document persistence are pluggable collaborators behind traits.

pub mod backend;
pub mod config;
pub mod crawler;
pub mod processor;
pub mod stats;
pub mod url;

use thiserror::Error;

/// Main error type for crawl operations
///
/// Only two conditions are crawl-fatal: failing to resolve a non-URL
/// target into a seed URL, and having no backend able to serve a URL.
/// Per-URL fetch and processing failures are recorded in the result and
/// never surface here.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("Could not resolve target '{target}' to a URL: {reason}")]
    Discovery { target: String, reason: String },

    #[error("No backend available for {url}")]
    NoBackendAvailable { url: String },

    #[error("Invalid crawl target: {0}")]
    InvalidTarget(String),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: regex::Error,
    },
}

/// Errors produced by fetch backends
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection error for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Http { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Backend error: {0}")]
    Other(String),
}

impl BackendError {
    /// Returns true if the error is worth retrying
    ///
    /// Timeouts, connection resets, and IO errors are transient; an
    /// explicit HTTP status from the server is permanent.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BackendError::Timeout { .. } | BackendError::Connection { .. } | BackendError::Io(_)
        )
    }
}

/// Errors produced by content processors and organizers
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to parse content: {0}")]
    Parse(String),

    #[error("Quality check failed: {0}")]
    Quality(String),

    #[error("Document organizer error: {0}")]
    Organize(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use backend::{Backend, BackendCriteria, BackendRegistry, FetchResponse};
pub use config::Config;
pub use crawler::{CrawlOrchestrator, CrawlTarget};
pub use stats::{CrawlResult, CrawlStats};
pub use url::{normalize_url, registered_domain, UrlInfo};
