//! Backend registry and ranking
//!
//! Selection is a pure ranking function over registration criteria and
//! live metrics: candidates whose criteria match the URL are ordered by
//! priority descending, ties broken by highest recent success rate, then
//! lowest in-flight load.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::criteria::CompiledCriteria;
use crate::backend::{Backend, BackendCriteria};
use crate::url::UrlInfo;
use crate::CrawlError;

/// Live counters for one registered backend
///
/// Updated lock-free by pipeline tasks as fetches start and finish.
#[derive(Debug, Default)]
pub struct BackendMetrics {
    successes: AtomicU64,
    failures: AtomicU64,
    in_flight: AtomicUsize,
}

impl BackendMetrics {
    pub fn record_start(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    /// Fraction of completed fetches that succeeded; 1.0 with no samples
    pub fn success_rate(&self) -> f64 {
        let successes = self.successes.load(Ordering::Relaxed);
        let failures = self.failures.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            1.0
        } else {
            successes as f64 / total as f64
        }
    }

    /// Fetches currently in flight through this backend
    pub fn load(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

struct RegisteredBackend {
    name: String,
    backend: Arc<dyn Backend>,
    compiled: CompiledCriteria,
    metrics: Arc<BackendMetrics>,
}

/// A selection winner handed to the pipeline
#[derive(Clone)]
pub struct SelectedBackend {
    pub name: String,
    pub backend: Arc<dyn Backend>,
    pub metrics: Arc<BackendMetrics>,
}

/// Table of `(criteria, implementation)` pairs
///
/// Registration happens before a crawl starts; during a crawl the table
/// is read-only and only the per-backend metrics move.
#[derive(Default)]
pub struct BackendRegistry {
    entries: Vec<RegisteredBackend>,
}

impl BackendRegistry {
    pub fn new() -> BackendRegistry {
        BackendRegistry::default()
    }

    /// Registers a backend under a name with its selection criteria
    ///
    /// Fails if a criteria URL pattern does not compile.
    pub fn register(
        &mut self,
        name: &str,
        backend: Arc<dyn Backend>,
        criteria: BackendCriteria,
    ) -> Result<(), CrawlError> {
        let compiled = CompiledCriteria::compile(criteria)?;
        tracing::debug!("Registered backend '{}'", name);
        self.entries.push(RegisteredBackend {
            name: name.to_string(),
            backend,
            compiled,
            metrics: Arc::new(BackendMetrics::default()),
        });
        Ok(())
    }

    /// Selects the best backend for a URL
    ///
    /// Filters entries whose criteria match (including load and
    /// success-rate bounds against live metrics), then ranks by priority
    /// descending with ties broken by success rate and load.
    pub fn select(
        &self,
        info: &UrlInfo,
        content_type_hint: Option<&str>,
    ) -> Result<SelectedBackend, CrawlError> {
        let mut candidates: Vec<&RegisteredBackend> = self
            .entries
            .iter()
            .filter(|entry| {
                if !entry.compiled.matches(info, content_type_hint) {
                    return false;
                }
                if let Some(max_load) = entry.compiled.criteria.max_load {
                    if entry.metrics.load() > max_load {
                        return false;
                    }
                }
                if let Some(min_rate) = entry.compiled.criteria.min_success_rate {
                    if entry.metrics.success_rate() < min_rate {
                        return false;
                    }
                }
                true
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.compiled
                .criteria
                .priority
                .cmp(&a.compiled.criteria.priority)
                .then_with(|| {
                    b.metrics
                        .success_rate()
                        .partial_cmp(&a.metrics.success_rate())
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.metrics.load().cmp(&b.metrics.load()))
        });

        candidates
            .first()
            .map(|entry| SelectedBackend {
                name: entry.name.clone(),
                backend: Arc::clone(&entry.backend),
                metrics: Arc::clone(&entry.metrics),
            })
            .ok_or_else(|| CrawlError::NoBackendAvailable {
                url: info.normalized.clone(),
            })
    }

    /// Closes every registered backend
    pub async fn close_all(&self) {
        for entry in &self.entries {
            entry.backend.close().await;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
