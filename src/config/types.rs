use serde::Deserialize;

/// Main configuration structure for DocHarvest
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
}

/// Crawl engine tuning
///
/// Every field has a sensible default, so an empty `[crawler]` table
/// (or none at all) yields a working configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "concurrent-requests", default = "default_concurrent_requests")]
    pub concurrent_requests: u32,

    /// Bound on a single fetch attempt, in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Minimum spacing between fetches, in seconds; 0 disables limiting
    #[serde(rename = "rate-limit-secs", default = "default_rate_limit_secs")]
    pub rate_limit_secs: f64,

    /// Token-bucket burst size for the rate limiter
    #[serde(rename = "rate-burst", default = "default_rate_burst")]
    pub rate_burst: u32,

    /// Total fetch attempts per URL, including the first
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff delay before the second attempt, in milliseconds
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on any backoff delay, in milliseconds
    #[serde(rename = "retry-max-delay-ms", default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler, sent to remote servers
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Full user-agent string presented to remote servers
    pub fn full_agent(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            concurrent_requests: default_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
            rate_limit_secs: default_rate_limit_secs(),
            rate_burst: default_rate_burst(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        UserAgentConfig {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

fn default_concurrent_requests() -> u32 {
    5
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_rate_limit_secs() -> f64 {
    0.5
}

fn default_rate_burst() -> u32 {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    30_000
}

fn default_crawler_name() -> String {
    "docharvest".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
