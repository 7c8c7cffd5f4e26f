//! Plain HTTP fetch backend

use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::collections::HashMap;
use std::time::Duration;

use crate::backend::{Backend, FetchConfig, FetchResponse};
use crate::url::UrlInfo;
use crate::BackendError;

/// Fetches pages with a shared `reqwest` client
///
/// Redirects are followed (up to 10 hops) and the final URL is reported
/// back so the pipeline can reconcile it against the visited set.
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    /// Builds the backend with its HTTP client
    pub fn new(user_agent: &str) -> Result<HttpBackend, BackendError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build HTTP client: {}", e)))?;
        Ok(HttpBackend { client })
    }

    fn classify(url: &str, error: reqwest::Error) -> BackendError {
        if error.is_timeout() {
            BackendError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            BackendError::Connection {
                url: url.to_string(),
                message: "connection failed".to_string(),
            }
        } else if error.is_redirect() {
            BackendError::Other(format!("Redirect error for {}: {}", url, error))
        } else {
            BackendError::Connection {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn fetch(
        &self,
        info: &UrlInfo,
        config: &FetchConfig,
    ) -> Result<FetchResponse, BackendError> {
        let url = &info.normalized;
        tracing::debug!("HTTP fetch: {}", url);

        let response = self
            .client
            .get(url)
            .timeout(config.request_timeout)
            .send()
            .await
            .map_err(|e| Self::classify(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut metadata = HashMap::new();
        if let Some(server) = response
            .headers()
            .get("server")
            .and_then(|v| v.to_str().ok())
        {
            metadata.insert("server".to_string(), server.to_string());
        }

        // Reading the body can also time out or reset
        let content = response
            .text()
            .await
            .map_err(|e| Self::classify(url, e))?;

        Ok(FetchResponse {
            status,
            final_url: if final_url != *url {
                Some(final_url)
            } else {
                None
            },
            content,
            content_type,
            metadata,
        })
    }

    async fn validate(&self, info: &UrlInfo) -> bool {
        matches!(info.scheme.as_str(), "http" | "https")
    }
}
