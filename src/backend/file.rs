//! Static-file fetch backend
//!
//! Serves `file://` targets, typically a locally checked-out docs tree.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

use crate::backend::{Backend, FetchConfig, FetchResponse};
use crate::url::UrlInfo;
use crate::BackendError;

pub struct FileBackend;

impl FileBackend {
    pub fn new() -> FileBackend {
        FileBackend
    }

    fn content_type_for(path: &Path) -> &'static str {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html") | Some("htm") => "text/html",
            Some("md") | Some("markdown") => "text/markdown",
            Some("rst") => "text/x-rst",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

impl Default for FileBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn fetch(
        &self,
        info: &UrlInfo,
        _config: &FetchConfig,
    ) -> Result<FetchResponse, BackendError> {
        let path = Path::new(&info.path);
        tracing::debug!("File fetch: {}", path.display());

        match tokio::fs::read_to_string(path).await {
            Ok(content) => Ok(FetchResponse {
                status: 200,
                final_url: None,
                content,
                content_type: Some(Self::content_type_for(path).to_string()),
                metadata: HashMap::new(),
            }),
            // A missing or unreadable file will not appear on retry
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                Err(BackendError::Other(format!(
                    "Cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
            Err(e) => Err(BackendError::Io(e)),
        }
    }

    async fn validate(&self, info: &UrlInfo) -> bool {
        info.scheme == "file"
    }
}
