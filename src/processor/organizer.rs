//! Default in-memory document organizer

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::processor::{CorpusStructure, DocumentOrganizer, ProcessedContent};
use crate::ProcessError;

#[derive(Debug, Clone)]
struct StoredDocument {
    title: Option<String>,
    source_url: Option<String>,
}

/// Keeps accepted documents in memory for the lifetime of the process
///
/// Useful for tests and the CLI; persistent organizers with versioning
/// and diffing implement the same trait externally.
#[derive(Default)]
pub struct MemoryOrganizer {
    documents: Mutex<Vec<StoredDocument>>,
}

impl MemoryOrganizer {
    pub fn new() -> MemoryOrganizer {
        MemoryOrganizer::default()
    }

    /// Number of documents stored so far
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentOrganizer for MemoryOrganizer {
    async fn add_document(
        &self,
        content: &ProcessedContent,
        metadata: &HashMap<String, String>,
    ) -> Result<String, ProcessError> {
        let mut documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        documents.push(StoredDocument {
            title: content.title.clone(),
            source_url: metadata.get("url").cloned(),
        });
        Ok(format!("doc-{}", documents.len()))
    }

    async fn organize(&self) -> Result<CorpusStructure, ProcessError> {
        let documents = self.documents.lock().unwrap_or_else(|e| e.into_inner());
        let titles: Vec<String> = documents
            .iter()
            .map(|d| {
                d.title
                    .clone()
                    .or_else(|| d.source_url.clone())
                    .unwrap_or_else(|| "(untitled)".to_string())
            })
            .collect();
        Ok(CorpusStructure {
            total_documents: documents.len(),
            summary: format!("{} documents collected", documents.len()),
            titles,
        })
    }
}
