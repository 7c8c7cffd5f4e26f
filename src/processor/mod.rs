//! Content-processing collaborator interfaces
//!
//! The crawl engine never parses or renders content itself; it hands raw
//! responses to a [`ContentProcessor`], the processed result to a
//! [`QualityChecker`], and accepted documents to a [`DocumentOrganizer`].
//! All three are trait objects so format converters, scoring heuristics,
//! and persistence layers plug in from outside. A scraper-based HTML
//! processor and simple in-memory defaults ship with the crate.

mod extract;
mod html;
mod organizer;
mod quality;

use std::collections::HashMap;

use async_trait::async_trait;
use url::Url;

use crate::ProcessError;

pub use extract::extract_links;
pub use html::HtmlProcessor;
pub use organizer::MemoryOrganizer;
pub use quality::BasicQualityChecker;

/// One node of processed document structure
///
/// An explicit tagged union rather than nested maps: link extraction and
/// any other structural walk can match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    /// A titled region containing child nodes
    Section {
        title: Option<String>,
        children: Vec<ContentNode>,
    },

    /// Plain prose
    Text(String),

    /// A link-like node; `href` may be relative
    Link { href: String, text: String },

    /// A fenced or indented code block
    CodeBlock {
        language: Option<String>,
        code: String,
    },

    /// An ordered or unordered list
    List { items: Vec<ContentNode> },
}

/// Output of a content processor for one page
#[derive(Debug, Clone, Default)]
pub struct ProcessedContent {
    /// Converted document body (e.g. Markdown)
    pub formatted_content: String,

    /// Document title, if one was found
    pub title: Option<String>,

    /// Heading texts in document order
    pub headings: Vec<String>,

    /// Raw hrefs as they appeared in the source
    pub links: Vec<String>,

    /// Structural tree walked for link extraction
    pub structure: Vec<ContentNode>,

    /// Processor-specific metadata
    pub metadata: HashMap<String, String>,
}

/// Severity of a quality finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueSeverity {
    Info,
    Warning,
    Error,
}

/// A structured finding emitted by the quality checker
#[derive(Debug, Clone)]
pub struct QualityIssue {
    pub severity: IssueSeverity,
    pub message: String,
}

/// Context handed to the quality checker alongside the content
#[derive(Debug, Clone)]
pub struct QualityContext {
    /// Final URL the content came from
    pub url: String,

    /// Response content type, when the backend reported one
    pub content_type: Option<String>,
}

/// Corpus summary produced by the document organizer
#[derive(Debug, Clone)]
pub struct CorpusStructure {
    pub total_documents: usize,

    /// Document titles in completion order
    pub titles: Vec<String>,

    pub summary: String,
}

/// Converts raw fetched content into [`ProcessedContent`]
///
/// Treated as potentially blocking; the pipeline isolates failures so a
/// processor error fails only the URL it was handling.
#[async_trait]
pub trait ContentProcessor: Send + Sync {
    async fn process(
        &self,
        raw_content: &str,
        base_url: &Url,
    ) -> Result<ProcessedContent, ProcessError>;
}

/// Scores processed content and reports findings
#[async_trait]
pub trait QualityChecker: Send + Sync {
    async fn check_quality(
        &self,
        content: &ProcessedContent,
        context: &QualityContext,
    ) -> Result<(Vec<QualityIssue>, HashMap<String, f64>), ProcessError>;
}

/// Accepts finished documents and summarizes the corpus
///
/// Persistence, versioning, and diffing are entirely the organizer's
/// responsibility; the crawl engine only forwards documents.
#[async_trait]
pub trait DocumentOrganizer: Send + Sync {
    /// Stores a document, returning its assigned identifier
    async fn add_document(
        &self,
        content: &ProcessedContent,
        metadata: &HashMap<String, String>,
    ) -> Result<String, ProcessError>;

    /// Summarizes everything added so far
    async fn organize(&self) -> Result<CorpusStructure, ProcessError>;
}
