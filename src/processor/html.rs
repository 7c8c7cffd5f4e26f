//! Default HTML content processor

use async_trait::async_trait;
use scraper::{Html, Selector};
use std::collections::HashMap;
use url::Url;

use crate::processor::{ContentNode, ContentProcessor, ProcessedContent};
use crate::ProcessError;

/// Converts HTML pages into [`ProcessedContent`]
///
/// Extracts the title, heading texts, anchors, and code blocks into the
/// structural tree. Good enough for documentation sites; richer format
/// conversion (Markdown/RST rendering, boilerplate stripping) belongs in
/// an external processor.
pub struct HtmlProcessor;

impl HtmlProcessor {
    pub fn new() -> HtmlProcessor {
        HtmlProcessor
    }
}

impl Default for HtmlProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentProcessor for HtmlProcessor {
    async fn process(
        &self,
        raw_content: &str,
        base_url: &Url,
    ) -> Result<ProcessedContent, ProcessError> {
        let document = Html::parse_document(raw_content);

        let title = select_first_text(&document, "title");
        let headings = select_all_text(&document, "h1, h2, h3");

        let mut structure = Vec::new();
        let mut links = Vec::new();

        for heading in &headings {
            structure.push(ContentNode::Section {
                title: Some(heading.clone()),
                children: Vec::new(),
            });
        }

        let anchor_selector = Selector::parse("a[href]")
            .map_err(|e| ProcessError::Parse(format!("bad selector: {}", e)))?;
        for element in document.select(&anchor_selector) {
            // Explicit downloads are artifacts, not documentation pages
            if element.value().attr("download").is_some() {
                continue;
            }
            if let Some(href) = element.value().attr("href") {
                let text = element.text().collect::<String>().trim().to_string();
                links.push(href.to_string());
                structure.push(ContentNode::Link {
                    href: href.to_string(),
                    text,
                });
            }
        }

        let code_selector = Selector::parse("pre code, pre")
            .map_err(|e| ProcessError::Parse(format!("bad selector: {}", e)))?;
        for element in document.select(&code_selector) {
            let code = element.text().collect::<String>();
            if !code.trim().is_empty() {
                let language = element
                    .value()
                    .attr("class")
                    .and_then(|c| c.split_whitespace().find_map(|c| c.strip_prefix("language-")))
                    .map(|l| l.to_string());
                structure.push(ContentNode::CodeBlock { language, code });
            }
        }

        let body_text = select_first_text(&document, "body").unwrap_or_default();

        let mut metadata = HashMap::new();
        metadata.insert("source_url".to_string(), base_url.to_string());

        Ok(ProcessedContent {
            formatted_content: body_text,
            title,
            headings,
            links,
            structure,
            metadata,
        })
    }
}

fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|s| !s.is_empty())
}

fn select_all_text(document: &Html, selector: &str) -> Vec<String> {
    let selector = match Selector::parse(selector) {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };
    document
        .select(&selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
