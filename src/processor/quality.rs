//! Default quality heuristics

use async_trait::async_trait;
use std::collections::HashMap;

use crate::processor::{
    IssueSeverity, ProcessedContent, QualityChecker, QualityContext, QualityIssue,
};
use crate::ProcessError;

/// Flags obviously thin or malformed documentation pages
///
/// Real scoring heuristics live outside the engine; this checker covers
/// the structural basics so the CLI produces useful findings on its own.
pub struct BasicQualityChecker {
    /// Pages with fewer words than this are flagged as thin
    pub min_word_count: usize,
}

impl BasicQualityChecker {
    pub fn new(min_word_count: usize) -> BasicQualityChecker {
        BasicQualityChecker { min_word_count }
    }
}

impl Default for BasicQualityChecker {
    fn default() -> Self {
        BasicQualityChecker::new(50)
    }
}

#[async_trait]
impl QualityChecker for BasicQualityChecker {
    async fn check_quality(
        &self,
        content: &ProcessedContent,
        context: &QualityContext,
    ) -> Result<(Vec<QualityIssue>, HashMap<String, f64>), ProcessError> {
        let mut issues = Vec::new();

        let word_count = content.formatted_content.split_whitespace().count();

        if content.title.is_none() {
            issues.push(QualityIssue {
                severity: IssueSeverity::Warning,
                message: format!("No title found for {}", context.url),
            });
        }

        if word_count < self.min_word_count {
            issues.push(QualityIssue {
                severity: IssueSeverity::Warning,
                message: format!(
                    "Thin content: {} words (minimum {})",
                    word_count, self.min_word_count
                ),
            });
        }

        if content.headings.is_empty() {
            issues.push(QualityIssue {
                severity: IssueSeverity::Info,
                message: "Document has no headings".to_string(),
            });
        }

        let mut metrics = HashMap::new();
        metrics.insert("word_count".to_string(), word_count as f64);
        metrics.insert("heading_count".to_string(), content.headings.len() as f64);
        metrics.insert("link_count".to_string(), content.links.len() as f64);

        Ok((issues, metrics))
    }
}
