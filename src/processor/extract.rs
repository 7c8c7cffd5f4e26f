//! Candidate-link extraction from processed content
//!
//! Walks the structural tree depth-first, collecting every link node's
//! href and resolving relative references against the page's final URL.

use url::Url;

use crate::processor::ContentNode;

/// Collects `(absolute url, depth + 1)` pairs from a structure tree
///
/// Every node variant is matched exhaustively; hrefs that resolve to
/// unsupported or special schemes are dropped.
pub fn extract_links(structure: &[ContentNode], base_url: &Url, depth: u32) -> Vec<(String, u32)> {
    let mut out = Vec::new();
    let next_depth = depth + 1;
    for node in structure {
        walk(node, base_url, next_depth, &mut out);
    }
    out
}

fn walk(node: &ContentNode, base_url: &Url, next_depth: u32, out: &mut Vec<(String, u32)>) {
    match node {
        ContentNode::Link { href, .. } => {
            if let Some(absolute) = resolve_link(href, base_url) {
                out.push((absolute, next_depth));
            }
        }
        ContentNode::Section { children, .. } => {
            for child in children {
                walk(child, base_url, next_depth, out);
            }
        }
        ContentNode::List { items } => {
            for item in items {
                walk(item, base_url, next_depth, out);
            }
        }
        ContentNode::Text(_) | ContentNode::CodeBlock { .. } => {}
    }
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - `javascript:`, `mailto:`, `tel:` schemes
/// - `data:` URIs
/// - fragment-only links (same page anchors)
/// - URLs that fail to resolve, or resolve outside http(s)/file
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => match absolute_url.scheme() {
            "http" | "https" | "file" => Some(absolute_url.to_string()),
            _ => None,
        },
        Err(_) => None,
    }
}
