//! Readable text extraction
//!
//! A depth-first walk over the visible body that condenses page prose into a
//! single line, independent of any analysis pass.

use tracing::trace;

use crate::core::config::TextConfig;
use crate::dom::{ChildNode, Document, NodeId};

/// Subtrees that never contribute readable text
const NON_CONTENT_TAGS: &[&str] = &[
    "script", "style", "noscript", "svg", "iframe", "head", "meta", "link",
];

/// Collapse every run of whitespace into a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max` characters of `text`
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct TextExtractor {
    config: TextConfig,
}

impl TextExtractor {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Condensed visible text of the body, cut to `max_length` characters
    /// plus the truncation marker
    pub fn extract<D: Document + ?Sized>(&self, doc: &D, max_length: usize) -> String {
        let mut fragments = Vec::new();
        if let Some(body) = doc.body() {
            self.walk(doc, body, 0, &mut fragments);
        }

        let text = collapse_whitespace(&fragments.join(" "));
        if text.chars().count() <= max_length {
            return text;
        }
        let mut cut = truncate_chars(&text, max_length);
        cut.push_str(&self.config.truncation_marker);
        cut
    }

    fn walk<D: Document + ?Sized>(
        &self,
        doc: &D,
        node: NodeId,
        depth: usize,
        out: &mut Vec<String>,
    ) {
        if depth > self.config.max_depth {
            trace!(%node, depth, "text walk depth limit reached");
            return;
        }
        let Some(tag) = doc.tag_name(node) else { return };
        if NON_CONTENT_TAGS.contains(&tag.as_str()) || doc.is_overlay(node) {
            return;
        }
        match doc.computed_style(node) {
            Ok(style) if style.is_hidden() => return,
            Ok(_) => {}
            Err(e) => {
                trace!(%node, error = %e, "skipping unreadable subtree");
                return;
            }
        }

        for child in doc.child_nodes(node) {
            match child {
                ChildNode::Text(text) => {
                    let text = text.trim();
                    if text.chars().count() >= self.config.min_fragment_len {
                        out.push(text.to_string());
                    }
                }
                ChildNode::Element(child) => self.walk(doc, child, depth + 1, out),
            }
        }
    }
}
