//! Compact text rendering of a snapshot for logs and prompts

use std::fmt::Write as _;

use crate::core::{AnalysisResult, ElementDescriptor};
use crate::page::text::truncate_chars;

/// Elements shown by [`AnalysisResult::render_listing`] unless told otherwise
pub const DEFAULT_LISTING_LIMIT: usize = 40;

const LISTING_LABEL_LEN: usize = 35;
const DESCRIBE_LABEL_LEN: usize = 30;
const LISTING_VALUE_LEN: usize = 15;

impl AnalysisResult {
    /// One line per element, at most `limit` lines plus an overflow note
    pub fn render_listing(&self, limit: usize) -> String {
        if self.elements.is_empty() {
            return "(no interactive elements)".to_string();
        }

        let mut lines: Vec<String> = self.elements.iter().take(limit).map(listing_line).collect();
        let hidden = self.elements.len().saturating_sub(limit);
        if hidden > 0 {
            lines.push(format!("... {} more elements", hidden));
        }
        lines.join("\n")
    }

    /// Short `[n] type "label"` reference, tolerant of stale ordinals
    pub fn describe(&self, ordinal: usize) -> String {
        match self.element(ordinal) {
            Some(element) => {
                let mut desc = format!("[{}] {}", ordinal, element.semantic_type);
                push_label(&mut desc, &element.label, DESCRIBE_LABEL_LEN);
                desc
            }
            None => format!("[{}] (unknown element)", ordinal),
        }
    }
}

fn push_label(out: &mut String, label: &str, max: usize) {
    if !label.is_empty() {
        let _ = write!(out, " \"{}\"", truncate_chars(label, max));
    }
}

fn listing_line(element: &ElementDescriptor) -> String {
    let mut line = format!("[{}] {}", element.ordinal, element.semantic_type);
    push_label(&mut line, &element.label, LISTING_LABEL_LEN);
    let _ = write!(
        line,
        " @({},{})",
        element.bounding_box.x, element.bounding_box.y
    );

    let state = &element.state;
    let mut parts = Vec::new();
    if let Some(value) = state.value.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("value=\"{}\"", truncate_chars(value, LISTING_VALUE_LEN)));
    }
    if state.checked == Some(true) {
        parts.push("[x]".to_string());
    }
    if state.disabled == Some(true) {
        parts.push("disabled".to_string());
    }
    if !parts.is_empty() {
        let _ = write!(line, " [{}]", parts.join(", "));
    }
    line
}
