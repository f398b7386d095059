//! Selector synthesis
//!
//! Produces a short locator for an element, preferring hooks a developer put
//! there on purpose (id, form name, test ids, aria-label) over structural
//! paths. Every rule is tried in order and the first selector that resolves
//! to exactly one element wins; the structural path is the fallback and may
//! stay ambiguous on pathological markup.

use once_cell::sync::Lazy;
use regex::RegexSet;

use crate::core::config::SelectorConfig;
use crate::dom::selector::nth_of_type;
use crate::dom::{css_escape, quote_attr, Document, NodeId};

/// Test-automation attributes, highest priority first
const TEST_ATTRIBUTES: &[&str] = &["data-testid", "data-test-id", "data-cy", "data-test"];

/// Class tokens describing transient UI state
const STATE_WORDS: &[&str] = &["active", "hover", "focus", "selected", "open", "show", "hide"];

/// Shapes of class names emitted by CSS-in-JS tools and bundlers
static GENERATED_CLASS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"^-?[0-9]",
        r"^(css|sc|jsx|emotion|styled|svelte|tw)-[A-Za-z0-9_-]+$",
        r"^_[A-Za-z0-9_-]{4,}$",
        r"^[A-Za-z]{1,3}[0-9][A-Za-z0-9]{2,}$",
        r"^[A-Za-z]+_[A-Za-z]+__[A-Za-z0-9_-]{5}$",
    ])
    .unwrap()
});

/// Builds locators for elements of one document
#[derive(Debug, Clone)]
pub struct SelectorSynthesizer {
    config: SelectorConfig,
}

impl SelectorSynthesizer {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    /// Locator for `node`; never empty
    pub fn synthesize<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> String {
        let tag = doc.tag_name(node).unwrap_or_else(|| "*".to_string());

        let rules: [fn(&Self, &D, NodeId, &str) -> Vec<String>; 4] = [
            Self::by_id,
            Self::by_name,
            Self::by_test_attribute,
            Self::by_aria_label,
        ];
        for rule in rules {
            for selector in rule(self, doc, node, &tag) {
                if is_unique(doc, &selector) {
                    return selector;
                }
            }
        }

        self.structural_path(doc, node)
    }

    fn by_id<D: Document + ?Sized>(&self, doc: &D, node: NodeId, _tag: &str) -> Vec<String> {
        doc.attribute(node, "id")
            .filter(|id| !id.is_empty() && !id.chars().all(|c| c.is_ascii_digit()) && !id.contains(':'))
            .map(|id| format!("#{}", css_escape(&id)))
            .into_iter()
            .collect()
    }

    fn by_name<D: Document + ?Sized>(&self, doc: &D, node: NodeId, tag: &str) -> Vec<String> {
        doc.attribute(node, "name")
            .filter(|n| !n.is_empty())
            .map(|name| format!("{}[name={}]", tag, quote_attr(&name)))
            .into_iter()
            .collect()
    }

    fn by_test_attribute<D: Document + ?Sized>(
        &self,
        doc: &D,
        node: NodeId,
        _tag: &str,
    ) -> Vec<String> {
        // one candidate per present attribute, each checked for uniqueness
        TEST_ATTRIBUTES
            .iter()
            .filter_map(|attr| {
                doc.attribute(node, attr)
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("[{}={}]", attr, quote_attr(&v)))
            })
            .collect()
    }

    fn by_aria_label<D: Document + ?Sized>(
        &self,
        doc: &D,
        node: NodeId,
        tag: &str,
    ) -> Vec<String> {
        doc.attribute(node, "aria-label")
            .filter(|l| !l.is_empty() && l.chars().count() < self.config.aria_label_cap)
            .map(|label| format!("{}[aria-label={}]", tag, quote_attr(&label)))
            .into_iter()
            .collect()
    }

    /// Walk up at most `max_depth` levels, stopping as soon as the path is unique
    fn structural_path<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> String {
        let mut segments: Vec<String> = Vec::new();
        let mut current = Some(node);

        for _ in 0..self.config.max_depth {
            let Some(n) = current else { break };
            let Some(tag) = doc.tag_name(n) else { break };
            if !segments.is_empty() && matches!(tag.as_str(), "body" | "html") {
                break;
            }

            segments.insert(0, self.segment(doc, n, &tag));
            let path = segments.join(" > ");
            if is_unique(doc, &path) {
                return path;
            }
            current = doc.parent(n);
        }

        if segments.is_empty() {
            return doc.tag_name(node).unwrap_or_else(|| "*".to_string());
        }
        segments.join(" > ")
    }

    fn segment<D: Document + ?Sized>(&self, doc: &D, node: NodeId, tag: &str) -> String {
        let mut segment = tag.to_string();

        if let Some(classes) = doc.attribute(node, "class") {
            let stable = classes
                .split_whitespace()
                .filter(|class| is_stable_class(class))
                .take(self.config.max_classes);
            for class in stable {
                segment.push('.');
                segment.push_str(&css_escape(class));
            }
        }

        if let Some(parent) = doc.parent(node) {
            let same_tag = doc
                .children(parent)
                .into_iter()
                .filter(|&c| doc.tag_name(c).as_deref() == Some(tag))
                .count();
            if same_tag > 1 {
                segment.push_str(&format!(":nth-of-type({})", nth_of_type(doc, node, tag)));
            }
        }
        segment
    }
}

/// Whether a class name looks hand-written rather than generated or stateful
pub fn is_stable_class(class: &str) -> bool {
    if class.len() < 2 {
        return false;
    }
    if GENERATED_CLASS.is_match(class) {
        return false;
    }
    !class
        .split(['-', '_'])
        .any(|token| STATE_WORDS.iter().any(|w| token.eq_ignore_ascii_case(w)))
}

fn is_unique<D: Document + ?Sized>(doc: &D, selector: &str) -> bool {
    doc.query_selector_all(selector)
        .map(|matches| matches.len() == 1)
        .unwrap_or(false)
}
