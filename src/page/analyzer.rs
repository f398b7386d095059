//! Page analyzer
//!
//! One synchronous pass: discover candidates, classify and describe them,
//! sort by reading order, then number them.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::core::config::{AnalyzerConfig, SelectorConfig};
use crate::core::{AnalysisResult, ElementDescriptor};
use crate::dom::{Document, NodeId};
use crate::page::classifier::Classifier;
use crate::page::descriptor::DescriptorBuilder;
use crate::page::synthesizer::SelectorSynthesizer;

/// Union of selectors that may yield interactive elements
pub const CANDIDATE_SELECTORS: &[&str] = &[
    "a[href]",
    "button",
    "input:not([type=\"hidden\"])",
    "textarea",
    "select",
    "[onclick]",
    "[role=\"button\"]",
    "[role=\"link\"]",
    "[role=\"menuitem\"]",
    "[role=\"tab\"]",
    "[role=\"option\"]",
    "[role=\"checkbox\"]",
    "[role=\"radio\"]",
    "[role=\"switch\"]",
    "[role=\"slider\"]",
    "[role=\"textbox\"]",
    "[role=\"combobox\"]",
    "[role=\"searchbox\"]",
    "[role=\"listbox\"]",
    "[tabindex]:not([tabindex^=\"-\"])",
    "[contenteditable=\"\"]",
    "[contenteditable=\"true\"]",
    "[contenteditable=\"plaintext-only\"]",
    "details",
    "summary",
    "video[controls]",
    "audio[controls]",
];

#[derive(Debug, Clone)]
pub struct PageAnalyzer {
    config: AnalyzerConfig,
    synthesizer: SelectorSynthesizer,
}

impl PageAnalyzer {
    pub fn new(config: AnalyzerConfig, selector: SelectorConfig) -> Self {
        Self {
            config,
            synthesizer: SelectorSynthesizer::new(selector),
        }
    }

    /// Candidate nodes in discovery order, deduplicated, overlays excluded
    pub fn candidates<D: Document + ?Sized>(&self, doc: &D) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for selector in CANDIDATE_SELECTORS {
            let matches = match doc.query_selector_all(selector) {
                Ok(matches) => matches,
                Err(e) => {
                    trace!(selector, error = %e, "candidate query failed");
                    continue;
                }
            };
            for node in matches {
                if seen.insert(node) && !doc.is_overlay(node) {
                    out.push(node);
                }
            }
        }
        out
    }

    /// Capture the interactive surface of `doc`
    pub fn analyze<D: Document + ?Sized>(&self, doc: &D) -> AnalysisResult {
        let classifier = Classifier::new(&self.config, doc.viewport());
        let builder = DescriptorBuilder::new(&self.config, classifier, &self.synthesizer);

        let candidates = self.candidates(doc);
        let total = candidates.len();
        let mut elements: Vec<ElementDescriptor> = candidates
            .into_iter()
            .filter_map(|node| {
                builder
                    .build(doc, node)
                    .map_err(|skipped| trace!(%skipped, "candidate skipped"))
                    .ok()
            })
            .collect();

        let row_height = i64::from(self.config.row_height.max(1));
        elements.sort_by_key(|e| {
            (
                e.bounding_box.y.div_euclid(row_height),
                e.bounding_box.x,
            )
        });
        for (index, element) in elements.iter_mut().enumerate() {
            element.ordinal = index + 1;
        }

        let focused_ordinal = doc
            .active_element()
            .filter(|&active| Some(active) != doc.body())
            .and_then(|active| elements.iter().find(|e| e.node == Some(active)))
            .map(|e| e.ordinal);

        debug!(
            candidates = total,
            elements = elements.len(),
            focused = ?focused_ordinal,
            "analysis complete"
        );

        AnalysisResult {
            url: doc.url(),
            title: doc.title(),
            viewport: doc.viewport(),
            scroll: doc.scroll(),
            elements,
            focused_ordinal,
        }
    }
}
