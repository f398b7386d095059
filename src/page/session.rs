//! Session state and the installation guard
//!
//! A [`PageHost`] owns one document and at most one installed
//! [`SessionState`]. Installing twice hands back the same state; navigating
//! to a new document throws it away, the same way a page unload discards
//! everything injected into it.

use tracing::debug;

use crate::core::{AnalysisResult, Config};
use crate::dom::Document;
use crate::page::analyzer::PageAnalyzer;
use crate::page::overlay::OverlayAnnotator;
use crate::page::text::TextExtractor;

/// Everything that lives for as long as one installation
#[derive(Debug)]
pub struct SessionState {
    analyzer: PageAnalyzer,
    overlays: OverlayAnnotator,
    text: TextExtractor,
    default_text_length: usize,
    last: Option<AnalysisResult>,
}

impl SessionState {
    pub fn new(config: &Config) -> Self {
        Self {
            analyzer: PageAnalyzer::new(config.analyzer.clone(), config.selector.clone()),
            overlays: OverlayAnnotator::new(config.overlay.clone()),
            text: TextExtractor::new(config.text.clone()),
            default_text_length: config.text.default_max_length,
            last: None,
        }
    }
}

/// A document together with its (optional) installed session
#[derive(Debug)]
pub struct PageHost<D: Document> {
    document: D,
    config: Config,
    state: Option<SessionState>,
}

impl<D: Document> PageHost<D> {
    pub fn new(document: D, config: Config) -> Self {
        Self {
            document,
            config,
            state: None,
        }
    }

    /// Install the session, or reuse the one already installed
    pub fn install(&mut self) -> Session<'_, D> {
        let config = &self.config;
        let state = self.state.get_or_insert_with(|| {
            debug!("installing page session");
            SessionState::new(config)
        });
        Session {
            document: &mut self.document,
            state,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.state.is_some()
    }

    /// Replace the document; the installed session does not survive
    pub fn navigate(&mut self, document: D) {
        if self.state.take().is_some() {
            debug!("session discarded by navigation");
        }
        self.document = document;
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Direct access for page-side mutation outside the session
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

/// Handle over an installed session. None of its operations fail: the worst
/// outcome is an empty snapshot or a missing selector.
pub struct Session<'a, D: Document> {
    document: &'a mut D,
    state: &'a mut SessionState,
}

impl<'a, D: Document> Session<'a, D> {
    /// Take a fresh snapshot and cache it
    pub fn analyze(&mut self) -> AnalysisResult {
        let result = self.state.analyzer.analyze(&*self.document);
        self.state.last = Some(result.clone());
        result
    }

    /// Annotate the cached snapshot; re-marking replaces earlier overlays
    pub fn mark(&mut self) {
        let elements = self
            .state
            .last
            .as_ref()
            .map(|r| r.elements.as_slice())
            .unwrap_or_default();
        self.state.overlays.mark(&mut *self.document, elements);
    }

    pub fn unmark(&mut self) {
        self.state.overlays.unmark(&mut *self.document);
    }

    /// Selector of the cached element with this ordinal
    pub fn get_selector(&self, ordinal: usize) -> Option<String> {
        self.state
            .last
            .as_ref()
            .and_then(|r| r.element(ordinal))
            .map(|e| e.selector.clone())
    }

    pub fn extract_text(&self, max_length: usize) -> String {
        self.state.text.extract(&*self.document, max_length)
    }

    /// Text cut at the configured default length
    pub fn extract_text_default(&self) -> String {
        self.extract_text(self.state.default_text_length)
    }

    pub fn last_result(&self) -> Option<&AnalysisResult> {
        self.state.last.as_ref()
    }

    pub fn is_marked(&self) -> bool {
        self.state.overlays.is_marked()
    }

    pub fn overlay_count(&self) -> usize {
        self.state.overlays.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Rect;
    use crate::dom::{ElementSpec, MemoryDocument};

    fn page() -> MemoryDocument {
        let mut doc = MemoryDocument::new("https://example.com/", "Example");
        let body = doc.body_id();
        doc.append_element(
            body,
            ElementSpec::new("button")
                .attr("id", "submit")
                .rect(Rect::new(10.0, 10.0, 60.0, 24.0))
                .text("Go"),
        );
        doc.append_element(body, ElementSpec::new("p").text("Hello there"));
        doc
    }

    #[test]
    fn test_install_is_idempotent() {
        let mut host = PageHost::new(page(), Config::default());
        assert!(!host.is_installed());

        host.install().analyze();
        let session = host.install();
        assert_eq!(session.last_result().map(|r| r.len()), Some(1));
        assert_eq!(session.get_selector(1).as_deref(), Some("#submit"));
    }

    #[test]
    fn test_navigate_discards_session() {
        let mut host = PageHost::new(page(), Config::default());
        {
            let mut session = host.install();
            session.analyze();
            session.mark();
            assert_eq!(session.overlay_count(), 2);
        }

        host.navigate(MemoryDocument::new("about:blank", ""));
        assert!(!host.is_installed());
        let session = host.install();
        assert!(session.last_result().is_none());
        assert!(!session.is_marked());
        assert_eq!(session.get_selector(1), None);
    }

    #[test]
    fn test_mark_without_analysis_draws_nothing() {
        let mut host = PageHost::new(page(), Config::default());
        let mut session = host.install();
        session.mark();
        assert!(!session.is_marked());
        session.unmark();
        assert_eq!(host.document().overlay_nodes().len(), 0);
    }

    #[test]
    fn test_overlays_do_not_leak_into_analysis_or_text() {
        let mut host = PageHost::new(page(), Config::default());
        let mut session = host.install();
        session.analyze();
        session.mark();

        assert_eq!(session.analyze().len(), 1);
        assert_eq!(session.extract_text_default(), "Go Hello there");
        assert_eq!(session.extract_text(5), "Go He...");
    }

    #[test]
    fn test_get_selector_out_of_range() {
        let mut host = PageHost::new(page(), Config::default());
        let mut session = host.install();
        assert_eq!(session.get_selector(1), None);
        session.analyze();
        assert_eq!(session.get_selector(0), None);
        assert_eq!(session.get_selector(2), None);
    }
}
