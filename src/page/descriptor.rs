//! Descriptor builder
//!
//! Turns a candidate node into an [`ElementDescriptor`], or into an explicit
//! [`Skipped`] value when the classifier rejects it or a live read fails.

use std::fmt;

use crate::core::config::AnalyzerConfig;
use crate::core::{Action, ElementDescriptor, ElementState, PageError};
use crate::dom::{quote_attr, Document, NodeId};
use crate::page::classifier::{Classifier, Rejection};
use crate::page::synthesizer::SelectorSynthesizer;
use crate::page::text::{collapse_whitespace, truncate_chars};

/// Input types that accept free text; `None` is a missing type attribute
const TEXT_INPUT_TYPES: &[&str] = &["text", "password", "email", "search", "url", "tel", "number"];

/// Roles that behave like a two-state toggle
const TOGGLE_ROLES: &[&str] = &["checkbox", "radio", "switch"];

/// Why a candidate did not make it into the snapshot
#[derive(Debug)]
pub enum SkipReason {
    Rejected(Rejection),
    Failed(PageError),
}

/// A candidate dropped from one analysis pass
#[derive(Debug)]
pub struct Skipped {
    pub node: NodeId,
    pub reason: SkipReason,
}

impl Skipped {
    fn failed(node: NodeId, error: PageError) -> Self {
        Self {
            node,
            reason: SkipReason::Failed(error),
        }
    }
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            SkipReason::Rejected(r) => write!(f, "{} rejected: {}", self.node, r),
            SkipReason::Failed(e) => write!(f, "{} failed: {}", self.node, e),
        }
    }
}

/// Where a label may come from, in priority order
#[derive(Debug, Clone, Copy, PartialEq)]
enum LabelSource {
    AriaLabel,
    LabelledBy,
    LabelFor,
    Attribute(&'static str),
    Text,
}

const LABEL_SOURCES: &[LabelSource] = &[
    LabelSource::AriaLabel,
    LabelSource::LabelledBy,
    LabelSource::LabelFor,
    LabelSource::Attribute("title"),
    LabelSource::Attribute("alt"),
    LabelSource::Attribute("placeholder"),
    LabelSource::Attribute("value"),
    LabelSource::Text,
];

impl LabelSource {
    fn extract<D: Document + ?Sized>(
        self,
        doc: &D,
        node: NodeId,
        config: &AnalyzerConfig,
    ) -> Option<String> {
        let text = match self {
            LabelSource::AriaLabel => doc.attribute(node, "aria-label"),
            LabelSource::LabelledBy => doc.attribute(node, "aria-labelledby").map(|ids| {
                ids.split_whitespace()
                    .filter_map(|id| doc.element_by_id(id))
                    .filter_map(|labeller| doc.text_content(labeller).ok())
                    .collect::<Vec<_>>()
                    .join(" ")
            }),
            LabelSource::LabelFor => {
                let id = doc.attribute(node, "id").filter(|id| !id.is_empty())?;
                let selector = format!("label[for={}]", quote_attr(&id));
                let label = doc.query_selector_all(&selector).ok()?.into_iter().next()?;
                doc.text_content(label).ok()
            }
            LabelSource::Attribute(name) => doc
                .attribute(node, name)
                .filter(|v| v.trim().chars().count() < config.attribute_label_cap),
            LabelSource::Text => doc
                .text_content(node)
                .ok()
                .map(|t| collapse_whitespace(&t))
                .filter(|t| t.chars().count() < config.text_label_cap),
        }?;
        let text = collapse_whitespace(&text);
        (!text.is_empty()).then_some(text)
    }
}

/// Builds descriptors for candidates of one analysis pass
pub struct DescriptorBuilder<'a> {
    config: &'a AnalyzerConfig,
    classifier: Classifier,
    synthesizer: &'a SelectorSynthesizer,
}

impl<'a> DescriptorBuilder<'a> {
    pub fn new(
        config: &'a AnalyzerConfig,
        classifier: Classifier,
        synthesizer: &'a SelectorSynthesizer,
    ) -> Self {
        Self {
            config,
            classifier,
            synthesizer,
        }
    }

    /// Classify `node` and describe it; the ordinal is assigned later
    pub fn build<D: Document + ?Sized>(
        &self,
        doc: &D,
        node: NodeId,
    ) -> Result<ElementDescriptor, Skipped> {
        let tag = doc
            .expect_element(node)
            .map_err(|e| Skipped::failed(node, e))?;
        let rect = doc
            .bounding_rect(node)
            .map_err(|e| Skipped::failed(node, e))?;
        let style = doc
            .computed_style(node)
            .map_err(|e| Skipped::failed(node, e))?;

        self.classifier
            .classify(&tag, &rect, &style)
            .map_err(|rejection| Skipped {
                node,
                reason: SkipReason::Rejected(rejection),
            })?;

        Ok(ElementDescriptor {
            ordinal: 0,
            selector: self.synthesizer.synthesize(doc, node),
            semantic_type: semantic_type(doc, node, &tag),
            label: self.label(doc, node),
            bounding_box: rect.rounded(),
            center: rect.center(),
            available_actions: available_actions(doc, node, &tag),
            state: self.state(doc, node, &tag),
            node: Some(node),
        })
    }

    fn label<D: Document + ?Sized>(&self, doc: &D, node: NodeId) -> String {
        LABEL_SOURCES
            .iter()
            .find_map(|source| source.extract(doc, node, self.config))
            .map(|label| truncate_chars(&label, self.config.max_label_len))
            .unwrap_or_default()
    }

    fn state<D: Document + ?Sized>(&self, doc: &D, node: NodeId, tag: &str) -> ElementState {
        let input_type = input_type(doc, node, tag);
        let mut state = ElementState::default();

        if matches!(tag, "input" | "textarea" | "select") {
            state.value = doc
                .value(node)
                .filter(|v| !v.is_empty())
                .map(|v| truncate_chars(&v, self.config.max_value_len));
        }

        if matches!(input_type.as_deref(), Some("checkbox" | "radio")) {
            state.checked = Some(doc.is_checked(node));
        } else if role(doc, node).is_some_and(|r| TOGGLE_ROLES.contains(&r.as_str())) {
            state.checked = doc
                .attribute(node, "aria-checked")
                .map(|v| v.eq_ignore_ascii_case("true"));
        }

        if tag == "select" {
            state.selected = doc.selected_option_text(node).filter(|t| !t.is_empty());
        }

        state.expanded = doc
            .attribute(node, "aria-expanded")
            .map(|v| v.eq_ignore_ascii_case("true"));

        let aria_disabled = doc
            .attribute(node, "aria-disabled")
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if doc.is_disabled(node) || aria_disabled {
            state.disabled = Some(true);
        }

        if matches!(tag, "input" | "textarea") && doc.is_read_only(node) {
            state.readonly = Some(true);
        }
        state
    }
}

fn role<D: Document + ?Sized>(doc: &D, node: NodeId) -> Option<String> {
    doc.attribute(node, "role")
        .map(|r| r.trim().to_ascii_lowercase())
        .filter(|r| !r.is_empty())
}

/// Lower-cased `type` of an `<input>`; `None` when unset or not an input
fn input_type<D: Document + ?Sized>(doc: &D, node: NodeId, tag: &str) -> Option<String> {
    if tag != "input" {
        return None;
    }
    doc.attribute(node, "type")
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
}

/// Tag name refined by an explicit role or, for inputs, the input type
pub fn semantic_type<D: Document + ?Sized>(doc: &D, node: NodeId, tag: &str) -> String {
    if let Some(role) = role(doc, node) {
        return role;
    }
    match input_type(doc, node, tag) {
        Some(t) if t != "submit" && t != "button" => format!("input[{}]", t),
        _ => tag.to_string(),
    }
}

/// Action verbs the element supports; click is always first
pub fn available_actions<D: Document + ?Sized>(doc: &D, node: NodeId, tag: &str) -> Vec<Action> {
    let input_type = input_type(doc, node, tag);
    let role = role(doc, node);
    let mut actions = vec![Action::Click];

    let free_text = tag == "input"
        && input_type
            .as_deref()
            .map_or(true, |t| TEXT_INPUT_TYPES.contains(&t));
    if free_text || tag == "textarea" || doc.is_content_editable(node) {
        actions.extend([Action::Fill, Action::Clear]);
    }

    if tag == "select" {
        actions.push(Action::Select);
    }

    let toggle_input = matches!(input_type.as_deref(), Some("checkbox" | "radio"));
    let toggle_role = role.is_some_and(|r| TOGGLE_ROLES.contains(&r.as_str()));
    if toggle_input || toggle_role {
        actions.extend([Action::Check, Action::Uncheck]);
    }

    if input_type.as_deref() == Some("file") {
        actions.push(Action::Upload);
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SelectorConfig;
    use crate::core::{Rect, Viewport};
    use crate::dom::{ElementSpec, MemoryDocument, StyleDecl};

    fn boxed(spec: ElementSpec) -> ElementSpec {
        spec.rect(Rect::new(10.0, 10.0, 120.0, 24.0))
    }

    fn build(doc: &MemoryDocument, node: NodeId) -> Result<ElementDescriptor, Skipped> {
        let config = AnalyzerConfig::default();
        let synthesizer = SelectorSynthesizer::new(SelectorConfig::default());
        let classifier = Classifier::new(&config, Viewport::default());
        DescriptorBuilder::new(&config, classifier, &synthesizer).build(doc, node)
    }

    #[test]
    fn test_button_descriptor() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let node = doc.append_element(body, boxed(ElementSpec::new("button").attr("id", "submit").text("Go")));

        let d = build(&doc, node).unwrap();
        assert_eq!(d.selector, "#submit");
        assert_eq!(d.semantic_type, "button");
        assert_eq!(d.label, "Go");
        assert_eq!(d.available_actions, vec![Action::Click]);
        assert!(d.state.is_empty());
        assert_eq!(d.node, Some(node));
    }

    #[test]
    fn test_checkbox_state() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let node = doc.append_element(
            body,
            boxed(ElementSpec::new("input").attr("type", "checkbox").attr("checked", "")),
        );

        let d = build(&doc, node).unwrap();
        assert_eq!(d.semantic_type, "input[checkbox]");
        assert!(d.supports(Action::Check) && d.supports(Action::Uncheck));
        assert!(!d.supports(Action::Fill));
        assert_eq!(d.state.checked, Some(true));
        assert_eq!(d.state.value, None);
    }

    #[test]
    fn test_semantic_type_rules() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let submit = doc.append_element(body, ElementSpec::new("input").attr("type", "submit"));
        let plain = doc.append_element(body, ElementSpec::new("input"));
        let role = doc.append_element(body, ElementSpec::new("div").attr("role", "Tab"));
        let email = doc.append_element(body, ElementSpec::new("input").attr("type", "Email").attr("role", "combobox"));

        assert_eq!(semantic_type(&doc, submit, "input"), "input");
        assert_eq!(semantic_type(&doc, plain, "input"), "input");
        assert_eq!(semantic_type(&doc, role, "div"), "tab");
        assert_eq!(semantic_type(&doc, email, "input"), "combobox");
    }

    #[test]
    fn test_action_rules() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let untyped = doc.append_element(body, ElementSpec::new("input"));
        let date = doc.append_element(body, ElementSpec::new("input").attr("type", "date"));
        let file = doc.append_element(body, ElementSpec::new("input").attr("type", "file"));
        let select = doc.append_element(body, ElementSpec::new("select"));
        let switch = doc.append_element(body, ElementSpec::new("div").attr("role", "switch"));
        let editor = doc.append_element(body, ElementSpec::new("div").attr("contenteditable", "true"));
        let area = doc.append_element(body, ElementSpec::new("textarea"));

        use Action::*;
        assert_eq!(available_actions(&doc, untyped, "input"), vec![Click, Fill, Clear]);
        assert_eq!(available_actions(&doc, date, "input"), vec![Click]);
        assert_eq!(available_actions(&doc, file, "input"), vec![Click, Upload]);
        assert_eq!(available_actions(&doc, select, "select"), vec![Click, Select]);
        assert_eq!(available_actions(&doc, switch, "div"), vec![Click, Check, Uncheck]);
        assert_eq!(available_actions(&doc, editor, "div"), vec![Click, Fill, Clear]);
        assert_eq!(available_actions(&doc, area, "textarea"), vec![Click, Fill, Clear]);
    }

    #[test]
    fn test_label_priority() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        doc.append_element(body, ElementSpec::new("span").attr("id", "hint").text("  Your   email "));
        doc.append_element(body, ElementSpec::new("label").attr("for", "email").text("Email address"));
        let labelled = doc.append_element(
            body,
            boxed(ElementSpec::new("input").attr("aria-labelledby", "hint missing").attr("placeholder", "x")),
        );
        let by_for = doc.append_element(
            body,
            boxed(ElementSpec::new("input").attr("id", "email").attr("placeholder", "name@host")),
        );
        let by_placeholder = doc.append_element(body, boxed(ElementSpec::new("input").attr("placeholder", "Search")));
        let aria = doc.append_element(
            body,
            boxed(ElementSpec::new("a").attr("aria-label", "Home").attr("title", "Go home").text("H")),
        );

        assert_eq!(build(&doc, labelled).unwrap().label, "Your email");
        assert_eq!(build(&doc, by_for).unwrap().label, "Email address");
        assert_eq!(build(&doc, by_placeholder).unwrap().label, "Search");
        assert_eq!(build(&doc, aria).unwrap().label, "Home");
    }

    #[test]
    fn test_long_text_is_not_a_label() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let wall = "lorem ipsum ".repeat(30);
        let node = doc.append_element(body, boxed(ElementSpec::new("div").attr("onclick", "go()").text(wall)));
        assert_eq!(build(&doc, node).unwrap().label, "");

        let titled = "word ".repeat(30);
        let node = doc.append_element(body, boxed(ElementSpec::new("a").attr("href", "#").text(titled)));
        let label = build(&doc, node).unwrap().label;
        assert_eq!(label.chars().count(), 80);
    }

    #[test]
    fn test_state_snapshot() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let select = doc.append_element(body, boxed(ElementSpec::new("select").attr("disabled", "")));
        doc.append_element(select, ElementSpec::new("option").attr("value", "us").text("United States"));
        doc.append_element(select, ElementSpec::new("option").attr("value", "de").attr("selected", "").text("Germany"));
        let input = doc.append_element(
            body,
            boxed(ElementSpec::new("input").attr("value", "hello").attr("readonly", "")),
        );
        let menu = doc.append_element(
            body,
            boxed(ElementSpec::new("button").attr("aria-expanded", "false").attr("aria-disabled", "true")),
        );

        let s = build(&doc, select).unwrap().state;
        assert_eq!(s.value.as_deref(), Some("de"));
        assert_eq!(s.selected.as_deref(), Some("Germany"));
        assert_eq!(s.disabled, Some(true));
        assert_eq!(s.expanded, None);

        let s = build(&doc, input).unwrap().state;
        assert_eq!(s.value.as_deref(), Some("hello"));
        assert_eq!(s.readonly, Some(true));
        assert_eq!(s.checked, None);

        let s = build(&doc, menu).unwrap().state;
        assert_eq!(s.expanded, Some(false));
        assert_eq!(s.disabled, Some(true));
        assert_eq!(s.readonly, None);
    }

    #[test]
    fn test_skips_are_explicit() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let body = doc.body_id();
        let hidden = doc.append_element(
            body,
            boxed(ElementSpec::new("button").style(StyleDecl::visibility("hidden"))),
        );
        let gone = doc.append_element(body, boxed(ElementSpec::new("button")));
        doc.detach(gone).unwrap();

        let skipped = build(&doc, hidden).unwrap_err();
        assert!(matches!(
            skipped.reason,
            SkipReason::Rejected(Rejection::VisibilityHidden)
        ));
        let skipped = build(&doc, gone).unwrap_err();
        assert!(matches!(skipped.reason, SkipReason::Failed(PageError::Dom(_))));
        assert!(skipped.to_string().contains("failed"));
    }
}
