//! In-memory document
//!
//! An arena-backed [`Document`] whose geometry and style are stated up front
//! instead of computed by a layout engine. Pages come either from the builder
//! methods or from a JSON [`PageFixture`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{PageError, Rect, Result, ScrollState, Viewport};
use crate::dom::{
    ChildNode, ComputedStyle, Document, NodeId, OverlayElement, StyleDecl, OVERLAY_ATTR,
    OVERLAY_ORDINAL_ATTR,
};

/// Tags that are `display: none` unless told otherwise
const HIDDEN_BY_DEFAULT: &[&str] = &[
    "head", "script", "style", "meta", "link", "title", "template", "noscript",
];

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attributes: Vec<(String, String)>,
    rect: Rect,
    style: StyleDecl,
}

#[derive(Debug, Clone)]
enum NodeKind {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attached: bool,
}

/// Builder input for one element
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    rect: Rect,
    style: StyleDecl,
    text: Option<String>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        self.attributes.retain(|(n, _)| *n != name);
        self.attributes.push((name, value.into()));
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn style(mut self, style: StyleDecl) -> Self {
        self.style = style;
        self
    }

    /// Append a text child
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }
}

/// JSON description of a page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageFixture {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub scroll: ScrollState,
    #[serde(default)]
    pub head: Vec<FixtureNode>,
    /// Children of `<body>`
    #[serde(default)]
    pub body: Vec<FixtureNode>,
}

fn default_url() -> String {
    "about:blank".to_string()
}

/// A fixture child: bare strings are text nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureNode {
    Text(String),
    Element(FixtureElement),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureElement {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub style: StyleDecl,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub children: Vec<FixtureNode>,
}

/// Arena-backed document
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    url: String,
    title: String,
    viewport: Viewport,
    scroll: ScrollState,
    nodes: Vec<NodeData>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
}

impl MemoryDocument {
    /// Create an empty `html > head + body` document
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let viewport = Viewport::default();
        let mut doc = Self {
            url: url.into(),
            title: title.into(),
            viewport,
            scroll: ScrollState::default(),
            nodes: Vec::new(),
            root: NodeId::new(0),
            head: NodeId::new(0),
            body: NodeId::new(0),
            focused: None,
        };
        let page = Rect::new(0.0, 0.0, viewport.width as f64, viewport.height as f64);
        doc.root = doc.push_node(None, element("html", page));
        doc.head = doc.push_node(Some(doc.root), element("head", Rect::default()));
        doc.body = doc.push_node(Some(doc.root), element("body", page));
        doc
    }

    /// Parse a JSON fixture string
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: PageFixture = serde_json::from_str(json)?;
        Self::from_fixture(fixture)
    }

    /// Load a JSON fixture from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Build a document from a parsed fixture
    pub fn from_fixture(fixture: PageFixture) -> Result<Self> {
        let url = url::Url::parse(&fixture.url)?;
        let mut doc = Self::new(url.to_string(), fixture.title).with_viewport(fixture.viewport);
        doc.scroll = fixture.scroll;

        let mut focused = Vec::new();
        let (head, body) = (doc.head, doc.body);
        for child in &fixture.head {
            doc.insert_fixture(head, child, &mut focused)?;
        }
        for child in &fixture.body {
            doc.insert_fixture(body, child, &mut focused)?;
        }
        if focused.len() > 1 {
            return Err(PageError::fixture(format!(
                "{} elements are marked focused",
                focused.len()
            )));
        }
        doc.focused = focused.pop();
        Ok(doc)
    }

    fn insert_fixture(
        &mut self,
        parent: NodeId,
        node: &FixtureNode,
        focused: &mut Vec<NodeId>,
    ) -> Result<()> {
        match node {
            FixtureNode::Text(text) => {
                self.append_text(parent, text.clone());
            }
            FixtureNode::Element(el) => {
                let tag = el.tag.trim().to_ascii_lowercase();
                if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    return Err(PageError::fixture(format!("invalid tag name {:?}", el.tag)));
                }
                let mut spec = ElementSpec::new(tag).style(el.style.clone());
                if let Some(rect) = el.rect {
                    spec = spec.rect(rect);
                }
                for (name, value) in &el.attrs {
                    spec = spec.attr(name.clone(), value.clone());
                }
                let id = self.append_element(parent, spec);
                if el.focused {
                    focused.push(id);
                }
                for child in &el.children {
                    self.insert_fixture(id, child, focused)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the viewport; root and body boxes follow it
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        let page = Rect::new(0.0, 0.0, viewport.width as f64, viewport.height as f64);
        for id in [self.root, self.body] {
            if let Some(el) = self.element_mut(id) {
                el.rect = page;
            }
        }
        self
    }

    pub fn set_scroll(&mut self, scroll: ScrollState) {
        self.scroll = scroll;
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    /// Append an element (and its text, if any) under `parent`
    pub fn append_element(&mut self, parent: NodeId, spec: ElementSpec) -> NodeId {
        let text = spec.text.clone();
        let id = self.push_node(
            Some(parent),
            NodeKind::Element(ElementData {
                tag: spec.tag,
                attributes: spec.attributes,
                rect: spec.rect,
                style: spec.style,
            }),
        );
        if let Some(text) = text {
            self.append_text(id, text);
        }
        id
    }

    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> NodeId {
        self.push_node(Some(parent), NodeKind::Text(text.into()))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            let name = name.to_ascii_lowercase();
            let value = value.into();
            match el.attributes.iter_mut().find(|(n, _)| *n == name) {
                Some(slot) => slot.1 = value,
                None => el.attributes.push((name, value)),
            }
        }
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let Some(el) = self.element_mut(node) {
            el.attributes.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        }
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        if let Some(el) = self.element_mut(node) {
            el.rect = rect;
        }
    }

    pub fn set_style(&mut self, node: NodeId, style: StyleDecl) {
        if let Some(el) = self.element_mut(node) {
            el.style = style;
        }
    }

    /// Give keyboard focus to `node`; `None` returns focus to the body
    pub fn focus(&mut self, node: Option<NodeId>) {
        self.focused = node;
    }

    /// Nodes inserted by the overlay layer that are still attached
    pub fn overlay_nodes(&self) -> Vec<NodeId> {
        self.descendants(self.body)
            .into_iter()
            .filter(|&n| self.has_attribute(n, OVERLAY_ATTR))
            .collect()
    }

    /// Detach `node` and its subtree from the document
    pub fn detach(&mut self, node: NodeId) -> Result<()> {
        let (attached, parent) = self
            .nodes
            .get(node.index())
            .map(|data| (data.attached, data.parent))
            .ok_or(PageError::NodeNotFound(node))?;
        if !attached {
            return Err(PageError::dom(format!("node {} is already detached", node)));
        }
        if node == self.root {
            return Err(PageError::dom("cannot detach the document element"));
        }
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.retain(|&c| c != node);
        }
        self.nodes[node.index()].parent = None;

        let mut stack = vec![node];
        while let Some(n) = stack.pop() {
            let data = &mut self.nodes[n.index()];
            data.attached = false;
            stack.extend(data.children.iter().copied());
        }
        if self.focused.is_some_and(|f| !self.nodes[f.index()].attached) {
            self.focused = None;
        }
        Ok(())
    }

    fn push_node(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let attached = parent.map_or(true, |p| self.nodes[p.index()].attached);
        self.nodes.push(NodeData {
            kind,
            parent,
            children: Vec::new(),
            attached,
        });
        if let Some(p) = parent {
            self.nodes[p.index()].children.push(id);
        }
        id
    }

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.nodes.get(node.index()).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(node.index()).map(|n| &mut n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn live_element(&self, node: NodeId) -> Result<&ElementData> {
        let data = self
            .nodes
            .get(node.index())
            .ok_or(PageError::NodeNotFound(node))?;
        if !data.attached {
            return Err(PageError::dom(format!("node {} is detached", node)));
        }
        self.element(node).ok_or(PageError::NodeNotFound(node))
    }

    /// Element chain from the root down to `node`, inclusive
    fn lineage(&self, node: NodeId) -> Vec<&ElementData> {
        let mut chain = Vec::new();
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(el) = self.element(n) {
                chain.push(el);
            }
            current = self.nodes.get(n.index()).and_then(|d| d.parent);
        }
        chain.reverse();
        chain
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        if let Some(data) = self.nodes.get(node.index()) {
            match &data.kind {
                NodeKind::Text(text) => out.push_str(text),
                NodeKind::Element(_) => {
                    for &child in &data.children {
                        self.collect_text(child, out);
                    }
                }
            }
        }
    }
}

fn element(tag: &str, rect: Rect) -> NodeKind {
    NodeKind::Element(ElementData {
        tag: tag.to_string(),
        attributes: Vec::new(),
        rect,
        style: StyleDecl::default(),
    })
}

fn own_display(el: &ElementData) -> &str {
    match el.style.display.as_deref() {
        Some(display) => display,
        None if HIDDEN_BY_DEFAULT.contains(&el.tag.as_str()) => "none",
        None => "block",
    }
}

impl Document for MemoryDocument {
    fn url(&self) -> String {
        self.url.clone()
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn scroll(&self) -> ScrollState {
        self.scroll
    }

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn active_element(&self) -> Option<NodeId> {
        Some(self.focused.unwrap_or(self.body))
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.element(node).map(|el| el.tag.clone())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.element(node).and_then(|el| {
            el.attributes
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.clone())
        })
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes
            .get(node.index())
            .and_then(|d| d.parent)
            .filter(|&p| self.element(p).is_some())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.index())
            .map(|d| {
                d.children
                    .iter()
                    .copied()
                    .filter(|&c| self.element(c).is_some())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn child_nodes(&self, node: NodeId) -> Vec<ChildNode> {
        self.nodes
            .get(node.index())
            .map(|d| {
                d.children
                    .iter()
                    .filter_map(|&c| match &self.nodes[c.index()].kind {
                        NodeKind::Element(_) => Some(ChildNode::Element(c)),
                        NodeKind::Text(t) => Some(ChildNode::Text(t.clone())),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn bounding_rect(&self, node: NodeId) -> Result<Rect> {
        let el = self.live_element(node)?;
        let lineage = self.lineage(node);
        if lineage.iter().any(|e| own_display(e) == "none") {
            return Ok(Rect::default());
        }
        Ok(el.rect)
    }

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle> {
        let el = self.live_element(node)?;
        let lineage = self.lineage(node);
        let ancestors = &lineage[..lineage.len().saturating_sub(1)];

        let display = if ancestors.iter().any(|e| own_display(e) == "none") {
            "none".to_string()
        } else {
            own_display(el).to_string()
        };
        let visibility = lineage
            .iter()
            .rev()
            .find_map(|e| e.style.visibility.clone())
            .unwrap_or_else(|| "visible".to_string());
        let pointer_events = lineage
            .iter()
            .rev()
            .find_map(|e| e.style.pointer_events.clone())
            .unwrap_or_else(|| "auto".to_string());
        let opacity = lineage
            .iter()
            .map(|e| e.style.opacity.unwrap_or(1.0).clamp(0.0, 1.0))
            .product();

        Ok(ComputedStyle {
            display,
            visibility,
            opacity,
            pointer_events,
        })
    }

    fn text_content(&self, node: NodeId) -> Result<String> {
        self.live_element(node)?;
        let mut out = String::new();
        self.collect_text(node, &mut out);
        Ok(out)
    }

    fn append_overlay(&mut self, overlay: &OverlayElement) -> Result<NodeId> {
        let mut spec = ElementSpec::new("div")
            .attr(OVERLAY_ATTR, overlay.kind.as_str())
            .attr(OVERLAY_ORDINAL_ATTR, overlay.ordinal.to_string())
            .attr("style", overlay.inline_style())
            .rect(overlay.rect)
            .style(StyleDecl::pointer_events("none"));
        if let Some(text) = &overlay.text {
            spec = spec.text(text.clone());
        }
        Ok(self.append_element(self.body, spec))
    }

    fn remove_node(&mut self, node: NodeId) -> Result<()> {
        self.detach(node)
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(index, data)| match &data.kind {
            NodeKind::Element(el)
                if data.attached
                    && el.attributes.iter().any(|(n, v)| n == "id" && v == id) =>
            {
                Some(NodeId::new(index))
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "url": "https://shop.example.com/cart",
        "title": "Cart",
        "viewport": { "width": 800, "height": 600 },
        "scroll": { "x": 0, "y": 120, "maxX": 0, "maxY": 2400 },
        "head": [ { "tag": "script", "children": ["var x = 1;"] } ],
        "body": [
            { "tag": "div", "style": { "opacity": 0.5, "visibility": "hidden" },
              "children": [
                { "tag": "button", "attrs": { "id": "buy" },
                  "rect": { "x": 10, "y": 10, "width": 80, "height": 30 },
                  "style": { "opacity": 0.5, "pointerEvents": "none" },
                  "focused": true,
                  "children": ["Buy now"] }
              ] },
            { "tag": "section", "style": { "display": "none" },
              "children": [
                { "tag": "a", "attrs": { "href": "/x" },
                  "rect": { "x": 0, "y": 0, "width": 50, "height": 20 } }
              ] },
            "loose text"
        ]
    }"#;

    #[test]
    fn test_fixture_loading() {
        let doc = MemoryDocument::from_json(FIXTURE).unwrap();
        assert_eq!(doc.url(), "https://shop.example.com/cart");
        assert_eq!(doc.viewport().width, 800);
        assert_eq!(doc.scroll().max_y, 2400);

        let buy = doc.element_by_id("buy").unwrap();
        assert_eq!(doc.active_element(), Some(buy));
        assert_eq!(doc.text_content(buy).unwrap(), "Buy now");
        assert_eq!(doc.tag_name(buy).as_deref(), Some("button"));
    }

    #[test]
    fn test_style_inheritance() {
        let doc = MemoryDocument::from_json(FIXTURE).unwrap();
        let buy = doc.element_by_id("buy").unwrap();
        let style = doc.computed_style(buy).unwrap();
        assert_eq!(style.visibility, "hidden");
        assert_eq!(style.pointer_events, "none");
        assert!((style.opacity - 0.25).abs() < 1e-9);
        assert_eq!(style.display, "block");

        let link = doc.query_selector_all("a[href]").unwrap()[0];
        assert_eq!(doc.computed_style(link).unwrap().display, "none");
        assert_eq!(doc.bounding_rect(link).unwrap(), Rect::default());

        let script = doc.query_selector_all("script").unwrap()[0];
        assert!(doc.computed_style(script).unwrap().is_display_none());
    }

    #[test]
    fn test_detached_nodes_fail_live_reads() {
        let mut doc = MemoryDocument::from_json(FIXTURE).unwrap();
        let buy = doc.element_by_id("buy").unwrap();
        doc.detach(buy).unwrap();

        assert!(matches!(doc.bounding_rect(buy), Err(PageError::Dom(_))));
        assert!(matches!(doc.computed_style(buy), Err(PageError::Dom(_))));
        assert!(doc.element_by_id("buy").is_none());
        assert_eq!(doc.active_element(), Some(doc.body_id()));
        assert!(doc.detach(buy).is_err());
    }

    #[test]
    fn test_overlay_nodes_tracked() {
        let mut doc = MemoryDocument::new("about:blank", "");
        let overlay = OverlayElement {
            kind: crate::dom::OverlayKind::Badge,
            ordinal: 3,
            rect: Rect::new(1.0, 2.0, 20.0, 16.0),
            color: "#e6194b".to_string(),
            text: Some("3".to_string()),
            z_index: 10,
        };
        let node = doc.append_overlay(&overlay).unwrap();
        assert_eq!(doc.overlay_nodes(), vec![node]);
        assert_eq!(doc.text_content(node).unwrap(), "3");
        assert!(doc.is_overlay(node));
        assert!(doc
            .attribute(node, "style")
            .unwrap()
            .contains("pointer-events:none"));

        doc.remove_node(node).unwrap();
        assert!(doc.overlay_nodes().is_empty());
    }

    #[test]
    fn test_invalid_fixtures() {
        assert!(matches!(
            MemoryDocument::from_json(r#"{ "url": "not a url" }"#),
            Err(PageError::Url(_))
        ));
        assert!(matches!(
            MemoryDocument::from_json(r#"{ "body": [ { "tag": "" } ] }"#),
            Err(PageError::Fixture(_))
        ));
        assert!(matches!(
            MemoryDocument::from_json(
                r#"{ "body": [ { "tag": "input", "focused": true }, { "tag": "a", "focused": true } ] }"#
            ),
            Err(PageError::Fixture(_))
        ));
        assert!(matches!(
            MemoryDocument::from_json("{ not json"),
            Err(PageError::Json(_))
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.json");
        fs::write(&path, FIXTURE).unwrap();
        let doc = MemoryDocument::load(&path).unwrap();
        assert_eq!(doc.title(), "Cart");
        assert!(MemoryDocument::load(dir.path().join("missing.json")).is_err());
    }
}
