//! Document port
//!
//! Everything pagemark knows about a page goes through the [`Document`] trait:
//! structural reads, live geometry and style, and a thin overlay layer for
//! annotations. [`MemoryDocument`] is the in-process backend used by the CLI
//! and the tests; a browser-backed implementation only needs the required
//! methods, the rest have attribute-derived defaults.

mod memory;
pub mod selector;
mod style;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{PageError, Rect, Result, ScrollState, Viewport};

pub use memory::{ElementSpec, FixtureElement, FixtureNode, MemoryDocument, PageFixture};
pub use selector::{css_escape, quote_attr, SelectorList};
pub use style::{ComputedStyle, StyleDecl};

/// Attribute carried by every node pagemark itself inserts
pub const OVERLAY_ATTR: &str = "data-pagemark-overlay";

/// Attribute carrying the ordinal an overlay node belongs to
pub const OVERLAY_ORDINAL_ATTR: &str = "data-pagemark-ordinal";

/// Opaque handle identifying one node of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Wrap a backend-specific node index
    pub fn new(raw: usize) -> Self {
        Self(raw)
    }

    /// Backend-specific node index
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A child of an element: either another element or a run of text
#[derive(Debug, Clone, PartialEq)]
pub enum ChildNode {
    Element(NodeId),
    Text(String),
}

/// Which half of an annotation an overlay node is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKind {
    Frame,
    Badge,
}

impl OverlayKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OverlayKind::Frame => "frame",
            OverlayKind::Badge => "badge",
        }
    }
}

/// Description of one overlay node to be inserted into the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayElement {
    pub kind: OverlayKind,
    pub ordinal: usize,
    pub rect: Rect,
    pub color: String,
    /// Badge caption; frames carry none
    pub text: Option<String>,
    pub z_index: i64,
}

impl OverlayElement {
    /// Inline CSS a live backend applies to the inserted node
    pub fn inline_style(&self) -> String {
        let mut css = format!(
            "position:fixed;left:{}px;top:{}px;width:{}px;height:{}px;\
             pointer-events:none;z-index:{};box-sizing:border-box;",
            self.rect.x, self.rect.y, self.rect.width, self.rect.height, self.z_index
        );
        match self.kind {
            OverlayKind::Frame => {
                css.push_str(&format!(
                    "border:2px solid {c};background-color:{c}1a;",
                    c = self.color
                ));
            }
            OverlayKind::Badge => {
                css.push_str(&format!(
                    "background-color:{};color:#fff;font:bold 11px/16px monospace;\
                     padding:0 3px;border-radius:2px;",
                    self.color
                ));
            }
        }
        css
    }
}

/// Read access to a live document plus the overlay layer.
///
/// Structural reads are infallible: a node that is not an element simply has
/// no tag and no attributes. Geometry, style and text reads can fail when the
/// page mutates underneath the caller.
pub trait Document {
    fn url(&self) -> String;

    fn title(&self) -> String;

    fn viewport(&self) -> Viewport;

    fn scroll(&self) -> ScrollState;

    /// Root `html` element
    fn document_element(&self) -> Option<NodeId>;

    fn body(&self) -> Option<NodeId>;

    /// Element that currently has keyboard focus
    fn active_element(&self) -> Option<NodeId>;

    /// Lower-case tag name, `None` for anything that is not an element
    fn tag_name(&self, node: NodeId) -> Option<String>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Parent element
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Element children in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Element and text children in document order
    fn child_nodes(&self, node: NodeId) -> Vec<ChildNode>;

    fn bounding_rect(&self, node: NodeId) -> Result<Rect>;

    fn computed_style(&self, node: NodeId) -> Result<ComputedStyle>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self, node: NodeId) -> Result<String>;

    /// Insert an annotation node and return its handle
    fn append_overlay(&mut self, overlay: &OverlayElement) -> Result<NodeId>;

    /// Remove a node from the document
    fn remove_node(&mut self, node: NodeId) -> Result<()>;

    fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.attribute(node, name).is_some()
    }

    /// Descendant elements of `root` in document order, excluding `root`
    fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).into_iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// Every element of the document in document order
    fn all_elements(&self) -> Vec<NodeId> {
        match self.document_element() {
            Some(root) => {
                let mut out = vec![root];
                out.extend(self.descendants(root));
                out
            }
            None => Vec::new(),
        }
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.all_elements()
            .into_iter()
            .find(|&node| self.attribute(node, "id").as_deref() == Some(id))
    }

    /// Elements matching `selector` in document order
    fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let list = SelectorList::parse(selector)?;
        Ok(self
            .all_elements()
            .into_iter()
            .filter(|&node| list.matches(self, node))
            .collect())
    }

    /// Current value of a form control
    fn value(&self, node: NodeId) -> Option<String> {
        match self.tag_name(node).as_deref() {
            Some("select") => self.selected_option(node).and_then(|option| {
                self.attribute(option, "value")
                    .or_else(|| self.text_content(option).ok().map(|t| t.trim().to_string()))
            }),
            Some("textarea") => self
                .attribute(node, "value")
                .or_else(|| self.text_content(node).ok()),
            _ => self.attribute(node, "value"),
        }
    }

    fn is_checked(&self, node: NodeId) -> bool {
        self.has_attribute(node, "checked")
    }

    fn is_disabled(&self, node: NodeId) -> bool {
        self.has_attribute(node, "disabled")
    }

    fn is_read_only(&self, node: NodeId) -> bool {
        self.has_attribute(node, "readonly")
    }

    /// Whether the node sits inside an editable-content region
    fn is_content_editable(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if let Some(value) = self.attribute(n, "contenteditable") {
                return !value.eq_ignore_ascii_case("false");
            }
            current = self.parent(n);
        }
        false
    }

    /// Option currently chosen in a `<select>`
    fn selected_option(&self, node: NodeId) -> Option<NodeId> {
        let options: Vec<NodeId> = self
            .descendants(node)
            .into_iter()
            .filter(|&n| self.tag_name(n).as_deref() == Some("option"))
            .collect();
        options
            .iter()
            .copied()
            .find(|&n| self.has_attribute(n, "selected"))
            .or_else(|| options.first().copied())
    }

    fn selected_option_text(&self, node: NodeId) -> Option<String> {
        self.selected_option(node)
            .and_then(|option| self.text_content(option).ok())
            .map(|text| text.trim().to_string())
    }

    /// Whether the node or one of its ancestors was inserted by pagemark
    fn is_overlay(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.has_attribute(n, OVERLAY_ATTR) {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Require `node` to be an element of this document
    fn expect_element(&self, node: NodeId) -> Result<String> {
        self.tag_name(node).ok_or(PageError::NodeNotFound(node))
    }
}
