//! Shared types used across pagemark modules
//!
//! Contains geometry primitives, element descriptors and the snapshot record
//! returned by an analysis pass.

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

/// Raw viewport-relative rectangle as reported by the document
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Integer-rounded copy of this rectangle
    pub fn rounded(&self) -> BoundingBox {
        BoundingBox {
            x: self.x.round() as i64,
            y: self.y.round() as i64,
            width: self.width.round() as i64,
            height: self.height.round() as i64,
        }
    }

    /// Midpoint of the rounded box
    pub fn center(&self) -> Point {
        self.rounded().center()
    }
}

/// Integer-rounded element box reported in snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl BoundingBox {
    /// Integer-rounded midpoint
    pub fn center(&self) -> Point {
        Point {
            x: (self.x as f64 + self.width as f64 / 2.0).round() as i64,
            y: (self.y as f64 + self.height as f64 / 2.0).round() as i64,
        }
    }
}

/// Integer point, used as a click target hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Visible viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Current scroll offsets and their maxima
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollState {
    pub x: i64,
    pub y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

/// Action verbs an element supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Click,
    Fill,
    Clear,
    Select,
    Check,
    Uncheck,
    Upload,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Click => write!(f, "click"),
            Action::Fill => write!(f, "fill"),
            Action::Clear => write!(f, "clear"),
            Action::Select => write!(f, "select"),
            Action::Check => write!(f, "check"),
            Action::Uncheck => write!(f, "uncheck"),
            Action::Upload => write!(f, "upload"),
        }
    }
}

/// Sparse snapshot of an element's dynamic state.
///
/// An absent field means "not applicable", never "false".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readonly: Option<bool>,
}

impl ElementState {
    /// Whether no dynamic attribute applies
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One discovered interactive element
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementDescriptor {
    /// 1-based position within the snapshot
    pub ordinal: usize,
    /// Locator that resolves to at least this element
    pub selector: String,
    /// Coarse kind, e.g. `button` or `input[checkbox]`
    pub semantic_type: String,
    /// Human-readable name, possibly empty
    pub label: String,
    pub bounding_box: BoundingBox,
    pub center: Point,
    pub available_actions: Vec<Action>,
    #[serde(default)]
    pub state: ElementState,
    /// Live node this descriptor was built from; unset after deserialization
    #[serde(skip)]
    pub node: Option<NodeId>,
}

impl ElementDescriptor {
    /// Whether the element supports the given action
    pub fn supports(&self, action: Action) -> bool {
        self.available_actions.contains(&action)
    }
}

/// One complete ordered capture of a document's interactive surface
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub url: String,
    pub title: String,
    pub viewport: Viewport,
    pub scroll: ScrollState,
    pub elements: Vec<ElementDescriptor>,
    pub focused_ordinal: Option<usize>,
}

impl AnalysisResult {
    /// Look up a descriptor by ordinal
    pub fn element(&self, ordinal: usize) -> Option<&ElementDescriptor> {
        ordinal
            .checked_sub(1)
            .and_then(|index| self.elements.get(index))
    }

    /// Number of discovered elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether nothing actionable was found
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}
