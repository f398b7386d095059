//! Computed and declared style

use serde::{Deserialize, Serialize};

/// The subset of computed style the classifier and text walk look at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputedStyle {
    pub display: String,
    pub visibility: String,
    /// Effective opacity, already multiplied through ancestors
    pub opacity: f64,
    pub pointer_events: String,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: "block".to_string(),
            visibility: "visible".to_string(),
            opacity: 1.0,
            pointer_events: "auto".to_string(),
        }
    }
}

impl ComputedStyle {
    pub fn is_display_none(&self) -> bool {
        self.display == "none"
    }

    pub fn is_visibility_hidden(&self) -> bool {
        matches!(self.visibility.as_str(), "hidden" | "collapse")
    }

    pub fn pointer_events_disabled(&self) -> bool {
        self.pointer_events == "none"
    }

    /// Hidden for the purpose of reading text
    pub fn is_hidden(&self) -> bool {
        self.is_display_none() || self.is_visibility_hidden()
    }
}

/// Style declared directly on an element; unset fields inherit or default
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleDecl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        alias = "pointerEvents",
        alias = "pointer-events"
    )]
    pub pointer_events: Option<String>,
}

impl StyleDecl {
    pub fn display(value: impl Into<String>) -> Self {
        Self {
            display: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn visibility(value: impl Into<String>) -> Self {
        Self {
            visibility: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn opacity(value: f64) -> Self {
        Self {
            opacity: Some(value),
            ..Default::default()
        }
    }

    pub fn pointer_events(value: impl Into<String>) -> Self {
        Self {
            pointer_events: Some(value.into()),
            ..Default::default()
        }
    }
}
