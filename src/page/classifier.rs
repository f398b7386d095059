//! Interactivity classifier
//!
//! Decides from geometry and computed style alone whether a candidate is
//! actionable right now.

use std::fmt;

use crate::core::config::AnalyzerConfig;
use crate::core::{Rect, Viewport};
use crate::dom::ComputedStyle;

/// Tags that stay interactive even when a parent suppresses pointer events
const POINTER_EXEMPT_TAGS: &[&str] = &["input", "button", "a", "select", "textarea"];

/// Why a candidate was rejected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    TooSmall { width: f64, height: f64 },
    VisibilityHidden,
    DisplayNone,
    Transparent { opacity: f64 },
    PointerEventsNone,
    OutsideViewport,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::TooSmall { width, height } => {
                write!(f, "too small ({:.0}x{:.0})", width, height)
            }
            Rejection::VisibilityHidden => write!(f, "visibility hidden"),
            Rejection::DisplayNone => write!(f, "display none"),
            Rejection::Transparent { opacity } => write!(f, "opacity {:.2}", opacity),
            Rejection::PointerEventsNone => write!(f, "pointer events disabled"),
            Rejection::OutsideViewport => write!(f, "outside viewport"),
        }
    }
}

/// Geometry/style thresholds for classification
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    min_size: f64,
    min_opacity: f64,
    viewport_buffer: f64,
    viewport: Viewport,
}

impl Classifier {
    pub fn new(config: &AnalyzerConfig, viewport: Viewport) -> Self {
        Self {
            min_size: config.min_size,
            min_opacity: config.min_opacity,
            viewport_buffer: config.viewport_buffer,
            viewport,
        }
    }

    /// Classify a candidate, reporting the first failed check
    pub fn classify(&self, tag: &str, rect: &Rect, style: &ComputedStyle) -> Result<(), Rejection> {
        if rect.width < self.min_size || rect.height < self.min_size {
            return Err(Rejection::TooSmall {
                width: rect.width,
                height: rect.height,
            });
        }
        if style.is_visibility_hidden() {
            return Err(Rejection::VisibilityHidden);
        }
        if style.is_display_none() {
            return Err(Rejection::DisplayNone);
        }
        if style.opacity < self.min_opacity {
            return Err(Rejection::Transparent {
                opacity: style.opacity,
            });
        }
        if style.pointer_events_disabled() && !POINTER_EXEMPT_TAGS.contains(&tag) {
            return Err(Rejection::PointerEventsNone);
        }

        let buffer = self.viewport_buffer;
        let outside = rect.right() < -buffer
            || rect.bottom() < -buffer
            || rect.x > self.viewport.width as f64 + buffer
            || rect.y > self.viewport.height as f64 + buffer;
        if outside {
            return Err(Rejection::OutsideViewport);
        }
        Ok(())
    }

    pub fn is_actionable(&self, tag: &str, rect: &Rect, style: &ComputedStyle) -> bool {
        self.classify(tag, rect, style).is_ok()
    }
}
