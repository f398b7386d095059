//! Overlay annotator
//!
//! Draws a numbered frame over every element of the cached snapshot and keeps
//! the inserted nodes in a registry keyed by ordinal, so a later `unmark`
//! can release exactly what `mark` created.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::core::config::OverlayConfig;
use crate::core::{ElementDescriptor, Rect};
use crate::dom::{Document, NodeId, OverlayElement, OverlayKind};

/// Used only when the configured palette is empty
const FALLBACK_COLOR: &str = "#ff0000";

/// Where a badge sits relative to its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgePlacement {
    AboveLeft,
    /// Frame hugs the top edge of the viewport
    Below,
    /// Frame hugs the left edge of the viewport
    Right,
    BelowRight,
}

/// Nodes inserted for one ordinal
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayRecord {
    pub frame: Option<NodeId>,
    pub badge: Option<NodeId>,
    pub placement: BadgePlacement,
}

impl OverlayRecord {
    fn nodes(&self) -> impl Iterator<Item = NodeId> {
        self.badge.into_iter().chain(self.frame)
    }
}

#[derive(Debug, Clone)]
pub struct OverlayAnnotator {
    config: OverlayConfig,
    registry: BTreeMap<usize, OverlayRecord>,
}

impl OverlayAnnotator {
    pub fn new(config: OverlayConfig) -> Self {
        Self {
            config,
            registry: BTreeMap::new(),
        }
    }

    pub fn is_marked(&self) -> bool {
        !self.registry.is_empty()
    }

    /// Number of overlay nodes currently registered
    pub fn node_count(&self) -> usize {
        self.registry.values().map(|r| r.nodes().count()).sum()
    }

    pub fn record(&self, ordinal: usize) -> Option<&OverlayRecord> {
        self.registry.get(&ordinal)
    }

    /// Annotate `elements`, replacing any earlier annotation
    pub fn mark<D: Document + ?Sized>(&mut self, doc: &mut D, elements: &[ElementDescriptor]) {
        self.unmark(doc);

        for element in elements {
            let frame_rect = Rect::new(
                element.bounding_box.x as f64,
                element.bounding_box.y as f64,
                element.bounding_box.width as f64,
                element.bounding_box.height as f64,
            );
            let color = self.color(element.ordinal);
            let (badge_rect, placement) = self.badge_rect(&frame_rect, element.ordinal);

            let frame = self.insert(
                doc,
                OverlayElement {
                    kind: OverlayKind::Frame,
                    ordinal: element.ordinal,
                    rect: frame_rect,
                    color: color.clone(),
                    text: None,
                    z_index: self.config.z_index,
                },
            );
            let badge = self.insert(
                doc,
                OverlayElement {
                    kind: OverlayKind::Badge,
                    ordinal: element.ordinal,
                    rect: badge_rect,
                    color,
                    text: Some(element.ordinal.to_string()),
                    z_index: self.config.z_index,
                },
            );

            if frame.is_some() || badge.is_some() {
                self.registry.insert(
                    element.ordinal,
                    OverlayRecord {
                        frame,
                        badge,
                        placement,
                    },
                );
            }
        }
        debug!(
            elements = elements.len(),
            nodes = self.node_count(),
            "overlays drawn"
        );
    }

    /// Remove every registered overlay node; a no-op when nothing is marked
    pub fn unmark<D: Document + ?Sized>(&mut self, doc: &mut D) {
        let registry = std::mem::take(&mut self.registry);
        if registry.is_empty() {
            return;
        }
        let mut removed = 0;
        for (ordinal, record) in registry {
            for node in record.nodes() {
                match doc.remove_node(node) {
                    Ok(()) => removed += 1,
                    // already gone counts as removed
                    Err(e) => trace!(ordinal, %node, error = %e, "overlay removal ignored"),
                }
            }
        }
        debug!(removed, "overlays cleared");
    }

    fn insert<D: Document + ?Sized>(&self, doc: &mut D, overlay: OverlayElement) -> Option<NodeId> {
        doc.append_overlay(&overlay)
            .map_err(|e| {
                trace!(ordinal = overlay.ordinal, kind = overlay.kind.as_str(), error = %e, "overlay insert failed");
            })
            .ok()
    }

    fn color(&self, ordinal: usize) -> String {
        let palette = &self.config.palette;
        if palette.is_empty() {
            return FALLBACK_COLOR.to_string();
        }
        palette[ordinal % palette.len()].clone()
    }

    /// Badge box for a frame, flipped away from the top and left viewport edges
    pub fn badge_rect(&self, frame: &Rect, ordinal: usize) -> (Rect, BadgePlacement) {
        let digits = ordinal.to_string().len() as f64;
        let width = 6.0 + 7.0 * digits;
        let height = self.config.badge_height;

        let below = frame.y < self.config.edge_margin;
        let right = frame.x < self.config.edge_margin;
        let top = if below { frame.bottom() } else { frame.y - height };
        let left = if right { frame.right() } else { frame.x };

        let placement = match (below, right) {
            (false, false) => BadgePlacement::AboveLeft,
            (true, false) => BadgePlacement::Below,
            (false, true) => BadgePlacement::Right,
            (true, true) => BadgePlacement::BelowRight,
        };
        (Rect::new(left, top, width, height), placement)
    }
}
