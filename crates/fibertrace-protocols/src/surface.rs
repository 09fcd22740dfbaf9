//! Native surface contracts: point queries, element geometry, input
//! subscriptions and the highlight drawing surface.

use serde::{Deserialize, Serialize};

use crate::node::ElementHandle;

/// Axis-aligned rectangle in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Half-open containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Input streams a selection session subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    PointerMove,
    Click,
    KeyDown,
    Resize,
}

/// Subscription token returned by `HostSurface::listen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// The platform's element tree as seen from the engine.
pub trait HostSurface: Send + Sync {
    /// Topmost hittable element at a viewport coordinate.
    fn element_at_point(&self, x: f64, y: f64) -> Option<ElementHandle>;

    fn parent_element(&self, element: ElementHandle) -> Option<ElementHandle>;

    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect>;

    /// Whether the element is still part of the document.
    fn is_attached(&self, element: ElementHandle) -> bool;

    /// Whether the element belongs to the engine's own overlay.
    fn is_overlay(&self, element: ElementHandle) -> bool;

    fn listen(&self, kind: InputKind) -> ListenerId;

    fn unlisten(&self, id: ListenerId);
}

/// Externally supplied drawing surface for the highlight box.
pub trait HighlightSurface: Send + Sync {
    fn draw_highlight(&self, rect: Rect, label: &str);

    fn clear_highlight(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert!(rect.contains(10.0, 10.0));
        assert!(rect.contains(50.0, 30.0));
        assert!(!rect.contains(110.0, 30.0));
        assert!(!rect.contains(50.0, 60.0));
        assert!(!rect.contains(5.0, 30.0));
    }

    #[test]
    fn test_rect_empty() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }
}
