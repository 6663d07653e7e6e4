//! Document-space boxes and the viewport they are seen through
//!
//! All coordinates are CSS pixels from the top of the document.

use serde::{Deserialize, Serialize};

/// Element bounds in document coordinates (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
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

    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Same rect relative to the viewport when the page is scrolled by `scroll_y`
    pub fn in_viewport_space(&self, scroll_y: f64) -> Rect {
        Rect { y: self.y - scroll_y, ..*self }
    }
}

/// Visible browser area (px)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280.0, 800.0)
    }
}

/// Fraction (0.0..=1.0) of `element` that is on-screen at `scroll_y`
///
/// Zero-area elements count as fully visible when their origin is on-screen.
pub fn visible_fraction(element: Rect, scroll_y: f64, viewport: Viewport) -> f64 {
    let rect = element.in_viewport_space(scroll_y);
    let screen = viewport.bounds();

    let overlap_w = (rect.right().min(screen.right()) - rect.left().max(screen.left())).max(0.0);
    let overlap_h = (rect.bottom().min(screen.bottom()) - rect.top().max(screen.top())).max(0.0);

    let area = rect.width * rect.height;
    if area <= 0.0 {
        let origin_visible = rect.left() >= screen.left()
            && rect.left() <= screen.right()
            && rect.top() >= screen.top()
            && rect.top() <= screen.bottom();
        return if origin_visible { 1.0 } else { 0.0 };
    }

    (overlap_w * overlap_h / area).clamp(0.0, 1.0)
}

/// True when `element` lies entirely inside the viewport at `scroll_y`
pub fn is_in_viewport(element: Rect, scroll_y: f64, viewport: Viewport) -> bool {
    let rect = element.in_viewport_space(scroll_y);
    rect.top() >= 0.0
        && rect.left() >= 0.0
        && rect.bottom() <= viewport.height
        && rect.right() <= viewport.width
}
