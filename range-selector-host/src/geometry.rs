//! Layout geometry reported by the host document.
//!
//! Coordinates are CSS pixels with the origin at the top-left corner of the
//! document; x grows to the right, y grows downward. Values are `f64` because
//! label placement works with half-pixel offsets.

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Distance from the document's left edge.
    pub left: f64,
    /// Distance from the document's top edge.
    pub top: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// An empty box at the origin.
    pub const ZERO: Self = Self {
        left: 0.0,
        top: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Creates a box from its left/top corner and size.
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    /// Expresses this box relative to `origin`'s top-left corner.
    pub fn relative_to(&self, origin: &Rect) -> Self {
        Self {
            left: self.left - origin.left,
            top: self.top - origin.top,
            ..*self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Rect;

    #[test]
    fn relative_box_keeps_size() {
        let container = Rect::new(40.0, 10.0, 300.0, 50.0);
        let track = Rect::new(60.0, 30.0, 260.0, 4.0);
        let relative = track.relative_to(&container);
        assert_eq!(relative, Rect::new(20.0, 20.0, 260.0, 4.0));
        assert_eq!(relative.right(), 280.0);
    }
}
