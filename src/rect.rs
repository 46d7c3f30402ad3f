use crate::units::*;

/// An axis-aligned rectangle in page space, specified by its top-left and
/// bottom-right corners. The origin is the top-left corner of the page and y
/// grows downwards; [Rect::to_pdf] flips it into PDF user space.
///
/// `x0 <= x1` and `y0 <= y1` always hold for rectangles built with [Rect::new]
/// or derived from one.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Rect {
    /// Left edge
    pub x0: Pt,
    /// Top edge
    pub y0: Pt,
    /// Right edge
    pub x1: Pt,
    /// Bottom edge
    pub y1: Pt,
}

impl Rect {
    /// Create a rectangle from two opposite corners, in any order
    pub fn new<P: Into<Pt>>(x0: P, y0: P, x1: P, y1: P) -> Rect {
        let (x0, x1) = (x0.into(), x1.into());
        let (y0, y1) = (y0.into(), y1.into());
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// A rectangle with its top-left corner at the origin
    pub fn from_size(width: Pt, height: Pt) -> Rect {
        Rect::new(Pt(0.0), Pt(0.0), width, height)
    }

    pub fn width(&self) -> Pt {
        self.x1 - self.x0
    }

    pub fn height(&self) -> Pt {
        self.y1 - self.y0
    }

    /// Whether the rectangle has no area
    pub fn is_empty(&self) -> bool {
        self.width() <= Pt(0.0) || self.height() <= Pt(0.0)
    }

    /// Whether `other` lies entirely within `self` (edges included)
    pub fn contains(&self, other: &Rect) -> bool {
        other.x0 >= self.x0 && other.x1 <= self.x1 && other.y0 >= self.y0 && other.y1 <= self.y1
    }

    /// Whether the interiors of the two rectangles overlap
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x0 < other.x1 && other.x0 < self.x1 && self.y0 < other.y1 && other.y0 < self.y1
    }

    /// Shrink the rectangle by `margin` on every side. Negative margins grow it.
    ///
    /// When the margin eats more than a whole dimension, that axis collapses to a
    /// zero-extent line through the rectangle's centre instead of inverting.
    pub fn inset(&self, margin: Pt) -> Rect {
        let (x0, x1) = inset_axis(self.x0, self.x1, margin);
        let (y0, y1) = inset_axis(self.y0, self.y1, margin);
        Rect { x0, y0, x1, y1 }
    }

    /// Convert to PDF user space (origin bottom-left) on a page of the given height
    pub fn to_pdf(&self, page_height: Pt) -> pdf_writer::Rect {
        pdf_writer::Rect::new(
            *self.x0,
            *(page_height - self.y1),
            *self.x1,
            *(page_height - self.y0),
        )
    }
}

fn inset_axis(start: Pt, end: Pt, margin: Pt) -> (Pt, Pt) {
    if (end - start) < margin * 2.0 {
        let centre = (start + end) / 2.0;
        (centre, centre)
    } else {
        (start + margin, end - margin)
    }
}
