//! Page-space geometry.
//!
//! Rectangles and points here use the text-extraction convention: origin at
//! the top-left corner of the page's MediaBox, y growing downward. PDF user
//! space (origin bottom-left, y upward) only appears inside the interpreter
//! and the canvas, which convert through [`PageFrame`].

use euclid::{Point2D, Transform2D};
use lopdf::Object;

/// Unit marker for PDF user space
pub struct PdfSpace;

/// Affine transform in PDF user space
pub type PdfTransform = Transform2D<f64, PdfSpace, PdfSpace>;

/// Point in PDF user space
pub type PdfPoint = Point2D<f64, PdfSpace>;

/// A point in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle `(x0, y0, x1, y1)` in page coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    /// Create a rectangle, normalising the corner order
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Smallest rectangle containing all the given points
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            rect.x0 = rect.x0.min(p.x);
            rect.y0 = rect.y0.min(p.y);
            rect.x1 = rect.x1.max(p.x);
            rect.y1 = rect.y1.max(p.y);
        }
        Some(rect)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> Point {
        Point::new((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    /// Inclusive containment test
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x0 && point.x <= self.x1 && point.y >= self.y0 && point.y <= self.y1
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Whether the horizontal extents of the two rectangles overlap
    pub fn overlaps_horizontally(&self, other: &Rect) -> bool {
        self.x0 <= other.x1 && other.x0 <= self.x1
    }
}

/// The MediaBox of a page, used to move between page coordinates and
/// PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFrame {
    pub media_box: Rect,
}

impl PageFrame {
    /// US Letter, used when a page carries no usable MediaBox
    pub const LETTER: PageFrame = PageFrame {
        media_box: Rect { x0: 0.0, y0: 0.0, x1: 612.0, y1: 792.0 },
    };

    pub fn new(media_box: Rect) -> Self {
        Self { media_box }
    }

    pub fn width(&self) -> f64 {
        self.media_box.width()
    }

    pub fn height(&self) -> f64 {
        self.media_box.height()
    }

    /// PDF user space → page coordinates
    pub fn to_page(&self, point: PdfPoint) -> Point {
        Point::new(point.x - self.media_box.x0, self.media_box.y1 - point.y)
    }

    /// Page coordinates → PDF user space `(x, y)`
    pub fn to_user_space(&self, point: Point) -> (f64, f64) {
        (point.x + self.media_box.x0, self.media_box.y1 - point.y)
    }

    /// Page rectangle → PDF `re` operands `(x, y, width, height)`
    pub fn rect_to_user_space(&self, rect: &Rect) -> (f64, f64, f64, f64) {
        let (x, y) = self.to_user_space(Point::new(rect.x0, rect.y1));
        (x, y, rect.width(), rect.height())
    }
}

/// Convert a lopdf numeric object (Integer or Real) to f64.
pub fn object_to_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Read six numeric operands as a transform `[a b c d e f]`.
pub fn transform_from_operands(operands: &[Object]) -> Option<PdfTransform> {
    if operands.len() < 6 {
        return None;
    }
    let v: Vec<f64> = operands[..6].iter().filter_map(object_to_f64).collect();
    if v.len() != 6 {
        return None;
    }
    Some(PdfTransform::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}
