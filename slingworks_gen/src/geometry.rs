// Geometry and overlap kernel.
//
// Pure functions over axis-aligned rectangles and line segments, used by
// every other module: rectangle overlap (strict and inclusive, both compared
// after rounding), point containment, bounding boxes, and segment-vs-segment
// and segment-vs-rectangle intersection via orientation (ccw) tests.
//
// Positions are rounded to `ROUND_DECIMALS` places after arithmetic so that
// two computations of what should be the same coordinate compare equal.
// Rounding is half away from zero (`f64::round`), and rounding an already
// rounded value is a no-op.
//
// See also: `support.rs` for the span coverage predicate built on the same
// rounding, `reachability.rs` for the ray tests.
//
// **Critical constraint: determinism.** No trig, no sqrt in overlap tests;
// only multiplication, addition and comparison, which are exact-reproducible.

use crate::types::{Point, Size};
use serde::{Deserialize, Serialize};

/// Decimal places every stored coordinate is rounded to.
pub const ROUND_DECIMALS: i32 = 10;

const ROUND_SCALE: f64 = 1e10;

/// Round to `ROUND_DECIMALS` places, half away from zero.
pub fn round_to(v: f64) -> f64 {
    (v * ROUND_SCALE).round() / ROUND_SCALE
}

// ---------------------------------------------------------------------------
// Rectangles
// ---------------------------------------------------------------------------

/// Axis-aligned rectangle stored by center and size.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(center: Point, size: Size) -> Self {
        Self { center, size }
    }

    pub fn left(&self) -> f64 {
        self.center.x - self.size.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.center.x + self.size.width / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.center.y - self.size.height / 2.0
    }

    pub fn top(&self) -> f64 {
        self.center.y + self.size.height / 2.0
    }

    /// Grow every side outward by `by` (negative shrinks).
    pub fn expanded(&self, by: f64) -> Self {
        Self {
            center: self.center,
            size: Size::new(self.size.width + 2.0 * by, self.size.height + 2.0 * by),
        }
    }

    /// Shrink every side inward by `by`.
    pub fn shrunk(&self, by: f64) -> Self {
        self.expanded(-by)
    }

    /// Interiors intersect: touching edges do not count. Compared after
    /// rounding each edge.
    pub fn overlaps(&self, other: &Rect) -> bool {
        round_to(self.left()) < round_to(other.right())
            && round_to(self.right()) > round_to(other.left())
            && round_to(self.top()) > round_to(other.bottom())
            && round_to(self.bottom()) < round_to(other.top())
    }

    /// Closed boxes intersect: touching edges count. Compared after rounding.
    pub fn touches(&self, other: &Rect) -> bool {
        round_to(self.left()) <= round_to(other.right())
            && round_to(self.right()) >= round_to(other.left())
            && round_to(self.top()) >= round_to(other.bottom())
            && round_to(self.bottom()) <= round_to(other.top())
    }

    /// Closed containment of a point, unrounded.
    pub fn contains(&self, p: Point) -> bool {
        self.left() <= p.x && self.right() >= p.x && self.bottom() <= p.y && self.top() >= p.y
    }

    /// The four edges, counter-clockwise from the bottom edge.
    pub fn edges(&self) -> [Segment; 4] {
        let bl = Point::new(self.left(), self.bottom());
        let br = Point::new(self.right(), self.bottom());
        let tr = Point::new(self.right(), self.top());
        let tl = Point::new(self.left(), self.top());
        [
            Segment::new(bl, br),
            Segment::new(br, tr),
            Segment::new(tr, tl),
            Segment::new(tl, bl),
        ]
    }
}

/// Union bounding box of a collection of rectangles, with each edge rounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn of<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Self> {
        let mut bounds: Option<Bounds> = None;
        for r in rects {
            let (l, rt, b, t) = (
                round_to(r.left()),
                round_to(r.right()),
                round_to(r.bottom()),
                round_to(r.top()),
            );
            bounds = Some(match bounds {
                None => Bounds { min_x: l, max_x: rt, min_y: b, max_y: t },
                Some(acc) => Bounds {
                    min_x: acc.min_x.min(l),
                    max_x: acc.max_x.max(rt),
                    min_y: acc.min_y.min(b),
                    max_y: acc.max_y.max(t),
                },
            });
        }
        bounds
    }

    pub fn width(&self) -> f64 {
        round_to(self.max_x - self.min_x)
    }

    pub fn height(&self) -> f64 {
        round_to(self.max_y - self.min_y)
    }
}

// ---------------------------------------------------------------------------
// Segments
// ---------------------------------------------------------------------------

/// A line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Proper intersection test. Collinear overlaps and shared endpoints
    /// are not reported, matching the orientation-test formulation.
    pub fn intersects(&self, other: &Segment) -> bool {
        ccw(self.a, other.a, other.b) != ccw(self.b, other.a, other.b)
            && ccw(self.a, self.b, other.a) != ccw(self.a, self.b, other.b)
    }

    /// Whether the segment crosses any of the rectangle's four edges. A
    /// segment lying wholly inside the rectangle does not count.
    pub fn crosses_rect(&self, rect: &Rect) -> bool {
        rect.edges().iter().any(|edge| self.intersects(edge))
    }
}

/// `true` when `a -> b -> c` turns counter-clockwise.
pub fn ccw(a: Point, b: Point, c: Point) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}
