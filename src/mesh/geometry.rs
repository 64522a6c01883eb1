//! Planar geometry used by the mesh index: points, regions, ring clipping
//! and barycentric interpolation.
//!
//! Rings are stored without a repeated closing vertex. Every clipping routine
//! keeps the orientation of its subject ring, so area and moment integrals
//! stay signed and exact even when a concave subject produces degenerate
//! bridge edges.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Relative tolerance used to discard slivers produced by clipping.
pub const RELATIVE_TOLERANCE: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn sub(self, other: Point2) -> Point2 {
        Point2::new(self.x - other.x, self.y - other.y)
    }

    #[inline]
    pub fn lerp(self, other: Point2, t: f64) -> Point2 {
        Point2::new(
            self.x + t * (other.x - self.x),
            self.y + t * (other.y - self.y),
        )
    }

    #[inline]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

/// z-component of the cross product of two vectors.
#[inline]
pub fn cross(a: Point2, b: Point2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2>,
    {
        points.into_iter().fold(None, |acc, p| {
            Some(match acc {
                None => Bounds {
                    min_x: p.x,
                    min_y: p.y,
                    max_x: p.x,
                    max_y: p.y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(p.x),
                    min_y: b.min_y.min(p.y),
                    max_x: b.max_x.max(p.x),
                    max_y: b.max_y.max(p.y),
                },
            })
        })
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }
}

/// A closed region over which a field is integrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<Point2>,
}

impl Polygon {
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    /// Axis-aligned rectangle, counter-clockwise.
    pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self::new(vec![
            Point2::new(min_x, min_y),
            Point2::new(max_x, min_y),
            Point2::new(max_x, max_y),
            Point2::new(min_x, max_y),
        ])
    }

    /// Vertices without a repeated closing point, oriented counter-clockwise.
    pub fn ccw_ring(&self) -> Vec<Point2> {
        let mut ring = self.vertices.clone();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring_moments(&ring).0 < 0.0 {
            ring.reverse();
        }
        ring
    }

    pub fn area(&self) -> f64 {
        ring_moments(&self.ccw_ring()).0
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }
}

/// An open, oriented section across which a flux is integrated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub vertices: Vec<Point2>,
}

impl Polyline {
    pub fn new(vertices: Vec<Point2>) -> Self {
        Self { vertices }
    }

    pub fn segments(&self) -> impl Iterator<Item = (Point2, Point2)> + '_ {
        self.vertices.iter().copied().tuple_windows()
    }

    pub fn length(&self) -> f64 {
        self.segments().map(|(a, b)| b.sub(a).norm()).sum()
    }

    /// Same section with the opposite orientation.
    pub fn reversed(&self) -> Self {
        Self::new(self.vertices.iter().rev().copied().collect())
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.vertices)
    }
}

/// Signed area and first moments `(A, ∫x dA, ∫y dA)` of a ring.
pub fn ring_moments(ring: &[Point2]) -> (f64, f64, f64) {
    if ring.len() < 3 {
        return (0.0, 0.0, 0.0);
    }
    let mut area = 0.0;
    let mut sx = 0.0;
    let mut sy = 0.0;
    for (a, b) in ring.iter().circular_tuple_windows() {
        let c = a.x * b.y - b.x * a.y;
        area += c;
        sx += (a.x + b.x) * c;
        sy += (a.y + b.y) * c;
    }
    (area / 2.0, sx / 6.0, sy / 6.0)
}

/// Keeps the part of `ring` where the affine function `f` is non-negative.
pub fn clip_ring<F>(ring: &[Point2], f: F) -> Vec<Point2>
where
    F: Fn(Point2) -> f64,
{
    let n = ring.len();
    if n == 0 {
        return Vec::new();
    }
    let values: Vec<f64> = ring.iter().map(|&p| f(p)).collect();
    let mut clipped = Vec::with_capacity(n + 2);
    for i in 0..n {
        let prev = (i + n - 1) % n;
        let (p, fp) = (ring[prev], values[prev]);
        let (c, fc) = (ring[i], values[i]);
        if fc >= 0.0 {
            if fp < 0.0 {
                clipped.push(p.lerp(c, fp / (fp - fc)));
            }
            clipped.push(c);
        } else if fp >= 0.0 {
            clipped.push(p.lerp(c, fp / (fp - fc)));
        }
    }
    clipped
}

/// Intersection of `ring` with a counter-clockwise triangle.
pub fn clip_ring_by_triangle(ring: &[Point2], triangle: &[Point2; 3]) -> Vec<Point2> {
    let mut clipped = ring.to_vec();
    for k in 0..3 {
        let a = triangle[k];
        let edge = triangle[(k + 1) % 3].sub(a);
        clipped = clip_ring(&clipped, |p| cross(edge, p.sub(a)));
        if clipped.len() < 3 {
            return Vec::new();
        }
    }
    clipped
}

/// Barycentric coordinates of `p` in `triangle`.
pub fn barycentric(triangle: &[Point2; 3], p: Point2) -> [f64; 3] {
    let [a, b, c] = *triangle;
    let det = cross(b.sub(a), c.sub(a));
    let la = cross(b.sub(p), c.sub(p)) / det;
    let lb = cross(c.sub(p), a.sub(p)) / det;
    [la, lb, 1.0 - la - lb]
}

/// Parameter interval `[t0, t1]` of the segment `p + t (q - p)`, `t ∈ [0, 1]`,
/// lying inside a counter-clockwise triangle, if it has a positive length.
pub fn clip_segment_to_triangle(p: Point2, q: Point2, triangle: &[Point2; 3]) -> Option<(f64, f64)> {
    let d = q.sub(p);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;
    for k in 0..3 {
        let a = triangle[k];
        let edge = triangle[(k + 1) % 3].sub(a);
        let tolerance = RELATIVE_TOLERANCE * edge.norm() * (d.norm() + p.sub(a).norm());
        // f(t) = cross(edge, p + t d - a) must stay >= 0 inside.
        let f0 = cross(edge, p.sub(a));
        let slope = cross(edge, d);
        if slope.abs() <= tolerance {
            if f0 < -tolerance {
                return None;
            }
            continue;
        }
        let t = -f0 / slope;
        if slope > 0.0 {
            t0 = t0.max(t);
        } else {
            t1 = t1.min(t);
        }
        if t1 <= t0 {
            return None;
        }
    }
    (t1 - t0 > RELATIVE_TOLERANCE).then_some((t0, t1))
}
