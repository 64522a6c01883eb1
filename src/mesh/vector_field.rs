//! Vector-field view of a mesh: sections are cut into straight pieces, one
//! per crossed element, each carrying the interpolation coefficients of its
//! start, middle and end points.

use super::geometry::{Bounds, Point2, Polyline, RELATIVE_TOLERANCE, barycentric, clip_segment_to_triangle};
use super::index::MeshIndex;

#[derive(Debug, Clone)]
pub struct SectionPiece {
    pub element: usize,
    pub nodes: [usize; 3],
    /// Barycentric coefficients at the start, middle and end of the piece.
    pub coefficients: [[f64; 3]; 3],
    pub length: f64,
    /// Unit normal on the right-hand side of the section direction.
    pub normal: Point2,
}

impl SectionPiece {
    /// Value of a nodal field at the start (0), middle (1) or end (2).
    #[inline]
    pub fn interpolate(&self, at: usize, values: &[f64]) -> f64 {
        let c = &self.coefficients[at];
        c[0] * values[self.nodes[0]] + c[1] * values[self.nodes[1]] + c[2] * values[self.nodes[2]]
    }
}

#[derive(Debug, Clone, Default)]
pub struct SectionIntersections {
    pub pieces: Vec<SectionPiece>,
    /// Total length of the section.
    pub length: f64,
    /// Length of the section lying inside the mesh.
    pub covered_length: f64,
}

impl SectionIntersections {
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }
}

pub struct TriangularVectorField<'a> {
    index: &'a MeshIndex,
}

impl<'a> TriangularVectorField<'a> {
    pub fn new(index: &'a MeshIndex) -> Self {
        Self { index }
    }

    pub fn section_intersections(&self, section: &Polyline) -> SectionIntersections {
        let mut result = SectionIntersections::default();
        for (p, q) in section.segments() {
            let d = q.sub(p);
            let length = d.norm();
            result.length += length;
            if length <= 0.0 {
                continue;
            }
            let normal = Point2::new(d.y / length, -d.x / length);
            let Some(bounds) = Bounds::from_points(&[p, q]) else {
                continue;
            };

            let mut intervals: Vec<(f64, f64, usize)> = self
                .index
                .candidates(&bounds)
                .into_iter()
                .filter(|&e| self.index.area(e) > 0.0)
                .filter_map(|e| {
                    clip_segment_to_triangle(p, q, &self.index.triangle(e)).map(|(t0, t1)| (t0, t1, e))
                })
                .collect();
            intervals.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.2.cmp(&b.2)));

            // Pieces running along a shared edge are claimed by the first element only.
            let mut cursor = 0.0_f64;
            for (t0, t1, element) in intervals {
                let start = t0.max(cursor);
                if t1 - start <= RELATIVE_TOLERANCE {
                    continue;
                }
                cursor = t1;
                let triangle = self.index.triangle(element);
                let at = |t: f64| barycentric(&triangle, p.lerp(q, t));
                let piece_length = (t1 - start) * length;
                result.covered_length += piece_length;
                result.pieces.push(SectionPiece {
                    element,
                    nodes: self.index.nodes(element),
                    coefficients: [at(start), at((start + t1) / 2.0), at(t1)],
                    length: piece_length,
                    normal,
                });
            }
        }
        result
    }
}
