//! Truncated-prism view of a mesh: the integral of a piecewise-linear field
//! over a region, expressed as a weighted sum of nodal values.
//!
//! For each triangle piece `P` of a region, the exact integral of the linear
//! interpolant is `|P| * f(centroid(P))`, which expands to the nodal weights
//! `|P| * λ_i(centroid(P))`. Whole elements collapse to `|T| / 3` per node.

use super::geometry::{Point2, Polygon, RELATIVE_TOLERANCE, barycentric, clip_ring, clip_ring_by_triangle, ring_moments};
use super::index::MeshIndex;
use std::collections::BTreeMap;

/// The part of a region lying inside one element.
#[derive(Debug, Clone)]
pub struct ElementPiece {
    pub element: usize,
    pub nodes: [usize; 3],
    pub triangle: [Point2; 3],
    /// Clipped ring, counter-clockwise.
    pub ring: Vec<Point2>,
    pub area: f64,
    pub weights: [f64; 3],
    /// The element lies entirely inside the region.
    pub full: bool,
}

impl ElementPiece {
    fn net(&self, values: &[f64]) -> f64 {
        self.weights
            .iter()
            .zip(self.nodes)
            .map(|(w, n)| w * values[n])
            .sum()
    }

    /// Splits the integral of this piece into positive and negative parts
    /// along the zero line of the linear interpolant.
    fn signed_parts(&self, values: &[f64]) -> (f64, f64) {
        let v = self.nodes.map(|n| values[n]);
        let total = self.net(values);
        if v.iter().all(|&x| x >= 0.0) {
            return (total, 0.0);
        }
        if v.iter().all(|&x| x <= 0.0) {
            return (0.0, total);
        }
        let interpolant = |p: Point2| {
            let l = barycentric(&self.triangle, p);
            l[0] * v[0] + l[1] * v[1] + l[2] * v[2]
        };
        let positive_ring = clip_ring(&self.ring, interpolant);
        let (area, sx, sy) = ring_moments(&positive_ring);
        if area <= RELATIVE_TOLERANCE * self.area {
            return (0.0, total);
        }
        let positive = area * interpolant(Point2::new(sx / area, sy / area));
        (positive, total - positive)
    }
}

/// Per-region weight table, built once and reused for every frame.
#[derive(Debug, Clone, Default)]
pub struct PolygonWeights {
    pub pieces: Vec<ElementPiece>,
    /// Accumulated weight per node, sorted by node index.
    pub node_weights: Vec<(usize, f64)>,
    /// Area of the region covered by the mesh.
    pub area: f64,
}

impl PolygonWeights {
    fn from_pieces(pieces: Vec<ElementPiece>) -> Self {
        let mut by_node: BTreeMap<usize, f64> = BTreeMap::new();
        for piece in &pieces {
            for (node, weight) in piece.nodes.iter().zip(piece.weights) {
                *by_node.entry(*node).or_default() += weight;
            }
        }
        let area = pieces.iter().map(|p| p.area).sum();
        Self {
            pieces,
            node_weights: by_node.into_iter().collect(),
            area,
        }
    }

    /// The region does not intersect the mesh.
    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    /// `∫ f dA` for nodal values `values`.
    pub fn net(&self, values: &[f64]) -> f64 {
        self.node_weights.iter().map(|&(n, w)| w * values[n]).sum()
    }

    /// `(∫ max(f, 0) dA, ∫ min(f, 0) dA)` for nodal values `values`.
    pub fn positive_negative(&self, values: &[f64]) -> (f64, f64) {
        self.pieces.iter().fold((0.0, 0.0), |(pos, neg), piece| {
            let (p, n) = piece.signed_parts(values);
            (pos + p, neg + n)
        })
    }
}

pub struct TruncatedPrisms<'a> {
    index: &'a MeshIndex,
}

impl<'a> TruncatedPrisms<'a> {
    pub fn new(index: &'a MeshIndex) -> Self {
        Self { index }
    }

    fn full_piece(&self, element: usize) -> ElementPiece {
        let area = self.index.area(element);
        let triangle = self.index.triangle(element);
        ElementPiece {
            element,
            nodes: self.index.nodes(element),
            triangle,
            ring: triangle.to_vec(),
            area,
            weights: [area / 3.0; 3],
            full: true,
        }
    }

    pub fn polygon_weights(&self, polygon: &Polygon) -> PolygonWeights {
        let ring = polygon.ccw_ring();
        let Some(bounds) = polygon.bounds() else {
            return PolygonWeights::default();
        };
        let mut pieces = Vec::new();
        for element in self.index.candidates(&bounds) {
            let element_area = self.index.area(element);
            if element_area <= 0.0 {
                continue;
            }
            let triangle = self.index.triangle(element);
            let clipped = clip_ring_by_triangle(&ring, &triangle);
            let (area, sx, sy) = ring_moments(&clipped);
            if area <= RELATIVE_TOLERANCE * element_area {
                continue;
            }
            if (element_area - area).abs() <= RELATIVE_TOLERANCE * element_area {
                pieces.push(self.full_piece(element));
                continue;
            }
            let centroid = Point2::new(sx / area, sy / area);
            let lambda = barycentric(&triangle, centroid);
            pieces.push(ElementPiece {
                element,
                nodes: self.index.nodes(element),
                triangle,
                ring: clipped,
                area,
                weights: lambda.map(|l| area * l),
                full: false,
            });
        }
        PolygonWeights::from_pieces(pieces)
    }

    /// Weights of the whole mesh, without clipping.
    pub fn whole_mesh_weights(&self) -> PolygonWeights {
        let pieces = (0..self.index.nb_triangles())
            .filter(|&e| self.index.area(e) > 0.0)
            .map(|e| self.full_piece(e))
            .collect();
        PolygonWeights::from_pieces(pieces)
    }
}
