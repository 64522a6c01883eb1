use super::geometry::{Bounds, Point2, cross};
use super::header::MeshHeader;
use super::spatial_index::{ElementEnvelope, ElementIndex};
use crate::error::MeshError;
use log::debug;

/// Geometric view of a mesh header, built once per mesh and shared by every
/// calculator that integrates over it.
///
/// Triangles are stored counter-clockwise: a clockwise element from the file
/// has its second and third nodes swapped.
pub struct MeshIndex {
    points: Vec<Point2>,
    triangles: Vec<[usize; 3]>,
    areas: Vec<f64>,
    elements: ElementIndex,
    bounds: Bounds,
}

impl MeshIndex {
    pub fn build(header: &MeshHeader) -> Result<Self, MeshError> {
        header.validate()?;
        let points: Vec<Point2> = header
            .x
            .iter()
            .zip(&header.y)
            .map(|(&x, &y)| Point2::new(x, y))
            .collect();

        let mut triangles = Vec::with_capacity(header.nb_triangles());
        let mut areas = Vec::with_capacity(header.nb_triangles());
        let mut envelopes = Vec::with_capacity(header.nb_triangles());
        for (element, &[a, b, c]) in header.ikle.iter().enumerate() {
            let twice_area = cross(points[b].sub(points[a]), points[c].sub(points[a]));
            let nodes = if twice_area < 0.0 { [a, c, b] } else { [a, b, c] };
            let vertices = [points[nodes[0]], points[nodes[1]], points[nodes[2]]];
            if let Some(envelope) = ElementEnvelope::new(element, &vertices) {
                envelopes.push(envelope);
            }
            triangles.push(nodes);
            areas.push(twice_area.abs() / 2.0);
        }

        let bounds = Bounds::from_points(&points).ok_or(MeshError::Empty)?;
        debug!(
            "Built mesh index: {} nodes, {} triangles",
            points.len(),
            triangles.len()
        );
        Ok(Self {
            points,
            triangles,
            areas,
            elements: ElementIndex::build(envelopes),
            bounds,
        })
    }

    pub fn nb_nodes(&self) -> usize {
        self.points.len()
    }

    pub fn nb_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn point(&self, node: usize) -> Point2 {
        self.points[node]
    }

    /// Node indices of `element`, counter-clockwise.
    pub fn nodes(&self, element: usize) -> [usize; 3] {
        self.triangles[element]
    }

    pub fn triangle(&self, element: usize) -> [Point2; 3] {
        let [a, b, c] = self.triangles[element];
        [self.point(a), self.point(b), self.point(c)]
    }

    pub fn area(&self, element: usize) -> f64 {
        self.areas[element]
    }

    pub fn total_area(&self) -> f64 {
        self.areas.iter().sum()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn candidates(&self, bounds: &Bounds) -> Vec<usize> {
        if !self.bounds.intersects(bounds) {
            return Vec::new();
        }
        self.elements.candidates(bounds)
    }
}
