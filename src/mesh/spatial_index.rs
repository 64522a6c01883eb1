//! R-tree over element bounding boxes, used to find the triangles a region or
//! a section may touch before the exact clipping is done.

use super::geometry::{Bounds, Point2};
use rstar::{AABB, RTree, RTreeObject};

/// Bounding box of one triangle, tagged with its element index.
#[derive(Debug, Clone)]
pub struct ElementEnvelope {
    pub element: usize,
    pub bounds: Bounds,
}

impl ElementEnvelope {
    pub fn new(element: usize, vertices: &[Point2; 3]) -> Option<Self> {
        Bounds::from_points(vertices).map(|bounds| Self { element, bounds })
    }
}

impl RTreeObject for ElementEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_x, self.bounds.min_y],
            [self.bounds.max_x, self.bounds.max_y],
        )
    }
}

pub struct ElementIndex {
    tree: RTree<ElementEnvelope>,
}

impl ElementIndex {
    pub fn build<I>(envelopes: I) -> Self
    where
        I: IntoIterator<Item = ElementEnvelope>,
    {
        Self {
            tree: RTree::bulk_load(envelopes.into_iter().collect()),
        }
    }

    /// Elements whose bounding box intersects `bounds`, in increasing order.
    pub fn candidates(&self, bounds: &Bounds) -> Vec<usize> {
        let query = AABB::from_corners([bounds.min_x, bounds.min_y], [bounds.max_x, bounds.max_y]);
        let mut elements: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.element)
            .collect();
        elements.sort_unstable();
        elements
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
