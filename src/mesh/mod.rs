pub mod geometry;
pub mod header;
pub mod index;
pub mod prism;
pub mod spatial_index;
pub mod vector_field;

pub use geometry::{Bounds, Point2, Polygon, Polyline};
pub use header::{MeshHeader, VariableInfo};
pub use index::MeshIndex;
pub use prism::{ElementPiece, PolygonWeights, TruncatedPrisms};
pub use vector_field::{SectionIntersections, SectionPiece, TriangularVectorField};
