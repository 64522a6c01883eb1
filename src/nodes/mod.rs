//! Built-in node types.

mod aggregate;
mod arrival;
mod flux;
mod source;
mod volume;

pub use aggregate::{ComputeMax, ComputeMean, ComputeMin};
pub use arrival::ComputeArrivalDuration;
pub use flux::ComputeFlux;
pub use source::{LoadMesh, LoadRegions, RegionKind};
pub use volume::ComputeVolume;

use crate::graph::{Operation, OperationRegistry};

macro_rules! define_default_operations {
    ( $( ($node_name:expr, $constructor:expr) ),* $(,)? ) => {
        /// Registers every built-in node type under its display name.
        pub fn register_default_operations(registry: &mut OperationRegistry) {
            $( registry.register($node_name, Box::new(|| Box::new($constructor) as Box<dyn Operation>)); )*
        }
    };
}

define_default_operations! {
    ("Load Mesh", LoadMesh::default()),
    ("Load 2D Polygons", LoadRegions::polygons()),
    ("Load 2D Open Polylines", LoadRegions::polylines()),
    ("Compute Max", ComputeMax),
    ("Compute Min", ComputeMin),
    ("Compute Mean", ComputeMean),
    ("Compute Volume", ComputeVolume::default()),
    ("Compute Flux", ComputeFlux::default()),
    ("Compute Arrival Duration", ComputeArrivalDuration::default()),
}
