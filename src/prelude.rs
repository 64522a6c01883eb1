//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types and traits from the meshflow crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use meshflow::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let mut graph = Graph::builder().with_sources(JsonSources::new("data")).build();
//! graph.load(&ProjectDefinition::from_file("project.txt")?)?;
//! for sink in graph.sinks() {
//!     graph.run(sink)?;
//!     println!("{}: {}", sink, graph.message(sink)?);
//! }
//! # Ok(())
//! # }
//! ```

// Graph and nodes
pub use crate::graph::{
    Graph, GraphBuilder, NodeId, NodeState, Operation, PortKind, PortRef, Position, ProposedCondition,
    ProposedConfig,
};

// Data flowing along links
pub use crate::data::{DataSources, Dataset, JsonSources, Language, MemorySources, MeshData, Payload, Table};

// Calculation parameters
pub use crate::calc::{Subtrahend, TimeUnit};

// Geometry
pub use crate::mesh::{MeshHeader, Polygon, Polyline, VariableInfo};

// Persistence
pub use crate::project::ProjectDefinition;

// Error types
pub use crate::error::{ConfigError, GraphError, NodeFailure, PersistError, ReadError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
