//! # Meshflow - Node Graph Engine for 2D Mesh Post-Processing
//!
//! **Meshflow** wires data sources and calculators into a directed acyclic
//! graph of nodes. Result files of 2D hydraulic simulations (triangular
//! meshes with nodal variables over time) flow through the graph and come
//! out as time series tables: volumes inside polygons, fluxes through
//! sections, arrival times and durations of conditions.
//!
//! ## Core Workflow
//!
//! 1.  **Provide Your Data**: Implement [`data::DataSources`] for your file
//!     formats, or use the bundled [`data::JsonSources`] / [`data::MemorySources`].
//! 2.  **Build a Graph**: Use [`graph::Graph::builder`] and add nodes by name
//!     (`"Load Mesh"`, `"Compute Volume"`, ...) or from a saved project.
//! 3.  **Link and Configure**: Connect output ports to input ports, then send
//!     each node a [`graph::ProposedConfig`]. Descendants are revalidated
//!     automatically.
//! 4.  **Run**: Running a node pulls every upstream producer first. Outputs
//!     are cached until an edit invalidates them.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use meshflow::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let mut graph = Graph::builder().with_sources(JsonSources::new("data")).build();
//!
//!     let mesh = graph.add_node_by_name("Load Mesh")?;
//!     let polygons = graph.add_node_by_name("Load 2D Polygons")?;
//!     let volume = graph.add_node_by_name("Compute Volume")?;
//!     graph.add_link(mesh, PortRef::new(volume, 0))?;
//!     graph.add_link(polygons, PortRef::new(volume, 1))?;
//!
//!     graph.configure(
//!         mesh,
//!         ProposedConfig::LoadMesh {
//!             filename: "result.json".to_string(),
//!             language: Language::En,
//!             variables: None,
//!         },
//!     )?;
//!     graph.configure(polygons, ProposedConfig::RegionFile { filename: "lakes.json".to_string() })?;
//!     graph.configure(
//!         volume,
//!         ProposedConfig::Volume { first: "H".to_string(), second: None, positive: false },
//!     )?;
//!
//!     graph.run(volume)?;
//!     println!("{}: {}", graph.state(volume)?, graph.message(volume)?);
//!     if let Some(Payload::Table(table)) = graph.output(volume)? {
//!         print!("{}", table.to_csv(';'));
//!     }
//!     Ok(())
//! }
//! ```

pub mod ast;
pub mod calc;
pub mod data;
pub mod error;
pub mod evaluator;
pub mod graph;
pub mod mesh;
pub mod nodes;
pub mod prelude;
pub mod project;
