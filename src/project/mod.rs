pub mod definition;

pub use definition::{LinkRecord, NodeRecord, ProjectDefinition};
