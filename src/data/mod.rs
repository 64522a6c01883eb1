pub mod model;
pub mod payload;
pub mod table;

pub use model::{DataSources, Dataset, JsonSources, MemorySources, MeshReader};
pub use payload::{Language, MeshData, Operator, Payload};
pub use table::Table;
