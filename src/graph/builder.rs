use super::{Graph, NodeId, Operation, OperationRegistry, ProgressCallback};
use crate::data::{DataSources, MemorySources};
use std::sync::Arc;

/// Assembles a [`Graph`] with its data sources, progress observer and any
/// extra node types.
pub struct GraphBuilder {
    sources: Arc<dyn DataSources>,
    progress: Option<ProgressCallback>,
    registry: OperationRegistry,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            sources: Arc::new(MemorySources::new()),
            progress: None,
            registry: OperationRegistry::with_defaults(),
        }
    }

    pub fn with_sources<S: DataSources + 'static>(mut self, sources: S) -> Self {
        self.sources = Arc::new(sources);
        self
    }

    pub fn with_shared_sources(mut self, sources: Arc<dyn DataSources>) -> Self {
        self.sources = sources;
        self
    }

    /// Called with `(node, percent)` after each frame of a long calculation.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(NodeId, f64) + Send + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Registers an extra node type, also usable from project files.
    pub fn with_operation<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Operation> + Send + Sync + 'static,
    {
        self.registry.register(name, Box::new(factory));
        self
    }

    pub fn build(self) -> Graph {
        Graph::from_parts(self.registry, self.sources, self.progress)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
