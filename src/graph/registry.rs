use super::Operation;
use ahash::AHashMap;

pub type OperationFactory = Box<dyn Fn() -> Box<dyn Operation> + Send + Sync>;

/// Node types known to a graph, by name. Used to create nodes from a
/// project file.
pub struct OperationRegistry {
    factories: AHashMap<String, OperationFactory>,
}

impl OperationRegistry {
    /// A registry with no node type at all.
    pub fn empty() -> Self {
        Self {
            factories: AHashMap::new(),
        }
    }

    /// A registry with every built-in node type.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        crate::nodes::register_default_operations(&mut registry);
        registry
    }

    pub fn register(&mut self, name: &str, factory: OperationFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Operation>> {
        self.factories.get(name).map(|factory| factory())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for OperationRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
