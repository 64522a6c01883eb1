use crate::error::MeshError;
use serde::{Deserialize, Serialize};

/// One variable stored in a result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableInfo {
    /// Short identifier used in expressions and flux labels (e.g. `"H"`).
    pub id: String,
    /// Long name as written by the solver (e.g. `"WATER DEPTH"`).
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

impl VariableInfo {
    pub fn new(id: &str, name: &str, unit: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            unit: unit.to_string(),
        }
    }
}

/// Immutable description of a 2D result file: node coordinates, triangle
/// connectivity and the variables available in every frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshHeader {
    #[serde(default)]
    pub title: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Triangle connectivity, zero-based node indices.
    pub ikle: Vec<[usize; 3]>,
    pub variables: Vec<VariableInfo>,
    #[serde(default)]
    pub nb_frames: usize,
}

impl MeshHeader {
    pub fn nb_nodes(&self) -> usize {
        self.x.len()
    }

    pub fn nb_triangles(&self) -> usize {
        self.ikle.len()
    }

    pub fn var_ids(&self) -> impl Iterator<Item = &str> {
        self.variables.iter().map(|v| v.id.as_str())
    }

    pub fn variable(&self, id: &str) -> Option<&VariableInfo> {
        self.variables.iter().find(|v| v.id == id)
    }

    pub fn has_var(&self, id: &str) -> bool {
        self.variable(id).is_some()
    }

    /// Checks that coordinates and connectivity are consistent.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.x.len() != self.y.len() {
            return Err(MeshError::CoordinateMismatch {
                x: self.x.len(),
                y: self.y.len(),
            });
        }
        if self.ikle.is_empty() {
            return Err(MeshError::Empty);
        }
        let nb_nodes = self.nb_nodes();
        for (element, nodes) in self.ikle.iter().enumerate() {
            if let Some(&node) = nodes.iter().find(|&&n| n >= nb_nodes) {
                return Err(MeshError::NodeOutOfRange {
                    element,
                    node,
                    nb_nodes,
                });
            }
        }
        Ok(())
    }
}
