use super::Operation;
use crate::data::Payload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a node inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub type LinkId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeState {
    /// Missing or invalid parameters, or an unsatisfied input.
    NotConfigured,
    /// Parameters are valid against the current input; eligible to run.
    Ready,
    /// Last run completed; the output is fresh.
    Success,
    /// Last run did not complete; the message says why.
    Fail,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeState::NotConfigured => "NOT_CONFIGURED",
            NodeState::Ready => "READY",
            NodeState::Success => "SUCCESS",
            NodeState::Fail => "FAIL",
        })
    }
}

/// Data-kind tag of a port. A link only joins ports of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    Mesh,
    PolygonSet,
    PolylineSet,
    Table,
}

impl PortKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PortKind::Mesh => "mesh",
            PortKind::PolygonSet => "polygon-set",
            PortKind::PolylineSet => "polyline-set",
            PortKind::Table => "table",
        }
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An input port, addressed through the graph rather than by reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub node: NodeId,
    pub port: usize,
}

impl PortRef {
    pub fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

/// A directed edge from the output of `from` to one input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub id: LinkId,
    pub from: NodeId,
    pub to: PortRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

pub(crate) struct NodeSlot {
    pub(crate) position: Position,
    pub(crate) state: NodeState,
    pub(crate) message: String,
    pub(crate) operation: Box<dyn Operation>,
    pub(crate) output: Option<Payload>,
}

impl NodeSlot {
    pub(crate) fn new(operation: Box<dyn Operation>, position: Position) -> Self {
        Self {
            position,
            state: operation.initial_state(),
            message: String::new(),
            operation,
            output: None,
        }
    }
}
