use super::{NodeState, PortKind};
use crate::calc::{Subtrahend, TimeUnit};
use crate::data::{DataSources, Language, MeshData, Payload, Table};
use crate::error::{ConfigError, NodeFailure};
use crate::mesh::{Polygon, Polyline};
use std::sync::Arc;

/// One condition as entered by the user; missing names get defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ProposedCondition {
    pub text: String,
    pub arrival: Option<String>,
    pub duration: Option<String>,
}

impl ProposedCondition {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            arrival: None,
            duration: None,
        }
    }

    pub fn named(text: &str, arrival: &str, duration: &str) -> Self {
        Self {
            text: text.to_string(),
            arrival: Some(arrival.to_string()),
            duration: Some(duration.to_string()),
        }
    }
}

/// Parameters collected outside the graph, validated and committed in one step.
#[derive(Debug, Clone, PartialEq)]
pub enum ProposedConfig {
    LoadMesh {
        filename: String,
        language: Language,
        /// Variable subset; `None` selects every variable.
        variables: Option<Vec<String>>,
    },
    RegionFile {
        filename: String,
    },
    Volume {
        first: String,
        second: Option<Subtrahend>,
        positive: bool,
    },
    Flux {
        label: String,
    },
    ArrivalDuration {
        conditions: Vec<ProposedCondition>,
        time_unit: TimeUnit,
    },
    /// For nodes without parameters.
    None,
}

/// Collaborators available to a node while it runs.
pub struct RunContext<'a> {
    pub sources: &'a dyn DataSources,
    /// Receives a percentage after each processed frame.
    pub progress: &'a mut dyn FnMut(f64),
}

/// The outputs of the producers feeding each input port, in port order.
pub struct Inputs(pub Vec<Option<Payload>>);

impl Inputs {
    fn get(&self, port: usize, kind: PortKind) -> Result<&Payload, NodeFailure> {
        self.0
            .get(port)
            .and_then(Option::as_ref)
            .ok_or(NodeFailure::MissingInput(kind, port))
    }

    pub fn mesh(&self, port: usize) -> Result<&MeshData, NodeFailure> {
        self.get(port, PortKind::Mesh)?
            .as_mesh()
            .ok_or(NodeFailure::MissingInput(PortKind::Mesh, port))
    }

    pub fn polygons(&self, port: usize) -> Result<&Arc<Vec<Polygon>>, NodeFailure> {
        self.get(port, PortKind::PolygonSet)?
            .as_polygons()
            .ok_or(NodeFailure::MissingInput(PortKind::PolygonSet, port))
    }

    pub fn polylines(&self, port: usize) -> Result<&Arc<Vec<Polyline>>, NodeFailure> {
        self.get(port, PortKind::PolylineSet)?
            .as_polylines()
            .ok_or(NodeFailure::MissingInput(PortKind::PolylineSet, port))
    }

    pub fn table(&self, port: usize) -> Result<&Arc<Table>, NodeFailure> {
        self.get(port, PortKind::Table)?
            .as_table()
            .ok_or(NodeFailure::MissingInput(PortKind::Table, port))
    }
}

/// The behaviour of one kind of node. The graph owns topology and state
/// transitions; an operation only validates its parameters and computes.
pub trait Operation: Send {
    /// Node type name, unique in the registry (e.g. `"Compute Volume"`).
    fn name(&self) -> &'static str;

    fn category(&self) -> &'static str;

    fn input_ports(&self) -> &'static [PortKind];

    fn output_port(&self) -> PortKind;

    fn initial_state(&self) -> NodeState {
        NodeState::NotConfigured
    }

    /// Input port whose data the parameters are checked against.
    fn primary_input(&self) -> Option<usize> {
        (!self.input_ports().is_empty()).then_some(0)
    }

    /// Whether revalidation needs the primary producer's output, which makes
    /// the graph run that producer first.
    fn reads_input_schema(&self) -> bool {
        self.primary_input().is_some()
    }

    /// Re-derives the state after the input changed. `primary` is the output
    /// of the primary producer when it is available. Parameters that became
    /// invalid are dropped.
    fn revalidate(&mut self, primary: Option<&Payload>) -> NodeState;

    /// Validates `proposal` against `primary` and commits it. On error,
    /// nothing changes.
    fn configure(&mut self, primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError>;

    /// Node-specific fields of the project file record.
    fn save_fields(&self) -> Vec<String>;

    /// Restores parameters written by [`Operation::save_fields`] and returns
    /// the resulting state, never [`NodeState::Success`].
    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError>;

    fn execute(&mut self, inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure>;

    /// Parameter values the node currently offers, e.g. the computable
    /// flux formulas.
    fn choices(&self) -> Vec<String> {
        Vec::new()
    }
}
