use crate::data::Operator;
use crate::graph::{NodeId, PortKind};
use thiserror::Error;

/// Errors raised while a node's parameters are validated or committed.
///
/// A configuration error never changes the state of the graph: the node keeps
/// the parameters it had before the rejected proposal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Connect and run the input before configuring this node")]
    InputNotConnected,

    #[error("Configure and run the input before configuring this node")]
    InputNotReady,

    #[error("No flux is computable from the input file")]
    NoFluxAvailable,

    #[error("Flux option '{0}' is not available for the input variables")]
    UnknownFluxOption(String),

    #[error("Variable '{0}' is not available in the input data")]
    UnknownVariable(String),

    #[error("Invalid column name '{name}': {reason}")]
    InvalidColumnName { name: String, reason: String },

    #[error("The condition '{0}' is already added")]
    DuplicateCondition(String),

    #[error("Invalid expression '{expression}': {message}")]
    InvalidExpression { expression: String, message: String },

    #[error("Unknown time unit '{0}'")]
    UnknownTimeUnit(String),

    #[error("Node '{node}' expects a {expected} proposal")]
    WrongProposal {
        node: &'static str,
        expected: &'static str,
    },

    #[error("Missing parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value '{value}' for {field}")]
    InvalidField { field: &'static str, value: String },

    #[error("Expected {expected} saved fields, found {found}")]
    FieldCount { expected: usize, found: usize },
}

/// Errors raised when the topology of the graph is edited or queried.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found in the graph")]
    NodeNotFound(NodeId),

    #[error("Link {0} not found in the graph")]
    LinkNotFound(usize),

    #[error("Node {node} has no input port {port}")]
    PortOutOfRange { node: NodeId, port: usize },

    #[error("Cannot connect a '{output}' output to a '{input}' input")]
    PortKindMismatch { output: PortKind, input: PortKind },

    #[error("Input port {port} of node {node} is already connected")]
    PortOccupied { node: NodeId, port: usize },

    #[error("Linking node {from} to node {to} would create a cycle")]
    CycleDetected { from: NodeId, to: NodeId },

    #[error("Node {0} is not configured")]
    NotConfigured(NodeId),

    #[error("Unknown node type '{0}'")]
    UnknownNodeType(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors reported by a mesh reader or a region provider.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReadError {
    /// The request itself was invalid (frame out of range, unknown variable).
    #[error("{0}")]
    Request(String),

    /// The file content is malformed.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Io(String),
}

/// Inconsistencies in a mesh description.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeshError {
    #[error("Coordinate arrays differ in length: {x} abscissas for {y} ordinates")]
    CoordinateMismatch { x: usize, y: usize },

    #[error("Element {element} references node {node}, but the mesh has {nb_nodes} nodes")]
    NodeOutOfRange {
        element: usize,
        node: usize,
        nb_nodes: usize,
    },

    #[error("The mesh has no element")]
    Empty,
}

impl From<MeshError> for ReadError {
    fn from(err: MeshError) -> Self {
        ReadError::Validation(err.to_string())
    }
}

/// Errors raised while evaluating a condition expression over a frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Variable '{0}' not found in the frame values")]
    InputNotFound(String),

    #[error("Variable '{name}' has {found} values, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        found: usize,
    },
}

/// Errors raised while reading or writing a project file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersistError {
    #[error("Line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("Line {line}: unknown node type '{name}'")]
    UnknownNode { line: usize, name: String },

    #[error("Line {line}: invalid parameters for '{name}': {message}")]
    InvalidParameters {
        line: usize,
        name: String,
        message: String,
    },

    #[error("Link {from} -> {to}: {message}")]
    InvalidLink {
        from: usize,
        to: usize,
        message: String,
    },

    #[error("{0}")]
    Io(String),
}

/// The reason a node ended its run in the FAIL state.
///
/// The `Display` text is what the user sees in the node message, prefixed
/// with `Failed: `.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeFailure {
    #[error("input failed")]
    InputFailed,

    #[error("the input data is already the result of {}", .0.node_name())]
    AlreadyAggregated(Operator),

    #[error("the input data is already the result of another computation")]
    AlreadyComputed,

    #[error("no {0} data on input port {1}")]
    MissingInput(PortKind, usize),

    #[error("the node is not configured")]
    NotConfigured,

    #[error("{0}")]
    Read(#[from] ReadError),

    #[error("{0}")]
    Mesh(#[from] MeshError),

    #[error("{0}")]
    Evaluation(#[from] EvaluationError),

    #[error("{0}")]
    Config(#[from] ConfigError),
}
