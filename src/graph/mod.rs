//! The computation graph: nodes joined by links into a DAG, with pull-based
//! execution and push-based invalidation.
//!
//! Running a node first runs every upstream producer that is not yet in
//! [`NodeState::Success`]; a producer already in `Success` is never run again,
//! so shared ancestors of a diamond run once. Editing a node (new link,
//! new parameters, removed input) reconfigures it and then every descendant
//! in topological order, discarding their outputs.

mod builder;
mod node;
mod operation;
mod registry;

pub use builder::GraphBuilder;
pub use node::{Link, LinkId, NodeId, NodeState, PortKind, PortRef, Position};
pub use operation::{Inputs, Operation, ProposedCondition, ProposedConfig, RunContext};
pub use registry::{OperationFactory, OperationRegistry};

use crate::data::{DataSources, Payload};
use crate::error::{ConfigError, GraphError, NodeFailure, PersistError};
use crate::project::{LinkRecord, NodeRecord, ProjectDefinition};
use log::{debug, info, warn};
use node::NodeSlot;
use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::sync::Arc;

pub type ProgressCallback = Box<dyn FnMut(NodeId, f64) + Send>;

pub const SUCCESS_MESSAGE: &str = "Successful.";

pub struct Graph {
    nodes: BTreeMap<NodeId, NodeSlot>,
    links: BTreeMap<LinkId, Link>,
    next_node: usize,
    next_link: LinkId,
    registry: OperationRegistry,
    sources: Arc<dyn DataSources>,
    progress: Option<ProgressCallback>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub(crate) fn from_parts(
        registry: OperationRegistry,
        sources: Arc<dyn DataSources>,
        progress: Option<ProgressCallback>,
    ) -> Self {
        Self {
            nodes: BTreeMap::new(),
            links: BTreeMap::new(),
            next_node: 0,
            next_link: 0,
            registry,
            sources,
            progress,
        }
    }

    // --- Nodes ---

    pub fn add_node(&mut self, operation: Box<dyn Operation>) -> NodeId {
        self.add_node_at(operation, Position::default())
    }

    pub fn add_node_at(&mut self, operation: Box<dyn Operation>, position: Position) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        debug!("Added node {} ({})", id, operation.name());
        self.nodes.insert(id, NodeSlot::new(operation, position));
        id
    }

    /// Adds a node of a registered type.
    pub fn add_node_by_name(&mut self, name: &str) -> Result<NodeId, GraphError> {
        let operation = self
            .registry
            .create(name)
            .ok_or_else(|| GraphError::UnknownNodeType(name.to_string()))?;
        Ok(self.add_node(operation))
    }

    /// Removes a node and every link touching it, then reconfigures the
    /// nodes it used to feed.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), GraphError> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound(id));
        }
        let targets = self.downstream(id);
        self.links.retain(|_, link| link.from != id && link.to.node != id);
        self.nodes.remove(&id);
        info!("Removed node {id}");
        for target in targets {
            self.reconfigure_node(target);
            self.reconfigure_downward(target);
        }
        Ok(())
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn slot(&self, id: NodeId) -> Result<&NodeSlot, GraphError> {
        self.nodes.get(&id).ok_or(GraphError::NodeNotFound(id))
    }

    pub fn state(&self, id: NodeId) -> Result<NodeState, GraphError> {
        Ok(self.slot(id)?.state)
    }

    /// Message left by the last run, empty before any run.
    pub fn message(&self, id: NodeId) -> Result<&str, GraphError> {
        Ok(&self.slot(id)?.message)
    }

    /// Output of the last successful run.
    pub fn output(&self, id: NodeId) -> Result<Option<&Payload>, GraphError> {
        Ok(self.slot(id)?.output.as_ref())
    }

    pub fn name(&self, id: NodeId) -> Result<&'static str, GraphError> {
        Ok(self.slot(id)?.operation.name())
    }

    pub fn choices(&self, id: NodeId) -> Result<Vec<String>, GraphError> {
        Ok(self.slot(id)?.operation.choices())
    }

    pub fn position(&self, id: NodeId) -> Result<Position, GraphError> {
        Ok(self.slot(id)?.position)
    }

    pub fn set_position(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        self.nodes
            .get_mut(&id)
            .map(|slot| slot.position = position)
            .ok_or(GraphError::NodeNotFound(id))
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    // --- Links ---

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Links incident to `id`, incoming and outgoing.
    pub fn links_of(&self, id: NodeId) -> Vec<Link> {
        self.links
            .values()
            .filter(|link| link.from == id || link.to.node == id)
            .copied()
            .collect()
    }

    fn input_link(&self, to: PortRef) -> Option<&Link> {
        self.links.values().find(|link| link.to == to)
    }

    /// The node feeding input port `to`, if connected.
    pub fn producer(&self, to: PortRef) -> Option<NodeId> {
        self.input_link(to).map(|link| link.from)
    }

    /// Direct consumers of `id`, without duplicates.
    fn downstream(&self, id: NodeId) -> Vec<NodeId> {
        let targets: BTreeSet<NodeId> = self
            .links
            .values()
            .filter(|link| link.from == id)
            .map(|link| link.to.node)
            .collect();
        targets.into_iter().collect()
    }

    fn reaches(&self, start: NodeId, target: NodeId) -> bool {
        let mut stack = vec![start];
        let mut visited = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.downstream(current));
            }
        }
        false
    }

    fn check_link(&self, from: NodeId, to: PortRef) -> Result<(), GraphError> {
        let producer = self.slot(from)?;
        let consumer = self.slot(to.node)?;
        let input = *consumer
            .operation
            .input_ports()
            .get(to.port)
            .ok_or(GraphError::PortOutOfRange {
                node: to.node,
                port: to.port,
            })?;
        let output = producer.operation.output_port();
        if output != input {
            return Err(GraphError::PortKindMismatch { output, input });
        }
        if self.input_link(to).is_some() {
            return Err(GraphError::PortOccupied {
                node: to.node,
                port: to.port,
            });
        }
        if from == to.node || self.reaches(to.node, from) {
            return Err(GraphError::CycleDetected { from, to: to.node });
        }
        Ok(())
    }

    /// Connects the output of `from` to an input port, then re-derives the
    /// state of the consumer and of everything downstream.
    pub fn add_link(&mut self, from: NodeId, to: PortRef) -> Result<LinkId, GraphError> {
        self.check_link(from, to)?;
        let id = self.next_link;
        self.next_link += 1;
        self.links.insert(id, Link { id, from, to });
        debug!("Linked node {} to port {} of node {}", from, to.port, to.node);
        self.reconfigure_node(to.node);
        self.reconfigure_downward(to.node);
        Ok(id)
    }

    pub fn remove_link(&mut self, id: LinkId) -> Result<(), GraphError> {
        let link = self.links.remove(&id).ok_or(GraphError::LinkNotFound(id))?;
        debug!("Removed link {} -> {}", link.from, link.to.node);
        self.reconfigure_node(link.to.node);
        self.reconfigure_downward(link.to.node);
        Ok(())
    }

    // --- Configuration ---

    /// Output of the primary producer of `id`, running it first when it is
    /// ready but has not run yet.
    fn primary_payload(&mut self, id: NodeId) -> Option<Payload> {
        let port = self.nodes.get(&id)?.operation.primary_input()?;
        let producer = self.producer(PortRef::new(id, port))?;
        if self.nodes.get(&producer)?.state != NodeState::Success && self.ready_to_run(producer) {
            if let Err(err) = self.run(producer) {
                debug!("Could not run node {producer}: {err}");
            }
        }
        let slot = self.nodes.get(&producer)?;
        match slot.state {
            NodeState::Success => slot.output.clone(),
            _ => None,
        }
    }

    fn reconfigure_node(&mut self, id: NodeId) {
        let reads_input = match self.nodes.get(&id) {
            Some(slot) => slot.operation.reads_input_schema(),
            None => return,
        };
        let primary = if reads_input { self.primary_payload(id) } else { None };
        if let Some(slot) = self.nodes.get_mut(&id) {
            let before = slot.state;
            slot.output = None;
            slot.message.clear();
            slot.state = slot.operation.revalidate(primary.as_ref());
            debug!("Node {} reconfigured: {} -> {}", id, before, slot.state);
        }
    }

    /// Every node reachable from `id`, in topological order, `id` excluded.
    fn descendants_in_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut reachable = BTreeSet::new();
        let mut stack = self.downstream(id);
        while let Some(current) = stack.pop() {
            if reachable.insert(current) {
                stack.extend(self.downstream(current));
            }
        }
        self.topological_order()
            .into_iter()
            .filter(|node| reachable.contains(node))
            .collect()
    }

    /// Kahn's algorithm, smallest ready id first.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let mut in_degree: BTreeMap<NodeId, usize> = self.nodes.keys().map(|&id| (id, 0)).collect();
        for link in self.links.values() {
            *in_degree.entry(link.to.node).or_default() += 1;
        }
        let mut ready: BTreeSet<NodeId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&id, _)| id)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(current) = ready.pop_first() {
            order.push(current);
            for link in self.links.values().filter(|link| link.from == current) {
                if let Some(degree) = in_degree.get_mut(&link.to.node) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(link.to.node);
                    }
                }
            }
        }
        order
    }

    fn reconfigure_downward(&mut self, id: NodeId) {
        for descendant in self.descendants_in_order(id) {
            self.reconfigure_node(descendant);
        }
    }

    /// Re-derives the state of `id` from its current input, then propagates.
    pub fn reconfigure(&mut self, id: NodeId) -> Result<(), GraphError> {
        self.slot(id)?;
        self.reconfigure_node(id);
        self.reconfigure_downward(id);
        Ok(())
    }

    /// Validates and commits new parameters. The primary producer must be
    /// connected and able to reach `Success`; it is run if needed. A rejected
    /// proposal leaves the node untouched.
    pub fn configure(&mut self, id: NodeId, proposal: ProposedConfig) -> Result<(), GraphError> {
        let slot = self.slot(id)?;
        let primary_port = if slot.operation.reads_input_schema() {
            slot.operation.primary_input()
        } else {
            None
        };
        let primary = match primary_port {
            None => None,
            Some(port) => {
                let producer = self
                    .producer(PortRef::new(id, port))
                    .ok_or(ConfigError::InputNotConnected)?;
                if self.state(producer)? != NodeState::Success {
                    if !self.ready_to_run(producer) {
                        return Err(ConfigError::InputNotReady.into());
                    }
                    self.run(producer)?;
                    if self.state(producer)? != NodeState::Success {
                        return Err(ConfigError::InputNotReady.into());
                    }
                }
                self.slot(producer)?.output.clone()
            }
        };

        let slot = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        slot.operation.configure(primary.as_ref(), proposal)?;
        slot.output = None;
        slot.message.clear();
        slot.state = slot.operation.revalidate(primary.as_ref());
        info!("Configured node {} ({}): {}", id, slot.operation.name(), slot.state);
        self.reconfigure_downward(id);
        Ok(())
    }

    // --- Execution ---

    /// Configured, fully connected, and every producer can run.
    pub fn ready_to_run(&self, id: NodeId) -> bool {
        let Some(slot) = self.nodes.get(&id) else {
            return false;
        };
        match slot.state {
            NodeState::Success => return true,
            NodeState::Ready => {}
            NodeState::NotConfigured | NodeState::Fail => return false,
        }
        (0..slot.operation.input_ports().len()).all(|port| {
            self.producer(PortRef::new(id, port))
                .is_some_and(|producer| self.ready_to_run(producer))
        })
    }

    /// Runs `id` after its upstream producers. A node already in `Success`
    /// returns immediately. Failures end in [`NodeState::Fail`] with a
    /// message; only an unknown or unconfigured node is an error.
    pub fn run(&mut self, id: NodeId) -> Result<NodeState, GraphError> {
        match self.state(id)? {
            NodeState::Success => {
                debug!("Node {id} is up to date");
                return Ok(NodeState::Success);
            }
            NodeState::NotConfigured => return Err(GraphError::NotConfigured(id)),
            NodeState::Ready | NodeState::Fail => {}
        }
        if !self.run_upward(id) {
            self.fail(id, NodeFailure::InputFailed);
            return Ok(NodeState::Fail);
        }
        self.execute(id)
    }

    /// Brings every producer of `id` to `Success`. Producers that are not
    /// configured or already failed are not retried.
    fn run_upward(&mut self, id: NodeId) -> bool {
        let nb_ports = match self.nodes.get(&id) {
            Some(slot) => slot.operation.input_ports().len(),
            None => return false,
        };
        for port in 0..nb_ports {
            let Some(producer) = self.producer(PortRef::new(id, port)) else {
                return false;
            };
            match self.state(producer) {
                Ok(NodeState::Success) => {}
                Ok(NodeState::Ready) => {
                    if !matches!(self.run(producer), Ok(NodeState::Success)) {
                        return false;
                    }
                }
                _ => return false,
            }
        }
        true
    }

    fn fail(&mut self, id: NodeId, failure: NodeFailure) {
        if let Some(slot) = self.nodes.get_mut(&id) {
            warn!("Node {} ({}) failed: {}", id, slot.operation.name(), failure);
            slot.output = None;
            slot.state = NodeState::Fail;
            slot.message = format!("Failed: {failure}.");
        }
    }

    fn execute(&mut self, id: NodeId) -> Result<NodeState, GraphError> {
        let nb_ports = self.slot(id)?.operation.input_ports().len();
        let inputs = Inputs(
            (0..nb_ports)
                .map(|port| {
                    self.producer(PortRef::new(id, port))
                        .and_then(|producer| self.nodes.get(&producer))
                        .and_then(|slot| slot.output.clone())
                })
                .collect(),
        );

        let sources = Arc::clone(&self.sources);
        let progress = &mut self.progress;
        let slot = self.nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))?;
        let mut report = |percent: f64| {
            if let Some(callback) = progress.as_mut() {
                callback(id, percent);
            }
        };
        let mut ctx = RunContext {
            sources: sources.as_ref(),
            progress: &mut report,
        };

        info!("Running node {} ({})", id, slot.operation.name());
        match slot.operation.execute(&inputs, &mut ctx) {
            Ok(payload) => {
                slot.output = Some(payload);
                slot.state = NodeState::Success;
                slot.message = SUCCESS_MESSAGE.to_string();
                info!("Node {id} completed");
                Ok(NodeState::Success)
            }
            Err(failure) => {
                self.fail(id, failure);
                Ok(NodeState::Fail)
            }
        }
    }

    /// Nodes without consumers.
    pub fn sinks(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .copied()
            .filter(|&id| self.links.values().all(|link| link.from != id))
            .collect()
    }

    // --- Persistence ---

    /// Topology and parameters; results are never saved.
    pub fn save(&self) -> ProjectDefinition {
        let nodes = self
            .nodes
            .iter()
            .map(|(id, slot)| NodeRecord {
                category: slot.operation.category().to_string(),
                name: slot.operation.name().to_string(),
                index: id.0,
                x: slot.position.x,
                y: slot.position.y,
                fields: slot.operation.save_fields(),
            })
            .collect();
        let links = self
            .links
            .values()
            .map(|link| LinkRecord {
                from: link.from.0,
                from_port: 0,
                to: link.to.node.0,
                to_port: link.to.port,
            })
            .collect();
        ProjectDefinition { nodes, links }
    }

    /// Replaces the graph content with a saved project. Nodes come back in
    /// `NotConfigured` or `Ready`, never `Success`. On error the graph is
    /// left as it was.
    pub fn load(&mut self, project: &ProjectDefinition) -> Result<(), PersistError> {
        let previous = (
            mem::take(&mut self.nodes),
            mem::take(&mut self.links),
            self.next_node,
            self.next_link,
        );
        let result = self.load_into_empty(project);
        if result.is_err() {
            (self.nodes, self.links, self.next_node, self.next_link) = previous;
        }
        result
    }

    fn load_into_empty(&mut self, project: &ProjectDefinition) -> Result<(), PersistError> {
        for (i, record) in project.nodes.iter().enumerate() {
            // Line 1 holds the node count.
            let line = i + 2;
            let mut operation = self
                .registry
                .create(&record.name)
                .ok_or_else(|| PersistError::UnknownNode {
                    line,
                    name: record.name.clone(),
                })?;
            let state = operation
                .load_fields(&record.fields)
                .map_err(|err| PersistError::InvalidParameters {
                    line,
                    name: record.name.clone(),
                    message: err.to_string(),
                })?;
            let mut slot = NodeSlot::new(operation, Position::new(record.x, record.y));
            slot.state = state;
            if self.nodes.insert(NodeId(record.index), slot).is_some() {
                return Err(PersistError::Malformed {
                    line,
                    message: format!("duplicate node index {}", record.index),
                });
            }
        }
        self.next_node = self.nodes.keys().last().map_or(0, |id| id.0 + 1);

        self.next_link = 0;
        for record in &project.links {
            let from = NodeId(record.from);
            let to = PortRef::new(NodeId(record.to), record.to_port);
            self.check_link(from, to)
                .map_err(|err| PersistError::InvalidLink {
                    from: record.from,
                    to: record.to,
                    message: err.to_string(),
                })?;
            let id = self.next_link;
            self.next_link += 1;
            self.links.insert(id, Link { id, from, to });
        }
        info!(
            "Loaded project with {} nodes and {} links",
            self.nodes.len(),
            self.links.len()
        );
        Ok(())
    }
}
