use crate::data::{Language, MeshData, Payload};
use crate::error::{ConfigError, NodeFailure, ReadError};
use crate::graph::{Inputs, NodeState, Operation, PortKind, ProposedConfig, RunContext};
use log::debug;
use std::sync::Arc;

const CATEGORY: &str = "Input/Output";

fn configured(filename: &Option<String>) -> NodeState {
    if filename.is_some() {
        NodeState::Ready
    } else {
        NodeState::NotConfigured
    }
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

/// Opens a result file and exposes all of its frames.
#[derive(Debug, Default)]
pub struct LoadMesh {
    filename: Option<String>,
    language: Language,
    variables: Option<Vec<String>>,
}

impl Operation for LoadMesh {
    fn name(&self) -> &'static str {
        "Load Mesh"
    }

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn input_ports(&self) -> &'static [PortKind] {
        &[]
    }

    fn output_port(&self) -> PortKind {
        PortKind::Mesh
    }

    fn revalidate(&mut self, _primary: Option<&Payload>) -> NodeState {
        configured(&self.filename)
    }

    fn configure(&mut self, _primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
        let ProposedConfig::LoadMesh {
            filename,
            language,
            variables,
        } = proposal
        else {
            return Err(ConfigError::WrongProposal {
                node: self.name(),
                expected: "LoadMesh",
            });
        };
        if filename.is_empty() {
            return Err(ConfigError::MissingParameter("filename"));
        }
        self.filename = Some(filename);
        self.language = language;
        self.variables = variables.filter(|vars| !vars.is_empty());
        Ok(())
    }

    fn save_fields(&self) -> Vec<String> {
        vec![
            self.filename.clone().unwrap_or_default(),
            self.language.to_string(),
            self.variables.as_ref().map(|v| v.join(",")).unwrap_or_default(),
        ]
    }

    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError> {
        let [filename, language, variables] = fields else {
            return Err(ConfigError::FieldCount {
                expected: 3,
                found: fields.len(),
            });
        };
        self.filename = non_empty(filename);
        self.language = language.parse().map_err(|_| ConfigError::InvalidField {
            field: "language",
            value: language.clone(),
        })?;
        self.variables = non_empty(variables).map(|v| v.split(',').map(str::to_string).collect());
        Ok(configured(&self.filename))
    }

    fn execute(&mut self, _inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
        let filename = self.filename.as_deref().ok_or(NodeFailure::NotConfigured)?;
        let reader = ctx.sources.open_mesh(filename, self.language)?;
        let mut data = MeshData::new(filename, self.language, reader.header().clone(), reader.time().to_vec());
        if let Some(variables) = &self.variables {
            if let Some(missing) = variables.iter().find(|v| !data.header.has_var(v)) {
                return Err(ReadError::Request(format!("Variable '{missing}' does not exist")).into());
            }
            data = data.with_selected_vars(variables);
        }
        debug!(
            "Loaded '{}': {} nodes, {} frames",
            filename,
            data.header.nb_nodes(),
            data.time.len()
        );
        Ok(Payload::Mesh(data))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Polygons,
    Polylines,
}

/// Reads a set of 2D regions: closed polygons or open polylines.
#[derive(Debug)]
pub struct LoadRegions {
    kind: RegionKind,
    filename: Option<String>,
}

impl LoadRegions {
    pub fn polygons() -> Self {
        Self {
            kind: RegionKind::Polygons,
            filename: None,
        }
    }

    pub fn polylines() -> Self {
        Self {
            kind: RegionKind::Polylines,
            filename: None,
        }
    }
}

impl Operation for LoadRegions {
    fn name(&self) -> &'static str {
        match self.kind {
            RegionKind::Polygons => "Load 2D Polygons",
            RegionKind::Polylines => "Load 2D Open Polylines",
        }
    }

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn input_ports(&self) -> &'static [PortKind] {
        &[]
    }

    fn output_port(&self) -> PortKind {
        match self.kind {
            RegionKind::Polygons => PortKind::PolygonSet,
            RegionKind::Polylines => PortKind::PolylineSet,
        }
    }

    fn revalidate(&mut self, _primary: Option<&Payload>) -> NodeState {
        configured(&self.filename)
    }

    fn configure(&mut self, _primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
        let ProposedConfig::RegionFile { filename } = proposal else {
            return Err(ConfigError::WrongProposal {
                node: self.name(),
                expected: "RegionFile",
            });
        };
        if filename.is_empty() {
            return Err(ConfigError::MissingParameter("filename"));
        }
        self.filename = Some(filename);
        Ok(())
    }

    fn save_fields(&self) -> Vec<String> {
        vec![self.filename.clone().unwrap_or_default()]
    }

    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError> {
        let [filename] = fields else {
            return Err(ConfigError::FieldCount {
                expected: 1,
                found: fields.len(),
            });
        };
        self.filename = non_empty(filename);
        Ok(configured(&self.filename))
    }

    fn execute(&mut self, _inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
        let filename = self.filename.as_deref().ok_or(NodeFailure::NotConfigured)?;
        Ok(match self.kind {
            RegionKind::Polygons => Payload::Polygons(Arc::new(ctx.sources.read_polygons(filename)?)),
            RegionKind::Polylines => Payload::Polylines(Arc::new(ctx.sources.read_polylines(filename)?)),
        })
    }
}
