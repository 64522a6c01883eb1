use crate::calc::{FluxCalculator, FluxOption, available_flux_options};
use crate::data::{MeshData, Payload};
use crate::error::{ConfigError, NodeFailure};
use crate::graph::{Inputs, NodeState, Operation, PortKind, ProposedConfig, RunContext};
use log::debug;
use std::sync::Arc;

fn options_of(mesh: &MeshData) -> Vec<FluxOption> {
    available_flux_options(&mesh.header, &mesh.available_vars())
}

/// Flux through each section, per selected frame.
///
/// The formula is chosen among those computable from the input variables;
/// the list is rebuilt every time the input changes.
#[derive(Debug, Default)]
pub struct ComputeFlux {
    label: Option<String>,
    options: Vec<FluxOption>,
}

impl Operation for ComputeFlux {
    fn name(&self) -> &'static str {
        "Compute Flux"
    }

    fn category(&self) -> &'static str {
        "Calculations"
    }

    fn input_ports(&self) -> &'static [PortKind] {
        &[PortKind::Mesh, PortKind::PolylineSet]
    }

    fn output_port(&self) -> PortKind {
        PortKind::Table
    }

    fn revalidate(&mut self, primary: Option<&Payload>) -> NodeState {
        let Some(mesh) = primary.and_then(Payload::as_mesh) else {
            self.options.clear();
            return NodeState::NotConfigured;
        };
        self.options = options_of(mesh);
        if let Some(label) = &self.label {
            if !self.options.iter().any(|option| &option.label == label) {
                debug!("Flux option '{label}' is no longer available");
                self.label = None;
            }
        }
        if self.label.is_some() {
            NodeState::Ready
        } else {
            NodeState::NotConfigured
        }
    }

    fn configure(&mut self, primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
        let ProposedConfig::Flux { label } = proposal else {
            return Err(ConfigError::WrongProposal {
                node: self.name(),
                expected: "Flux",
            });
        };
        let mesh = primary.and_then(Payload::as_mesh).ok_or(ConfigError::InputNotReady)?;
        let options = options_of(mesh);
        if options.is_empty() {
            return Err(ConfigError::NoFluxAvailable);
        }
        if !options.iter().any(|option| option.label == label) {
            return Err(ConfigError::UnknownFluxOption(label));
        }
        self.options = options;
        self.label = Some(label);
        Ok(())
    }

    fn save_fields(&self) -> Vec<String> {
        vec![self.label.clone().unwrap_or_default()]
    }

    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError> {
        let [label] = fields else {
            return Err(ConfigError::FieldCount {
                expected: 1,
                found: fields.len(),
            });
        };
        self.options.clear();
        if label.is_empty() {
            self.label = None;
            return Ok(NodeState::NotConfigured);
        }
        if FluxOption::label_variables(label).is_none() {
            return Err(ConfigError::InvalidField {
                field: "flux option",
                value: label.clone(),
            });
        }
        self.label = Some(label.clone());
        Ok(NodeState::Ready)
    }

    fn execute(&mut self, inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
        let label = self.label.as_deref().ok_or(NodeFailure::NotConfigured)?;
        let mesh = inputs.mesh(0)?;
        let sections = inputs.polylines(1)?;
        // Options are not known yet after a project load.
        let kind = options_of(mesh)
            .into_iter()
            .find(|option| option.label == label)
            .map(|option| option.kind)
            .ok_or_else(|| ConfigError::UnknownFluxOption(label.to_string()))?;
        let index = mesh.index()?;
        let reader = mesh.open_reader(ctx.sources)?;
        let calculator = FluxCalculator::new(kind, sections);
        let table = calculator.run(&*reader, &index, &mesh.selected_time_indices, &mut *ctx.progress)?;
        Ok(Payload::Table(Arc::new(table)))
    }

    fn choices(&self) -> Vec<String> {
        self.options.iter().map(|option| option.label.clone()).collect()
    }
}
