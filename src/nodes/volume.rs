use crate::calc::{Subtrahend, VolumeCalculator, VolumeKind};
use crate::data::Payload;
use crate::error::{ConfigError, NodeFailure};
use crate::graph::{Inputs, NodeState, Operation, PortKind, ProposedConfig, RunContext};
use std::sync::Arc;

/// Volume of a variable inside each polygon, per selected frame.
#[derive(Debug, Default)]
pub struct ComputeVolume {
    first: Option<String>,
    second: Option<Subtrahend>,
    positive: bool,
    /// Variables offered by the input when it was last inspected.
    available: Vec<String>,
}

impl ComputeVolume {
    fn kind(&self) -> VolumeKind {
        if self.positive {
            VolumeKind::Positive
        } else {
            VolumeKind::Net
        }
    }

    fn clear(&mut self) {
        self.first = None;
        self.second = None;
        self.positive = false;
    }

    fn state(&self) -> NodeState {
        if self.first.is_some() {
            NodeState::Ready
        } else {
            NodeState::NotConfigured
        }
    }
}

fn available_vars(primary: Option<&Payload>) -> Vec<String> {
    primary
        .and_then(Payload::as_mesh)
        .map(|mesh| mesh.available_vars().into_iter().map(str::to_string).collect())
        .unwrap_or_default()
}

fn check_variables(primary: Option<&Payload>, first: &str, second: Option<&Subtrahend>) -> Result<(), ConfigError> {
    let mesh = primary.and_then(Payload::as_mesh).ok_or(ConfigError::InputNotReady)?;
    if !mesh.is_selected(first) {
        return Err(ConfigError::UnknownVariable(first.to_string()));
    }
    if let Some(Subtrahend::Variable(var)) = second {
        if !mesh.is_selected(var) {
            return Err(ConfigError::UnknownVariable(var.clone()));
        }
    }
    Ok(())
}

impl Operation for ComputeVolume {
    fn name(&self) -> &'static str {
        "Compute Volume"
    }

    fn category(&self) -> &'static str {
        "Calculations"
    }

    fn input_ports(&self) -> &'static [PortKind] {
        &[PortKind::Mesh, PortKind::PolygonSet]
    }

    fn output_port(&self) -> PortKind {
        PortKind::Table
    }

    fn revalidate(&mut self, primary: Option<&Payload>) -> NodeState {
        self.available = available_vars(primary);
        let Some(first) = self.first.as_deref() else {
            return NodeState::NotConfigured;
        };
        // Parameters wait for an input to be checked against.
        if primary.is_none() {
            return NodeState::NotConfigured;
        }
        if check_variables(primary, first, self.second.as_ref()).is_err() {
            self.clear();
        }
        self.state()
    }

    fn configure(&mut self, primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
        let ProposedConfig::Volume { first, second, positive } = proposal else {
            return Err(ConfigError::WrongProposal {
                node: self.name(),
                expected: "Volume",
            });
        };
        check_variables(primary, &first, second.as_ref())?;
        self.available = available_vars(primary);
        self.first = Some(first);
        self.second = second;
        self.positive = positive;
        Ok(())
    }

    fn save_fields(&self) -> Vec<String> {
        vec![
            self.first.clone().unwrap_or_default(),
            self.second.as_ref().map(Subtrahend::to_string).unwrap_or_default(),
            u8::from(self.positive).to_string(),
        ]
    }

    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError> {
        let [first, second, positive] = fields else {
            return Err(ConfigError::FieldCount {
                expected: 3,
                found: fields.len(),
            });
        };
        self.positive = match positive.as_str() {
            "0" => false,
            "1" => true,
            other => {
                return Err(ConfigError::InvalidField {
                    field: "positive volume flag",
                    value: other.to_string(),
                });
            }
        };
        self.first = (!first.is_empty()).then(|| first.clone());
        self.second = match second.as_str() {
            "" => None,
            text => text.parse().ok(),
        };
        if self.first.is_none() {
            self.clear();
        }
        Ok(self.state())
    }

    fn execute(&mut self, inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
        let first = self.first.as_deref().ok_or(NodeFailure::NotConfigured)?;
        let mesh = inputs.mesh(0)?;
        let polygons = inputs.polygons(1)?;
        let index = mesh.index()?;
        let reader = mesh.open_reader(ctx.sources)?;
        let calculator = VolumeCalculator::new(self.kind(), first, self.second.clone(), polygons);
        let table = calculator.run(&*reader, &index, &mesh.selected_time_indices, &mut *ctx.progress)?;
        Ok(Payload::Table(Arc::new(table)))
    }

    fn choices(&self) -> Vec<String> {
        self.available.clone()
    }
}
