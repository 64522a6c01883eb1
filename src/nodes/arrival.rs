use crate::calc::{ArrivalDurationCalculator, Condition, ConditionColumns, TimeUnit, arrival::validate_columns};
use crate::data::{MeshData, Payload};
use crate::error::{ConfigError, NodeFailure};
use crate::graph::{Inputs, NodeState, Operation, PortKind, ProposedCondition, ProposedConfig, RunContext};
use itertools::Itertools;
use std::sync::Arc;

/// Arrival time and duration of a list of conditions at every node.
#[derive(Debug, Default)]
pub struct ComputeArrivalDuration {
    columns: Vec<ConditionColumns>,
    time_unit: TimeUnit,
}

impl ComputeArrivalDuration {
    fn state(&self) -> NodeState {
        if self.columns.is_empty() {
            NodeState::NotConfigured
        } else {
            NodeState::Ready
        }
    }
}

fn check_variables(mesh: &MeshData, columns: &[ConditionColumns]) -> Result<(), ConfigError> {
    columns
        .iter()
        .flat_map(|column| column.condition.required_variables())
        .find(|var| !mesh.is_selected(var))
        .map_or(Ok(()), |var| Err(ConfigError::UnknownVariable(var)))
}

fn build_column(proposed: ProposedCondition) -> Result<ConditionColumns, ConfigError> {
    let condition = Condition::parse(&proposed.text)?;
    let defaults = ConditionColumns::with_default_names(condition);
    Ok(ConditionColumns {
        arrival: proposed.arrival.unwrap_or(defaults.arrival),
        duration: proposed.duration.unwrap_or(defaults.duration),
        condition: defaults.condition,
    })
}

impl Operation for ComputeArrivalDuration {
    fn name(&self) -> &'static str {
        "Compute Arrival Duration"
    }

    fn category(&self) -> &'static str {
        "Calculations"
    }

    fn input_ports(&self) -> &'static [PortKind] {
        &[PortKind::Mesh]
    }

    fn output_port(&self) -> PortKind {
        PortKind::Table
    }

    fn revalidate(&mut self, primary: Option<&Payload>) -> NodeState {
        let Some(mesh) = primary.and_then(Payload::as_mesh) else {
            return NodeState::NotConfigured;
        };
        if check_variables(mesh, &self.columns).is_err() {
            self.columns.clear();
        }
        self.state()
    }

    fn configure(&mut self, primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
        let ProposedConfig::ArrivalDuration { conditions, time_unit } = proposal else {
            return Err(ConfigError::WrongProposal {
                node: self.name(),
                expected: "ArrivalDuration",
            });
        };
        let mesh = primary.and_then(Payload::as_mesh).ok_or(ConfigError::InputNotReady)?;
        if conditions.is_empty() {
            return Err(ConfigError::MissingParameter("conditions"));
        }
        let columns = conditions
            .into_iter()
            .map(build_column)
            .collect::<Result<Vec<_>, _>>()?;
        validate_columns(&columns)?;
        check_variables(mesh, &columns)?;
        self.columns = columns;
        self.time_unit = time_unit;
        Ok(())
    }

    /// Conditions, then the `(condition, arrival, duration)` table flattened,
    /// then the time unit.
    fn save_fields(&self) -> Vec<String> {
        let conditions = self.columns.iter().map(|c| c.condition.to_string()).join(",");
        let table = self
            .columns
            .iter()
            .flat_map(|c| [c.condition.to_string(), c.arrival.clone(), c.duration.clone()])
            .join(",");
        vec![conditions, table, self.time_unit.to_string()]
    }

    fn load_fields(&mut self, fields: &[String]) -> Result<NodeState, ConfigError> {
        let [conditions, table, time_unit] = fields else {
            return Err(ConfigError::FieldCount {
                expected: 3,
                found: fields.len(),
            });
        };
        let time_unit: TimeUnit = time_unit.parse()?;
        let mut columns = Vec::new();
        if !conditions.is_empty() {
            let texts: Vec<&str> = conditions.split(',').collect();
            let cells: Vec<&str> = table.split(',').collect();
            if cells.len() != 3 * texts.len() {
                return Err(ConfigError::InvalidField {
                    field: "condition table",
                    value: table.clone(),
                });
            }
            for (text, row) in texts.iter().zip(cells.chunks(3)) {
                if row[0] != *text {
                    return Err(ConfigError::InvalidField {
                        field: "condition table",
                        value: row[0].to_string(),
                    });
                }
                columns.push(build_column(ProposedCondition::named(text, row[1], row[2]))?);
            }
            validate_columns(&columns)?;
        }
        self.columns = columns;
        self.time_unit = time_unit;
        Ok(self.state())
    }

    fn execute(&mut self, inputs: &Inputs, ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
        if self.columns.is_empty() {
            return Err(NodeFailure::NotConfigured);
        }
        let mesh = inputs.mesh(0)?;
        let reader = mesh.open_reader(ctx.sources)?;
        let calculator = ArrivalDurationCalculator::new(&self.columns, self.time_unit);
        let table = calculator.run(&*reader, &mesh.selected_time_indices, &mut *ctx.progress)?;
        Ok(Payload::Table(Arc::new(table)))
    }

    fn choices(&self) -> Vec<String> {
        TimeUnit::ALL.iter().map(TimeUnit::to_string).collect()
    }
}
