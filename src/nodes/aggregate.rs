use crate::data::{Operator, Payload};
use crate::error::{ConfigError, NodeFailure};
use crate::graph::{Inputs, NodeState, Operation, PortKind, ProposedConfig, RunContext};

/// Defines the temporal-aggregation tag nodes. They carry no parameter and
/// never read their input while being configured.
macro_rules! define_aggregate_nodes {
    ( $( ($struct_name:ident, $operator:expr) ),* $(,)? ) => {
        $(
            #[derive(Debug, Default)]
            pub struct $struct_name;

            impl Operation for $struct_name {
                fn name(&self) -> &'static str {
                    $operator.node_name()
                }

                fn category(&self) -> &'static str {
                    "Calculations"
                }

                fn input_ports(&self) -> &'static [PortKind] {
                    &[PortKind::Mesh]
                }

                fn output_port(&self) -> PortKind {
                    PortKind::Mesh
                }

                fn initial_state(&self) -> NodeState {
                    NodeState::Ready
                }

                fn reads_input_schema(&self) -> bool {
                    false
                }

                fn revalidate(&mut self, _primary: Option<&Payload>) -> NodeState {
                    NodeState::Ready
                }

                fn configure(&mut self, _primary: Option<&Payload>, proposal: ProposedConfig) -> Result<(), ConfigError> {
                    match proposal {
                        ProposedConfig::None => Ok(()),
                        _ => Err(ConfigError::WrongProposal {
                            node: self.name(),
                            expected: "None",
                        }),
                    }
                }

                fn save_fields(&self) -> Vec<String> {
                    vec![String::new()]
                }

                fn load_fields(&mut self, _fields: &[String]) -> Result<NodeState, ConfigError> {
                    Ok(NodeState::Ready)
                }

                fn execute(&mut self, inputs: &Inputs, _ctx: &mut RunContext<'_>) -> Result<Payload, NodeFailure> {
                    let data = inputs.mesh(0)?.with_operator($operator)?;
                    Ok(Payload::Mesh(data))
                }
            }
        )*
    };
}

define_aggregate_nodes! {
    (ComputeMax, Operator::Max),
    (ComputeMin, Operator::Min),
    (ComputeMean, Operator::Mean),
}
