//! Tests for conditions, arrival/duration computation and the
//! "Compute Arrival Duration" node.
mod common;
use common::*;
use meshflow::ast::{Comparator, parse_expression};
use meshflow::calc::arrival::{validate_column_name, validate_columns};
use meshflow::calc::{ArrivalDurationCalculator, Condition, ConditionColumns};
use meshflow::prelude::*;

fn depth_wave() -> Dataset {
    dataset(
        unit_square_header(&["H"]),
        &[0.0, 10.0, 20.0, 30.0],
        vec![
            vec![("H", vec![0.0; 4])],
            vec![("H", vec![1.0; 4])],
            vec![("H", vec![1.0; 4])],
            vec![("H", vec![0.0; 4])],
        ],
    )
}

#[test]
fn test_condition_parsing_and_display() {
    let condition = Condition::parse("[H]+2*[U] >= -1.5").unwrap();
    assert_eq!(condition.comparator, Comparator::GreaterThanOrEqual);
    assert_eq!(condition.threshold, -1.5);
    assert_eq!(condition.to_string(), "[H] + 2 * [U] >= -1.5");
    assert_eq!(condition.tight(), "[H]+2*[U]>=-1.5");
    assert_eq!(
        condition.required_variables().into_iter().collect::<Vec<_>>(),
        vec!["H", "U"]
    );
    assert_eq!(Condition::parse(&condition.to_string()).unwrap(), condition);
}

#[test]
fn test_condition_parsing_errors() {
    assert!(matches!(
        Condition::parse("[H] 0.5"),
        Err(ConfigError::InvalidExpression { .. })
    ));
    assert!(matches!(
        Condition::parse("[H] > [U]"),
        Err(ConfigError::InvalidExpression { .. })
    ));
    assert!(matches!(
        Condition::parse("[H] > 1 < 2"),
        Err(ConfigError::InvalidExpression { .. })
    ));
    assert!(matches!(
        Condition::new("[H] > 1", Comparator::GreaterThan, 1.0),
        Err(ConfigError::InvalidExpression { .. })
    ));
    assert!(parse_expression("([H] + 1").is_err());
}

#[test]
fn test_operator_precedence() {
    let expression = parse_expression("1 + 2 * [H] - -3").unwrap();
    assert_eq!(expression.to_string(), "((1 + (2 * [H])) - -3)");
}

#[test]
fn test_arrival_and_duration_in_seconds() {
    let data = depth_wave();
    let columns = vec![ConditionColumns::with_default_names(Condition::parse("[H] > 0.5").unwrap())];
    let calculator = ArrivalDurationCalculator::new(&columns, TimeUnit::Second);
    let table = calculator.run(&data, &[0, 1, 2, 3], &mut |_| {}).unwrap();

    assert_eq!(table.columns, vec!["node", "x", "y", "A [H]>0.5", "D [H]>0.5"]);
    assert_eq!(table.rows.len(), 4);
    assert_eq!(table.rows[2][..3], [2.0, 1.0, 1.0]);
    for row in &table.rows {
        assert_close(row[3], 10.0);
        assert_close(row[4], 20.0);
    }
}

#[test]
fn test_duration_as_percentage_and_minutes() {
    let data = depth_wave();
    let columns = vec![ConditionColumns::with_default_names(Condition::parse("[H] > 0.5").unwrap())];

    let percentage = ArrivalDurationCalculator::new(&columns, TimeUnit::Percentage)
        .run(&data, &[0, 1, 2, 3], &mut |_| {})
        .unwrap();
    assert_close(percentage.rows[0][3], 10.0);
    assert_close(percentage.rows[0][4], 200.0 / 3.0);

    let minutes = ArrivalDurationCalculator::new(&columns, TimeUnit::Minute)
        .run(&data, &[0, 1, 2, 3], &mut |_| {})
        .unwrap();
    assert_close(minutes.rows[0][3], 10.0 / 60.0);
    assert_close(minutes.rows[0][4], 20.0 / 60.0);
}

#[test]
fn test_condition_never_met_has_no_arrival() {
    let data = depth_wave();
    let columns = vec![ConditionColumns::with_default_names(Condition::parse("[H] > 5").unwrap())];
    let table = ArrivalDurationCalculator::new(&columns, TimeUnit::Second)
        .run(&data, &[0, 1, 2, 3], &mut |_| {})
        .unwrap();
    assert!(table.rows[0][3].is_nan());
    assert_eq!(table.rows[0][4], 0.0);
}

#[test]
fn test_default_column_names_are_cut() {
    let columns = ConditionColumns::with_default_names(Condition::parse("[HAUTEUR] + 1 > 10.5").unwrap());
    assert_eq!(columns.arrival, "A [HAUTEUR]+1>10");
    assert_eq!(columns.duration, "D [HAUTEUR]+1>10");
}

#[test]
fn test_column_name_rules() {
    assert!(validate_column_name("ok", &[]).is_ok());
    assert!(validate_column_name("x", &[]).is_err());
    assert!(validate_column_name("seventeen chars!!", &[]).is_err());
    assert!(validate_column_name("a,b", &[]).is_err());
    assert!(validate_column_name("a|b", &[]).is_err());
    assert!(validate_column_name("taken", &["taken"]).is_err());
}

#[test]
fn test_duplicate_conditions_are_rejected() {
    let first = ConditionColumns::with_default_names(Condition::parse("[H] > 0.5").unwrap());
    let mut second = first.clone();
    second.arrival = "other A".to_string();
    second.duration = "other D".to_string();
    assert_eq!(
        validate_columns(&[first, second]),
        Err(ConfigError::DuplicateCondition("[H] > 0.5".to_string()))
    );
}

fn arrival_graph() -> (Graph, NodeId, NodeId) {
    let sources = MemorySources::new().with_mesh("mesh.json", depth_wave());
    let (mut graph, mesh) = graph_with_mesh(sources);
    let arrival = graph.add_node_by_name("Compute Arrival Duration").unwrap();
    graph.add_link(mesh, PortRef::new(arrival, 0)).unwrap();
    (graph, mesh, arrival)
}

#[test]
fn test_arrival_node_end_to_end() {
    let (mut graph, _, arrival) = arrival_graph();
    graph
        .configure(
            arrival,
            ProposedConfig::ArrivalDuration {
                conditions: vec![ProposedCondition::named("[H] > 0.5", "wet", "wet time")],
                time_unit: TimeUnit::Second,
            },
        )
        .unwrap();
    assert_eq!(graph.run(arrival).unwrap(), NodeState::Success);
    let table = table_of(&graph, arrival);
    assert_eq!(table.column("wet").unwrap(), vec![10.0; 4]);
    assert_eq!(table.column("wet time").unwrap(), vec![20.0; 4]);
}

#[test]
fn test_arrival_node_rejects_unknown_variables_and_bad_names() {
    let (mut graph, _, arrival) = arrival_graph();
    let err = graph
        .configure(
            arrival,
            ProposedConfig::ArrivalDuration {
                conditions: vec![ProposedCondition::new("[U] > 0.5")],
                time_unit: TimeUnit::Second,
            },
        )
        .unwrap_err();
    assert_eq!(err, GraphError::Config(ConfigError::UnknownVariable("U".to_string())));

    let err = graph
        .configure(
            arrival,
            ProposedConfig::ArrivalDuration {
                conditions: vec![ProposedCondition::named("[H] > 0.5", "same", "same")],
                time_unit: TimeUnit::Second,
            },
        )
        .unwrap_err();
    assert!(matches!(err, GraphError::Config(ConfigError::InvalidColumnName { .. })));
    assert_eq!(graph.state(arrival).unwrap(), NodeState::NotConfigured);
}

#[test]
fn test_arrival_node_drops_conditions_when_a_variable_disappears() {
    let header = unit_square_header(&["H", "U"]);
    let sources = MemorySources::new().with_mesh(
        "mesh.json",
        constant_dataset(header, &[0.0, 1.0], &[("H", 1.0), ("U", 0.0)]),
    );
    let (mut graph, mesh, arrival) = {
        let (mut graph, mesh) = graph_with_mesh(sources);
        let arrival = graph.add_node_by_name("Compute Arrival Duration").unwrap();
        graph.add_link(mesh, PortRef::new(arrival, 0)).unwrap();
        (graph, mesh, arrival)
    };
    graph
        .configure(
            arrival,
            ProposedConfig::ArrivalDuration {
                conditions: vec![ProposedCondition::new("[H] > 0.5"), ProposedCondition::new("[U] < 1")],
                time_unit: TimeUnit::Hour,
            },
        )
        .unwrap();
    assert_eq!(graph.state(arrival).unwrap(), NodeState::Ready);

    graph
        .configure(
            mesh,
            ProposedConfig::LoadMesh {
                filename: "mesh.json".to_string(),
                language: Language::En,
                variables: Some(vec!["H".to_string()]),
            },
        )
        .unwrap();
    assert_eq!(graph.state(arrival).unwrap(), NodeState::NotConfigured);
    assert_eq!(graph.save().nodes[1].fields, vec!["", "", "hour"]);
}
