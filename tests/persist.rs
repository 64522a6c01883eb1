//! Tests for saving and loading projects.
mod common;
use common::*;
use meshflow::prelude::*;
use std::sync::Arc;

fn sources() -> MemorySources {
    MemorySources::new()
        .with_mesh(
            "mesh.json",
            constant_dataset(unit_square_header(&["U", "V", "H", "B"]), &[0.0, 10.0], &[
                ("U", 1.0),
                ("V", 0.0),
                ("H", 2.0),
                ("B", 0.5),
            ]),
        )
        .with_polygons("polygons.json", vec![Polygon::rectangle(0.0, 0.0, 1.0, 1.0)])
        .with_polylines("sections.json", vec![polyline(&[(0.5, 0.0), (0.5, 1.0)])])
}

/// Mesh, polygons and sections feeding a volume, a flux and an arrival node.
fn configured_graph() -> (Graph, [NodeId; 7]) {
    let (mut graph, mesh) = graph_with_mesh(sources());
    let polygons = graph.add_node_by_name("Load 2D Polygons").unwrap();
    let sections = graph.add_node_by_name("Load 2D Open Polylines").unwrap();
    let max = graph.add_node_by_name("Compute Max").unwrap();
    let volume = graph.add_node_by_name("Compute Volume").unwrap();
    let flux = graph.add_node_by_name("Compute Flux").unwrap();
    let arrival = graph.add_node_by_name("Compute Arrival Duration").unwrap();
    graph.set_position(volume, Position::new(250.0, 40.5)).unwrap();

    graph.configure(polygons, region_file("polygons.json")).unwrap();
    graph.configure(sections, region_file("sections.json")).unwrap();
    graph.add_link(mesh, PortRef::new(max, 0)).unwrap();
    graph.add_link(mesh, PortRef::new(volume, 0)).unwrap();
    graph.add_link(polygons, PortRef::new(volume, 1)).unwrap();
    graph.add_link(mesh, PortRef::new(flux, 0)).unwrap();
    graph.add_link(sections, PortRef::new(flux, 1)).unwrap();
    graph.add_link(mesh, PortRef::new(arrival, 0)).unwrap();

    graph
        .configure(
            volume,
            ProposedConfig::Volume {
                first: "H".to_string(),
                second: Some(Subtrahend::InitialValue),
                positive: true,
            },
        )
        .unwrap();
    graph
        .configure(
            flux,
            ProposedConfig::Flux {
                label: "Liquid flux (m3/s): (U, V, H)".to_string(),
            },
        )
        .unwrap();
    graph
        .configure(
            arrival,
            ProposedConfig::ArrivalDuration {
                conditions: vec![
                    ProposedCondition::new("[H] > 1"),
                    ProposedCondition::named("[H] - [B] >= 0.5", "A dry", "D dry"),
                ],
                time_unit: TimeUnit::Minute,
            },
        )
        .unwrap();
    (graph, [mesh, polygons, sections, max, volume, flux, arrival])
}

#[test]
fn test_saved_records() {
    let (graph, [_, _, _, max, volume, flux, arrival]) = configured_graph();
    let project = graph.save();
    assert_eq!(project.nodes.len(), 7);
    assert_eq!(project.links.len(), 6);

    let record = |id: NodeId| project.nodes.iter().find(|n| n.index == id.0).unwrap();
    assert_eq!(record(max).fields, vec![""]);
    assert_eq!(record(volume).fields, vec!["H", "init", "1"]);
    assert_eq!(record(volume).x, 250.0);
    assert_eq!(record(flux).fields, vec!["Liquid flux (m3/s): (U, V, H)"]);
    assert_eq!(
        record(arrival).fields,
        vec![
            "[H] > 1,[H] - [B] >= 0.5",
            "[H] > 1,A [H]>1,D [H]>1,[H] - [B] >= 0.5,A dry,D dry",
            "minute",
        ]
    );

    let text = project.to_string();
    assert!(text.starts_with("7\n"));
    assert!(text.contains("Calculations|Compute Volume|4|250|40.5|H|init|1\n"));
    assert!(text.contains("0|0|4|0\n"));
}

#[test]
fn test_round_trip_restores_parameters_but_not_results() {
    let (mut graph, ids) = configured_graph();
    let [_, _, _, _, volume, flux, arrival] = ids;
    graph.run(volume).unwrap();
    assert_eq!(graph.state(volume).unwrap(), NodeState::Success);
    let text = graph.save().to_string();

    let shared: Arc<dyn DataSources> = Arc::new(sources());
    let mut restored = Graph::builder().with_shared_sources(Arc::clone(&shared)).build();
    restored.load(&ProjectDefinition::parse(&text).unwrap()).unwrap();
    assert_eq!(restored.node_ids(), ids.to_vec());
    for id in ids {
        assert_ne!(restored.state(id).unwrap(), NodeState::Success);
        assert!(restored.output(id).unwrap().is_none());
        assert_eq!(restored.name(id).unwrap(), graph.name(id).unwrap());
    }
    assert_eq!(restored.state(volume).unwrap(), NodeState::Ready);
    assert_eq!(restored.position(volume).unwrap(), Position::new(250.0, 40.5));
    assert_eq!(restored.save(), graph.save());

    for id in graph.sinks() {
        assert_eq!(graph.run(id).unwrap(), NodeState::Success, "node {id}");
        assert_eq!(restored.run(id).unwrap(), NodeState::Success, "node {id}");
    }
    for id in [volume, flux, arrival] {
        let (before, after) = (table_of(&graph, id), table_of(&restored, id));
        assert!(!after.rows.is_empty(), "node {id}");
        assert_eq!(after, before, "node {id}");
    }
    assert_eq!(Arc::strong_count(&shared), 2);
}

#[test]
fn test_new_nodes_get_fresh_indices_after_load() {
    let (graph, _) = configured_graph();
    let mut restored = Graph::builder().with_sources(sources()).build();
    restored.load(&graph.save()).unwrap();
    let added = restored.add_node_by_name("Compute Min").unwrap();
    assert_eq!(added, NodeId(7));
}

#[test]
fn test_unconfigured_nodes_load_as_not_configured() {
    let project = ProjectDefinition::parse(
        "3\n\
         Input/Output|Load Mesh|0|0|0||en|\n\
         Calculations|Compute Volume|1|100|0|||0\n\
         Calculations|Compute Max|2|100|100|\n\
         0|0|2|0\n",
    )
    .unwrap();
    let mut graph = Graph::builder().build();
    graph.load(&project).unwrap();
    assert_eq!(graph.state(NodeId(0)).unwrap(), NodeState::NotConfigured);
    assert_eq!(graph.state(NodeId(1)).unwrap(), NodeState::NotConfigured);
    assert_eq!(graph.state(NodeId(2)).unwrap(), NodeState::Ready);
}

#[test]
fn test_parse_errors() {
    assert!(matches!(
        ProjectDefinition::parse(""),
        Err(PersistError::Malformed { line: 1, .. })
    ));
    assert!(matches!(
        ProjectDefinition::parse("two\n"),
        Err(PersistError::Malformed { line: 1, .. })
    ));
    assert!(matches!(
        ProjectDefinition::parse("1\nInput/Output|Load Mesh\n"),
        Err(PersistError::Malformed { line: 2, .. })
    ));
    assert!(matches!(
        ProjectDefinition::parse("1\nInput/Output|Load Mesh|0|0|0|m|en|\n0|0|1\n"),
        Err(PersistError::Malformed { line: 3, .. })
    ));
}

#[test]
fn test_load_errors_leave_the_graph_untouched() {
    let (mut graph, ids) = configured_graph();
    let before = graph.save();

    let unknown = ProjectDefinition::parse("1\nMisc|Compute Everything|0|0|0|\n").unwrap();
    assert_eq!(
        graph.load(&unknown),
        Err(PersistError::UnknownNode {
            line: 2,
            name: "Compute Everything".to_string(),
        })
    );

    let bad_fields = ProjectDefinition::parse("1\nCalculations|Compute Volume|0|0|0|H||yes\n").unwrap();
    assert!(matches!(
        graph.load(&bad_fields),
        Err(PersistError::InvalidParameters { line: 2, .. })
    ));

    let bad_link = ProjectDefinition::parse(
        "2\n\
         Input/Output|Load 2D Polygons|0|0|0|p.json\n\
         Calculations|Compute Max|1|0|0|\n\
         0|0|1|0\n",
    )
    .unwrap();
    assert!(matches!(
        graph.load(&bad_link),
        Err(PersistError::InvalidLink { from: 0, to: 1, .. })
    ));

    assert_eq!(graph.save(), before);
    assert_eq!(graph.node_ids(), ids.to_vec());
}

#[test]
fn test_project_file_round_trip_on_disk() {
    let (graph, _) = configured_graph();
    let path = std::env::temp_dir().join(format!("meshflow-project-{}.txt", std::process::id()));
    graph.save().write_file(&path).unwrap();
    let loaded = ProjectDefinition::from_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, graph.save());
}
