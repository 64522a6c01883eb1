//! Tests for flux options, the flux calculator and the "Compute Flux" node.
mod common;
use common::*;
use meshflow::calc::{FluxCalculator, FluxKind, FluxOption, available_flux_options};
use meshflow::prelude::*;

fn labels(header: &MeshHeader) -> Vec<String> {
    let selected: Vec<&str> = header.var_ids().collect();
    available_flux_options(header, &selected)
        .into_iter()
        .map(|option| option.label)
        .collect()
}

#[test]
fn test_depth_and_velocity_norm_offer_one_option() {
    let header = unit_square_header(&["H", "M"]);
    assert_eq!(labels(&header), vec!["Liquid flux (m3/s): (M, H)"]);
}

#[test]
fn test_options_follow_the_available_variables() {
    let mut header = unit_square_header(&["U", "V", "H", "I", "J", "QSX", "QSY", "T1"]);
    header.variables[7].name = "TRACER 1".to_string();
    assert_eq!(
        labels(&header),
        vec![
            "Liquid flux (m3/s): (U, V, H)",
            "Solid flux (kg/s): (U, V, H, TRACER 1)",
            "Liquid flux (m3/s): (I, J)",
            "Solid flux TOTAL (m3/s): (QSX, QSY)",
        ]
    );

    let selected = ["U", "V"];
    assert!(available_flux_options(&header, &selected).is_empty());
}

#[test]
fn test_tracer_option_resolves_to_the_variable_id() {
    let mut header = unit_square_header(&["U", "V", "H", "T1"]);
    header.variables[3].name = "TRACER 1".to_string();
    let selected: Vec<&str> = header.var_ids().collect();
    let option = available_flux_options(&header, &selected)
        .into_iter()
        .find(|option| option.label.contains("TRACER"))
        .unwrap();
    assert_eq!(option.kind.variables(), vec!["U", "V", "H", "T1"]);
    assert_eq!(
        FluxOption::label_variables(&option.label),
        Some(vec!["U", "V", "H", "TRACER 1"])
    );
}

#[test]
fn test_arity_dispatch() {
    assert!(matches!(FluxKind::from_variables(&["Q"]), Some(FluxKind::LineIntegral { .. })));
    assert!(matches!(FluxKind::from_variables(&["I", "J"]), Some(FluxKind::LineFlux { .. })));
    assert!(matches!(FluxKind::from_variables(&["M", "H"]), Some(FluxKind::DoubleLineIntegral { .. })));
    assert!(matches!(FluxKind::from_variables(&["U", "V", "H"]), Some(FluxKind::AreaFlux { .. })));
    assert!(matches!(FluxKind::from_variables(&["U", "V", "H", "C"]), Some(FluxKind::MassFlux { .. })));
    assert!(FluxKind::from_variables::<&str>(&[]).is_none());
}

fn run_flux(kind: FluxKind, values: &[(&str, f64)], sections: Vec<Polyline>) -> Table {
    let vars: Vec<&str> = values.iter().map(|&(var, _)| var).collect();
    let header = unit_square_header(&vars);
    let index = index_of(&header);
    let data = constant_dataset(header, &[0.0], values);
    FluxCalculator::new(kind, &sections)
        .run(&data, &index, &[0], &mut |_| {})
        .unwrap()
}

#[test]
fn test_double_line_integral_over_a_diagonal_section() {
    let kind = FluxKind::from_variables(&["M", "H"]).unwrap();
    let table = run_flux(kind, &[("M", 2.0), ("H", 3.0)], vec![polyline(&[(0.1, 0.6), (0.6, 0.1)])]);
    assert_eq!(table.columns, vec!["time", "Section 1"]);
    assert_close(table.rows[0][1], 6.0 * 0.5f64.sqrt());
}

#[test]
fn test_reversing_a_section_flips_the_normal_flux() {
    let kind = FluxKind::from_variables(&["I", "J"]).unwrap();
    let section = polyline(&[(0.5, 0.0), (0.5, 1.0)]);
    let table = run_flux(kind, &[("I", 1.0), ("J", 0.0)], vec![section.clone(), section.reversed()]);
    assert_close(table.rows[0][1], 1.0);
    assert_close(table.rows[0][2], -1.0);
}

#[test]
fn test_area_flux_scales_with_depth() {
    let kind = FluxKind::from_variables(&["U", "V", "H"]).unwrap();
    let section = polyline(&[(0.0, 0.5), (0.5, 0.5), (1.0, 0.5)]);
    // Walking along +x, the right-hand normal points to -y.
    let table = run_flux(kind, &[("U", 0.0), ("V", -2.0), ("H", 1.5)], vec![section]);
    assert_close(table.rows[0][1], 3.0);
}

#[test]
fn test_sections_outside_the_mesh_are_flagged() {
    let kind = FluxKind::from_variables(&["Q"]).unwrap();
    let sections = vec![
        polyline(&[(2.0, 2.0), (3.0, 3.0)]),
        polyline(&[(0.5, 0.5), (0.5, 0.5)]),
        polyline(&[(0.5, 0.5), (1.5, 0.5)]),
    ];
    let table = run_flux(kind, &[("Q", 1.0)], sections);
    assert_eq!(table.rows[0][1], 0.0);
    assert_eq!(table.rows[0][2], 0.0);
    assert_close(table.rows[0][3], 0.5);
    assert_eq!(table.warnings.len(), 3);
    assert_eq!(table.warnings[0], "Section 1 is outside the mesh, its flux is 0");
    assert_eq!(table.warnings[1], "Section 2 has zero length, its flux is 0");
    assert!(table.warnings[2].starts_with("Section 3 is partially outside the mesh"));
}

fn flux_graph(vars: &[(&str, f64)]) -> (Graph, NodeId, NodeId) {
    let names: Vec<&str> = vars.iter().map(|&(v, _)| v).collect();
    let sources = MemorySources::new()
        .with_mesh("mesh.json", constant_dataset(unit_square_header(&names), &[0.0, 5.0], vars))
        .with_polylines("sections.json", vec![polyline(&[(0.1, 0.6), (0.6, 0.1)])]);
    let (mut graph, mesh) = graph_with_mesh(sources);
    let sections = graph.add_node_by_name("Load 2D Open Polylines").unwrap();
    graph.configure(sections, region_file("sections.json")).unwrap();
    let flux = graph.add_node_by_name("Compute Flux").unwrap();
    graph.add_link(mesh, PortRef::new(flux, 0)).unwrap();
    graph.add_link(sections, PortRef::new(flux, 1)).unwrap();
    (graph, mesh, flux)
}

#[test]
fn test_flux_node_end_to_end() {
    let (mut graph, _, flux) = flux_graph(&[("H", 3.0), ("M", 2.0)]);
    assert_eq!(graph.choices(flux).unwrap(), vec!["Liquid flux (m3/s): (M, H)"]);

    graph
        .configure(
            flux,
            ProposedConfig::Flux {
                label: "Liquid flux (m3/s): (M, H)".to_string(),
            },
        )
        .unwrap();
    assert_eq!(graph.run(flux).unwrap(), NodeState::Success);
    let table = table_of(&graph, flux);
    assert_eq!(table.rows.len(), 2);
    assert_close(table.rows[1][1], 6.0 * 0.5f64.sqrt());
}

#[test]
fn test_flux_node_without_any_formula() {
    let (mut graph, _, flux) = flux_graph(&[("B", 1.0)]);
    assert!(graph.choices(flux).unwrap().is_empty());
    let err = graph
        .configure(
            flux,
            ProposedConfig::Flux {
                label: "Liquid flux (m3/s): (Q)".to_string(),
            },
        )
        .unwrap_err();
    assert_eq!(err, GraphError::Config(ConfigError::NoFluxAvailable));
}

#[test]
fn test_flux_node_rejects_unknown_option() {
    let (mut graph, _, flux) = flux_graph(&[("H", 3.0), ("M", 2.0)]);
    let err = graph
        .configure(
            flux,
            ProposedConfig::Flux {
                label: "Liquid flux (m3/s): (Q)".to_string(),
            },
        )
        .unwrap_err();
    assert_eq!(
        err,
        GraphError::Config(ConfigError::UnknownFluxOption("Liquid flux (m3/s): (Q)".to_string()))
    );
}

#[test]
fn test_flux_option_is_dropped_when_variables_disappear() {
    let (mut graph, mesh, flux) = flux_graph(&[("H", 3.0), ("M", 2.0), ("Q", 1.0)]);
    graph
        .configure(
            flux,
            ProposedConfig::Flux {
                label: "Liquid flux (m3/s): (M, H)".to_string(),
            },
        )
        .unwrap();
    graph.run(flux).unwrap();

    graph
        .configure(
            mesh,
            ProposedConfig::LoadMesh {
                filename: "mesh.json".to_string(),
                language: Language::En,
                variables: Some(vec!["Q".to_string()]),
            },
        )
        .unwrap();
    assert_eq!(graph.state(flux).unwrap(), NodeState::NotConfigured);
    assert!(graph.output(flux).unwrap().is_none());
    assert_eq!(graph.choices(flux).unwrap(), vec!["Liquid flux (m3/s): (Q)"]);
}
