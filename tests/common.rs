//! Common test utilities for building meshes, datasets and graphs.
use ahash::AHashMap;
use meshflow::mesh::{MeshIndex, Point2};
use meshflow::prelude::*;

pub const TOLERANCE: f64 = 1e-9;

#[allow(dead_code)]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() <= TOLERANCE * expected.abs().max(1.0),
        "expected {expected}, got {actual}"
    );
}

/// Two triangles: `[0, 1, 2]` with area 1 and `[1, 3, 2]` with area 2.
///
/// Nodes: (0, 0), (1, 0), (0, 2), (2, 2).
#[allow(dead_code)]
pub fn two_triangle_header(vars: &[&str]) -> MeshHeader {
    MeshHeader {
        title: "two triangles".to_string(),
        x: vec![0.0, 1.0, 0.0, 2.0],
        y: vec![0.0, 0.0, 2.0, 2.0],
        ikle: vec![[0, 1, 2], [1, 3, 2]],
        variables: vars.iter().map(|v| VariableInfo::new(v, v, "")).collect(),
        nb_frames: 0,
    }
}

/// The unit square split along its diagonal: `[0, 1, 2]` and `[0, 2, 3]`.
///
/// Nodes: (0, 0), (1, 0), (1, 1), (0, 1).
#[allow(dead_code)]
pub fn unit_square_header(vars: &[&str]) -> MeshHeader {
    MeshHeader {
        title: "unit square".to_string(),
        x: vec![0.0, 1.0, 1.0, 0.0],
        y: vec![0.0, 0.0, 1.0, 1.0],
        ikle: vec![[0, 1, 2], [0, 2, 3]],
        variables: vars.iter().map(|v| VariableInfo::new(v, v, "")).collect(),
        nb_frames: 0,
    }
}

/// A dataset whose every variable takes the given constant in every frame.
#[allow(dead_code)]
pub fn constant_dataset(header: MeshHeader, times: &[f64], values: &[(&str, f64)]) -> Dataset {
    let nb_nodes = header.nb_nodes();
    let frames = times
        .iter()
        .map(|_| {
            values
                .iter()
                .map(|&(var, value)| (var.to_string(), vec![value; nb_nodes]))
                .collect::<AHashMap<_, _>>()
        })
        .collect();
    Dataset::new(header, times.to_vec(), frames)
}

/// A dataset from explicit nodal values, `frames[k]` listing `(var, values)`.
#[allow(dead_code)]
pub fn dataset(header: MeshHeader, times: &[f64], frames: Vec<Vec<(&str, Vec<f64>)>>) -> Dataset {
    let frames = frames
        .into_iter()
        .map(|frame| {
            frame
                .into_iter()
                .map(|(var, values)| (var.to_string(), values))
                .collect::<AHashMap<_, _>>()
        })
        .collect();
    Dataset::new(header, times.to_vec(), frames)
}

#[allow(dead_code)]
pub fn index_of(header: &MeshHeader) -> MeshIndex {
    MeshIndex::build(header).expect("valid test mesh")
}

#[allow(dead_code)]
pub fn polygon(points: &[(f64, f64)]) -> Polygon {
    Polygon::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
}

#[allow(dead_code)]
pub fn polyline(points: &[(f64, f64)]) -> Polyline {
    Polyline::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect())
}

#[allow(dead_code)]
pub fn load_mesh(filename: &str) -> ProposedConfig {
    ProposedConfig::LoadMesh {
        filename: filename.to_string(),
        language: Language::En,
        variables: None,
    }
}

#[allow(dead_code)]
pub fn region_file(filename: &str) -> ProposedConfig {
    ProposedConfig::RegionFile {
        filename: filename.to_string(),
    }
}

/// A graph over `sources` with a configured "Load Mesh" node reading `mesh.json`.
#[allow(dead_code)]
pub fn graph_with_mesh(sources: MemorySources) -> (Graph, NodeId) {
    let mut graph = Graph::builder().with_sources(sources).build();
    let mesh = graph.add_node_by_name("Load Mesh").expect("built-in node");
    graph.configure(mesh, load_mesh("mesh.json")).expect("mesh configured");
    (graph, mesh)
}

#[allow(dead_code)]
pub fn table_of(graph: &Graph, id: NodeId) -> std::sync::Arc<Table> {
    match graph.output(id).expect("node exists") {
        Some(Payload::Table(table)) => table.clone(),
        other => panic!("expected a table, got {other:?}"),
    }
}
