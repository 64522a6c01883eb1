use super::Language;
use crate::error::ReadError;
use crate::mesh::{MeshHeader, Point2, Polygon, Polyline};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read access to one opened result file.
pub trait MeshReader {
    fn header(&self) -> &MeshHeader;

    fn time(&self) -> &[f64];

    /// Nodal values of `var_id` in frame `frame`.
    fn read_var_in_frame(&self, frame: usize, var_id: &str) -> Result<Vec<f64>, ReadError>;

    /// Like [`MeshReader::read_var_in_frame`], but fails unless the frame
    /// holds exactly one value per mesh node.
    fn read_nodal_values(&self, frame: usize, var_id: &str, nb_nodes: usize) -> Result<Vec<f64>, ReadError> {
        let values = self.read_var_in_frame(frame, var_id)?;
        if values.len() != nb_nodes {
            return Err(ReadError::Validation(format!(
                "Variable '{var_id}' has {} values in frame {frame}, expected {nb_nodes}",
                values.len()
            )));
        }
        Ok(values)
    }
}

/// Where source nodes and calculators get their files from.
pub trait DataSources: Send + Sync {
    fn open_mesh(&self, filename: &str, language: Language) -> Result<Box<dyn MeshReader + '_>, ReadError>;

    fn read_polygons(&self, filename: &str) -> Result<Vec<Polygon>, ReadError>;

    fn read_polylines(&self, filename: &str) -> Result<Vec<Polyline>, ReadError>;
}

/// A complete result file held in memory, matching the JSON fixture format.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Dataset {
    pub header: MeshHeader,
    pub time: Vec<f64>,
    /// One map `variable ID -> nodal values` per frame.
    pub frames: Vec<AHashMap<String, Vec<f64>>>,
}

impl Dataset {
    pub fn new(header: MeshHeader, time: Vec<f64>, frames: Vec<AHashMap<String, Vec<f64>>>) -> Self {
        let mut header = header;
        header.nb_frames = frames.len();
        Self { header, time, frames }
    }

    /// Load a dataset from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ReadError::Io(format!("Cannot read '{}': {e}", path.display())))?;
        let mut data: Dataset = serde_json::from_str(&content)
            .map_err(|e| ReadError::Validation(format!("Malformed dataset '{}': {e}", path.display())))?;
        data.header.nb_frames = data.frames.len();
        data.validate()?;
        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ReadError> {
        self.header.validate()?;
        if self.time.len() != self.frames.len() {
            return Err(ReadError::Validation(format!(
                "{} time values for {} frames",
                self.time.len(),
                self.frames.len()
            )));
        }
        Ok(())
    }
}

impl MeshReader for Dataset {
    fn header(&self) -> &MeshHeader {
        &self.header
    }

    fn time(&self) -> &[f64] {
        &self.time
    }

    fn read_var_in_frame(&self, frame: usize, var_id: &str) -> Result<Vec<f64>, ReadError> {
        let values = self
            .frames
            .get(frame)
            .ok_or_else(|| ReadError::Request(format!("Frame {frame} does not exist")))?;
        if !self.header.has_var(var_id) {
            return Err(ReadError::Request(format!("Variable '{var_id}' does not exist")));
        }
        let values = values
            .get(var_id)
            .ok_or_else(|| ReadError::Validation(format!("Variable '{var_id}' is missing in frame {frame}")))?;
        if values.len() != self.header.nb_nodes() {
            return Err(ReadError::Validation(format!(
                "Variable '{var_id}' has {} values in frame {frame}, expected {}",
                values.len(),
                self.header.nb_nodes()
            )));
        }
        Ok(values.clone())
    }
}

struct SharedDataset(Arc<Dataset>);

impl MeshReader for SharedDataset {
    fn header(&self) -> &MeshHeader {
        &self.0.header
    }

    fn time(&self) -> &[f64] {
        &self.0.time
    }

    fn read_var_in_frame(&self, frame: usize, var_id: &str) -> Result<Vec<f64>, ReadError> {
        self.0.read_var_in_frame(frame, var_id)
    }
}

fn polygons_from_rings(rings: Vec<Vec<[f64; 2]>>) -> Result<Vec<Polygon>, ReadError> {
    rings
        .into_iter()
        .enumerate()
        .map(|(i, ring)| {
            if ring.len() < 3 {
                return Err(ReadError::Validation(format!(
                    "Polygon {} has {} vertices, at least 3 are needed",
                    i + 1,
                    ring.len()
                )));
            }
            Ok(Polygon::new(ring.into_iter().map(|[x, y]| Point2::new(x, y)).collect()))
        })
        .collect()
}

fn polylines_from_lines(lines: Vec<Vec<[f64; 2]>>) -> Result<Vec<Polyline>, ReadError> {
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if line.len() < 2 {
                return Err(ReadError::Validation(format!(
                    "Polyline {} has {} vertices, at least 2 are needed",
                    i + 1,
                    line.len()
                )));
            }
            Ok(Polyline::new(line.into_iter().map(|[x, y]| Point2::new(x, y)).collect()))
        })
        .collect()
}

/// In-memory registry of datasets and region sets.
#[derive(Default, Clone)]
pub struct MemorySources {
    meshes: AHashMap<String, Arc<Dataset>>,
    polygons: AHashMap<String, Vec<Polygon>>,
    polylines: AHashMap<String, Vec<Polyline>>,
}

impl MemorySources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mesh(mut self, filename: &str, dataset: Dataset) -> Self {
        self.meshes.insert(filename.to_string(), Arc::new(dataset));
        self
    }

    pub fn with_polygons(mut self, filename: &str, polygons: Vec<Polygon>) -> Self {
        self.polygons.insert(filename.to_string(), polygons);
        self
    }

    pub fn with_polylines(mut self, filename: &str, polylines: Vec<Polyline>) -> Self {
        self.polylines.insert(filename.to_string(), polylines);
        self
    }
}

impl DataSources for MemorySources {
    fn open_mesh(&self, filename: &str, _language: Language) -> Result<Box<dyn MeshReader + '_>, ReadError> {
        let dataset = self
            .meshes
            .get(filename)
            .ok_or_else(|| ReadError::Io(format!("No such file '{filename}'")))?;
        dataset.validate()?;
        Ok(Box::new(SharedDataset(Arc::clone(dataset))))
    }

    fn read_polygons(&self, filename: &str) -> Result<Vec<Polygon>, ReadError> {
        self.polygons
            .get(filename)
            .cloned()
            .ok_or_else(|| ReadError::Io(format!("No such file '{filename}'")))
    }

    fn read_polylines(&self, filename: &str) -> Result<Vec<Polyline>, ReadError> {
        self.polylines
            .get(filename)
            .cloned()
            .ok_or_else(|| ReadError::Io(format!("No such file '{filename}'")))
    }
}

/// JSON files under a base directory: datasets as [`Dataset`], region sets
/// as arrays of `[x, y]` vertex lists.
#[derive(Debug, Clone)]
pub struct JsonSources {
    root: PathBuf,
}

impl JsonSources {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn read_vertex_lists(&self, filename: &str) -> Result<Vec<Vec<[f64; 2]>>, ReadError> {
        let path = self.root.join(filename);
        let content = fs::read_to_string(&path)
            .map_err(|e| ReadError::Io(format!("Cannot read '{}': {e}", path.display())))?;
        serde_json::from_str(&content)
            .map_err(|e| ReadError::Validation(format!("Malformed region file '{}': {e}", path.display())))
    }
}

impl DataSources for JsonSources {
    fn open_mesh(&self, filename: &str, _language: Language) -> Result<Box<dyn MeshReader + '_>, ReadError> {
        Ok(Box::new(Dataset::from_file(self.root.join(filename))?))
    }

    fn read_polygons(&self, filename: &str) -> Result<Vec<Polygon>, ReadError> {
        polygons_from_rings(self.read_vertex_lists(filename)?)
    }

    fn read_polylines(&self, filename: &str) -> Result<Vec<Polyline>, ReadError> {
        polylines_from_lines(self.read_vertex_lists(filename)?)
    }
}
