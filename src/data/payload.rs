use crate::error::{MeshError, NodeFailure, ReadError};
use crate::graph::PortKind;
use crate::mesh::{MeshHeader, MeshIndex, Polygon, Polyline};
use super::{DataSources, MeshReader, Table};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

/// Encoding tag of a result file, forwarded to the reader unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Fr,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Fr => "fr",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Language::En),
            "fr" => Ok(Language::Fr),
            other => Err(format!("unknown language '{other}'")),
        }
    }
}

/// Temporal aggregation tag carried by mesh data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Max,
    Min,
    Mean,
}

impl Operator {
    pub fn node_name(&self) -> &'static str {
        match self {
            Operator::Max => "Compute Max",
            Operator::Min => "Compute Min",
            Operator::Mean => "Compute Mean",
        }
    }
}

/// Mesh data flowing along a `mesh` link.
///
/// Cloning is cheap: header, time and the cached index are shared. Every
/// clone of the same source shares one index slot, so the triangulation is
/// built at most once whichever consumer asks for it first.
#[derive(Clone)]
pub struct MeshData {
    pub filename: String,
    pub language: Language,
    pub header: Arc<MeshHeader>,
    pub time: Arc<Vec<f64>>,
    /// Selected variable IDs.
    pub selected_vars: Vec<String>,
    /// Selected frame indices, in increasing order.
    pub selected_time_indices: Vec<usize>,
    pub operator: Option<Operator>,
    index: Arc<OnceLock<Arc<MeshIndex>>>,
}

impl MeshData {
    /// Data with every variable and every frame selected.
    pub fn new(filename: &str, language: Language, header: MeshHeader, time: Vec<f64>) -> Self {
        let selected_vars = header.var_ids().map(str::to_string).collect();
        let selected_time_indices = (0..time.len()).collect();
        Self {
            filename: filename.to_string(),
            language,
            header: Arc::new(header),
            time: Arc::new(time),
            selected_vars,
            selected_time_indices,
            operator: None,
            index: Arc::new(OnceLock::new()),
        }
    }

    /// Narrows the selection to `vars`, keeping header order. Unknown IDs are ignored.
    pub fn with_selected_vars(mut self, vars: &[String]) -> Self {
        self.selected_vars = self
            .header
            .var_ids()
            .filter(|id| vars.iter().any(|v| v == id))
            .map(str::to_string)
            .collect();
        self
    }

    /// Narrows the frame selection. Out-of-range indices are dropped.
    pub fn with_time_indices(mut self, indices: &[usize]) -> Self {
        let nb_frames = self.time.len();
        let mut selected: Vec<usize> = indices.iter().copied().filter(|&i| i < nb_frames).collect();
        selected.sort_unstable();
        selected.dedup();
        self.selected_time_indices = selected;
        self
    }

    /// Selected variable IDs in header order.
    pub fn available_vars(&self) -> Vec<&str> {
        self.header
            .var_ids()
            .filter(|id| self.selected_vars.iter().any(|v| v == id))
            .collect()
    }

    pub fn is_selected(&self, var: &str) -> bool {
        self.selected_vars.iter().any(|v| v == var)
    }

    /// Tags the data with a temporal operator. Tagging twice is refused.
    pub fn with_operator(&self, operator: Operator) -> Result<Self, NodeFailure> {
        match self.operator {
            Some(current) if current == operator => Err(NodeFailure::AlreadyAggregated(current)),
            Some(_) => Err(NodeFailure::AlreadyComputed),
            None => {
                let mut data = self.clone();
                data.operator = Some(operator);
                Ok(data)
            }
        }
    }

    pub fn has_index(&self) -> bool {
        self.index.get().is_some()
    }

    /// The mesh index of this source, built on first use.
    pub fn index(&self) -> Result<Arc<MeshIndex>, MeshError> {
        if let Some(index) = self.index.get() {
            debug!("Reusing cached mesh index for '{}'", self.filename);
            return Ok(Arc::clone(index));
        }
        let built = Arc::new(MeshIndex::build(&self.header)?);
        Ok(Arc::clone(self.index.get_or_init(|| built)))
    }

    /// Reopens the source file. The reader must still describe the mesh this
    /// data was loaded from.
    pub fn open_reader<'s>(&self, sources: &'s dyn DataSources) -> Result<Box<dyn MeshReader + 's>, ReadError> {
        let reader = sources.open_mesh(&self.filename, self.language)?;
        let header = reader.header();
        if header.nb_nodes() != self.header.nb_nodes() || header.nb_triangles() != self.header.nb_triangles() {
            return Err(ReadError::Validation(format!(
                "'{}' changed since it was loaded: {} nodes and {} elements, expected {} and {}",
                self.filename,
                header.nb_nodes(),
                header.nb_triangles(),
                self.header.nb_nodes(),
                self.header.nb_triangles()
            )));
        }
        Ok(reader)
    }

    /// Time values of the selected frames.
    pub fn selected_times(&self) -> Vec<f64> {
        self.selected_time_indices.iter().map(|&i| self.time[i]).collect()
    }
}

impl fmt::Debug for MeshData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeshData")
            .field("filename", &self.filename)
            .field("language", &self.language)
            .field("selected_vars", &self.selected_vars)
            .field("nb_selected_frames", &self.selected_time_indices.len())
            .field("operator", &self.operator)
            .field("has_index", &self.has_index())
            .finish()
    }
}

/// The value produced by a node and shared with every downstream consumer.
#[derive(Debug, Clone)]
pub enum Payload {
    Mesh(MeshData),
    Polygons(Arc<Vec<Polygon>>),
    Polylines(Arc<Vec<Polyline>>),
    Table(Arc<Table>),
}

impl Payload {
    pub fn kind(&self) -> PortKind {
        match self {
            Payload::Mesh(_) => PortKind::Mesh,
            Payload::Polygons(_) => PortKind::PolygonSet,
            Payload::Polylines(_) => PortKind::PolylineSet,
            Payload::Table(_) => PortKind::Table,
        }
    }

    pub fn as_mesh(&self) -> Option<&MeshData> {
        match self {
            Payload::Mesh(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_polygons(&self) -> Option<&Arc<Vec<Polygon>>> {
        match self {
            Payload::Polygons(polygons) => Some(polygons),
            _ => None,
        }
    }

    pub fn as_polylines(&self) -> Option<&Arc<Vec<Polyline>>> {
        match self {
            Payload::Polylines(polylines) => Some(polylines),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Arc<Table>> {
        match self {
            Payload::Table(table) => Some(table),
            _ => None,
        }
    }
}
