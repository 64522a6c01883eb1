use crate::data::{MeshReader, Table};
use crate::error::ReadError;
use crate::mesh::{MeshIndex, Polygon, PolygonWeights, TruncatedPrisms};
use log::{debug, warn};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeKind {
    /// Signed integral.
    Net,
    /// Positive and negative parts integrated separately.
    Positive,
}

/// Field subtracted from the primary variable before integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subtrahend {
    Variable(String),
    /// Primary variable at the first frame of the file.
    InitialValue,
}

impl Subtrahend {
    pub const INIT_VALUE: &'static str = "init";
}

impl fmt::Display for Subtrahend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subtrahend::Variable(var) => f.write_str(var),
            Subtrahend::InitialValue => f.write_str(Self::INIT_VALUE),
        }
    }
}

impl FromStr for Subtrahend {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            Self::INIT_VALUE => Subtrahend::InitialValue,
            var => Subtrahend::Variable(var.to_string()),
        })
    }
}

/// Volume of one region in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionVolume {
    Net(f64),
    Signed { positive: f64, negative: f64 },
}

impl RegionVolume {
    pub fn cells(&self) -> Vec<f64> {
        match *self {
            RegionVolume::Net(v) => vec![v],
            RegionVolume::Signed { positive, negative } => vec![positive, negative],
        }
    }
}

pub struct VolumeCalculator<'a> {
    pub kind: VolumeKind,
    pub var_id: String,
    pub subtrahend: Option<Subtrahend>,
    pub polygons: &'a [Polygon],
    pub names: Vec<String>,
}

impl<'a> VolumeCalculator<'a> {
    pub fn new(kind: VolumeKind, var_id: &str, subtrahend: Option<Subtrahend>, polygons: &'a [Polygon]) -> Self {
        let names = (1..=polygons.len()).map(|i| format!("Polygon {i}")).collect();
        Self {
            kind,
            var_id: var_id.to_string(),
            subtrahend,
            polygons,
            names,
        }
    }

    pub fn csv_header(&self) -> Vec<String> {
        let mut header = vec!["time".to_string()];
        for name in &self.names {
            match self.kind {
                VolumeKind::Net => header.push(name.clone()),
                VolumeKind::Positive => {
                    header.push(format!("{name} (+)"));
                    header.push(format!("{name} (-)"));
                }
            }
        }
        header
    }

    /// Weight tables of every polygon, plus a warning for each polygon that
    /// misses the mesh entirely.
    pub fn construct_weights(&self, index: &MeshIndex) -> (Vec<PolygonWeights>, Vec<String>) {
        let prisms = TruncatedPrisms::new(index);
        let mut warnings = Vec::new();
        let weights = self
            .polygons
            .iter()
            .zip(&self.names)
            .map(|(polygon, name)| {
                let weights = prisms.polygon_weights(polygon);
                if weights.is_empty() {
                    warn!("{name} does not intersect the mesh");
                    warnings.push(format!("{name} does not intersect the mesh"));
                }
                weights
            })
            .collect();
        (weights, warnings)
    }

    /// Values of the primary variable minus the subtrahend, if any.
    ///
    /// `init_values` must hold the primary variable at file frame 0 when the
    /// subtrahend is [`Subtrahend::InitialValue`]. Every field must have
    /// `nb_nodes` values.
    pub fn read_values_in_frame(
        &self,
        reader: &dyn MeshReader,
        frame: usize,
        nb_nodes: usize,
        init_values: Option<&[f64]>,
    ) -> Result<Vec<f64>, ReadError> {
        let mut values = reader.read_nodal_values(frame, &self.var_id, nb_nodes)?;
        let subtract = |values: &mut Vec<f64>, other: &[f64]| {
            values.iter_mut().zip(other).for_each(|(v, o)| *v -= o);
        };
        match &self.subtrahend {
            None => {}
            Some(Subtrahend::Variable(var)) => {
                let other = reader.read_nodal_values(frame, var, nb_nodes)?;
                subtract(&mut values, &other);
            }
            Some(Subtrahend::InitialValue) => {
                let init = init_values.ok_or_else(|| {
                    ReadError::Request(format!("Initial values of '{}' were not read", self.var_id))
                })?;
                subtract(&mut values, init);
            }
        }
        Ok(values)
    }

    pub fn volume_in_frame_in_polygon(&self, weights: &PolygonWeights, values: &[f64]) -> RegionVolume {
        match self.kind {
            VolumeKind::Net => RegionVolume::Net(weights.net(values)),
            VolumeKind::Positive => {
                let (positive, negative) = weights.positive_negative(values);
                RegionVolume::Signed { positive, negative }
            }
        }
    }

    /// One row per selected frame: time, then the volume of every polygon.
    /// `progress` receives a percentage after each frame.
    pub fn run(
        &self,
        reader: &dyn MeshReader,
        index: &MeshIndex,
        time_indices: &[usize],
        progress: &mut dyn FnMut(f64),
    ) -> Result<Table, ReadError> {
        let (weights, warnings) = self.construct_weights(index);
        let init_values = match self.subtrahend {
            Some(Subtrahend::InitialValue) => Some(reader.read_nodal_values(0, &self.var_id, index.nb_nodes())?),
            _ => None,
        };

        let mut table = Table::new(self.csv_header());
        table.warnings = warnings;
        let time = reader.time();
        for (i, &frame) in time_indices.iter().enumerate() {
            let t = *time
                .get(frame)
                .ok_or_else(|| ReadError::Request(format!("Frame {frame} does not exist")))?;
            let values = self.read_values_in_frame(reader, frame, index.nb_nodes(), init_values.as_deref())?;
            let mut row = vec![t];
            for w in &weights {
                row.extend(self.volume_in_frame_in_polygon(w, &values).cells());
            }
            table.push_row(row);
            progress(100.0 * (i + 1) as f64 / time_indices.len() as f64);
        }
        debug!("Computed volumes of {} polygons over {} frames", self.polygons.len(), time_indices.len());
        Ok(table)
    }
}
