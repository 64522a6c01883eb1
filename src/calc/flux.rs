use crate::data::{MeshReader, Table};
use crate::error::ReadError;
use crate::mesh::{MeshHeader, MeshIndex, Polyline, SectionIntersections, SectionPiece, TriangularVectorField};
use log::{debug, warn};

/// Flux formula, selected from the arity of its variable list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FluxKind {
    /// `∫ q ds`
    LineIntegral { q: String },
    /// `∫ (x, y)·n ds`
    LineFlux { x: String, y: String },
    /// `∫ m h ds`
    DoubleLineIntegral { m: String, h: String },
    /// `∫ h (u, v)·n ds`
    AreaFlux { u: String, v: String, h: String },
    /// `∫ c h (u, v)·n ds`
    MassFlux { u: String, v: String, h: String, c: String },
}

impl FluxKind {
    /// 1 variable: line integral. 2: double line integral when the first is
    /// `M`, line flux otherwise. 3: area flux. 4 or more: mass flux.
    pub fn from_variables<S: AsRef<str>>(vars: &[S]) -> Option<Self> {
        let v: Vec<String> = vars.iter().map(|s| s.as_ref().to_string()).collect();
        Some(match v.as_slice() {
            [] => return None,
            [q] => FluxKind::LineIntegral { q: q.clone() },
            [m, h] if m == "M" => FluxKind::DoubleLineIntegral {
                m: m.clone(),
                h: h.clone(),
            },
            [x, y] => FluxKind::LineFlux {
                x: x.clone(),
                y: y.clone(),
            },
            [u, v, h] => FluxKind::AreaFlux {
                u: u.clone(),
                v: v.clone(),
                h: h.clone(),
            },
            [u, v, h, c, ..] => FluxKind::MassFlux {
                u: u.clone(),
                v: v.clone(),
                h: h.clone(),
                c: c.clone(),
            },
        })
    }

    /// Variable IDs in the order [`FluxKind::integrand`] expects them.
    pub fn variables(&self) -> Vec<&str> {
        match self {
            FluxKind::LineIntegral { q } => vec![q.as_str()],
            FluxKind::LineFlux { x, y } => vec![x.as_str(), y.as_str()],
            FluxKind::DoubleLineIntegral { m, h } => vec![m.as_str(), h.as_str()],
            FluxKind::AreaFlux { u, v, h } => vec![u.as_str(), v.as_str(), h.as_str()],
            FluxKind::MassFlux { u, v, h, c } => vec![u.as_str(), v.as_str(), h.as_str(), c.as_str()],
        }
    }

    /// Integrand at one point, from the values of [`FluxKind::variables`].
    pub fn integrand(&self, values: &[f64], normal: (f64, f64)) -> f64 {
        let (nx, ny) = normal;
        match self {
            FluxKind::LineIntegral { .. } => values[0],
            FluxKind::LineFlux { .. } => values[0] * nx + values[1] * ny,
            FluxKind::DoubleLineIntegral { .. } => values[0] * values[1],
            FluxKind::AreaFlux { .. } => values[2] * (values[0] * nx + values[1] * ny),
            FluxKind::MassFlux { .. } => values[3] * values[2] * (values[0] * nx + values[1] * ny),
        }
    }

    /// Scalar line integrals do not depend on the section orientation.
    pub fn is_oriented(&self) -> bool {
        !matches!(self, FluxKind::LineIntegral { .. } | FluxKind::DoubleLineIntegral { .. })
    }
}

/// A flux formula offered to the user: its display label and the parsed kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FluxOption {
    pub label: String,
    pub kind: FluxKind,
}

impl FluxOption {
    fn new(label: String, vars: &[&str]) -> Option<Self> {
        FluxKind::from_variables(vars).map(|kind| Self { label, kind })
    }

    /// Variable list written between the parentheses of a label.
    pub fn label_variables(label: &str) -> Option<Vec<&str>> {
        let (_, list) = label.rsplit_once(": (")?;
        let list = list.strip_suffix(')')?;
        Some(list.split(", ").collect())
    }
}

/// Every flux computable from the selected variables of `header`.
pub fn available_flux_options(header: &MeshHeader, selected: &[&str]) -> Vec<FluxOption> {
    let has = |id: &str| selected.contains(&id);
    let selected_infos: Vec<_> = header.variables.iter().filter(|v| has(v.id.as_str())).collect();
    let mut options = Vec::new();
    let mut offer = |label: String, vars: &[&str]| {
        if let Some(option) = FluxOption::new(label, vars) {
            options.push(option);
        }
    };

    if has("U") && has("V") && has("H") {
        offer("Liquid flux (m3/s): (U, V, H)".to_string(), &["U", "V", "H"]);
        for info in &selected_infos {
            let name = info.name.trim();
            if name.contains("TRACEUR") || name.contains("TRACER") {
                offer(format!("Solid flux (kg/s): (U, V, H, {name})"), &["U", "V", "H", info.id.as_str()]);
            }
        }
    }
    if has("I") && has("J") {
        offer("Liquid flux (m3/s): (I, J)".to_string(), &["I", "J"]);
    }
    if has("H") && has("M") {
        offer("Liquid flux (m3/s): (M, H)".to_string(), &["M", "H"]);
    }
    if has("Q") {
        offer("Liquid flux (m3/s): (Q)".to_string(), &["Q"]);
    }

    let pairs = [
        ("TOTAL", "QSX", "QSY", "QS"),
        ("BEDLOAD", "QSBLX", "QSBLY", "QSBL"),
        ("SUSPENSION", "QSSUSPX", "QSSUSPY", "QSSUSP"),
    ];
    for (kind, x, y, scalar) in pairs {
        if has(x) && has(y) {
            offer(format!("Solid flux {kind} (m3/s): ({x}, {y})"), &[x, y]);
        }
        if has(scalar) {
            offer(format!("Solid flux {kind} (m3/s): ({scalar})"), &[scalar]);
        }
    }

    for info in &selected_infos {
        let name = info.name.trim();
        for (pattern, kind) in [
            ("QS CLASS", "TOTAL"),
            ("QS BEDLOAD CL", "BEDLOAD"),
            ("QS SUSP. CL", "SUSPENSION"),
        ] {
            if name.contains(pattern) {
                offer(format!("Solid flux {kind} (m3/s): ({name})"), &[info.id.as_str()]);
            }
        }
    }
    options
}

pub struct FluxCalculator<'a> {
    pub kind: FluxKind,
    pub sections: &'a [Polyline],
    pub names: Vec<String>,
}

impl<'a> FluxCalculator<'a> {
    pub fn new(kind: FluxKind, sections: &'a [Polyline]) -> Self {
        let names = (1..=sections.len()).map(|i| format!("Section {i}")).collect();
        Self { kind, sections, names }
    }

    pub fn csv_header(&self) -> Vec<String> {
        std::iter::once("time".to_string())
            .chain(self.names.iter().cloned())
            .collect()
    }

    /// Pieces of every section, plus diagnostics for degenerate sections.
    pub fn construct_intersections(&self, index: &MeshIndex) -> (Vec<SectionIntersections>, Vec<String>) {
        let field = TriangularVectorField::new(index);
        let mut warnings = Vec::new();
        let intersections = self
            .sections
            .iter()
            .zip(&self.names)
            .map(|(section, name)| {
                let intersections = field.section_intersections(section);
                let diagnostic = if intersections.length <= 0.0 {
                    Some(format!("{name} has zero length, its flux is 0"))
                } else if intersections.is_empty() {
                    Some(format!("{name} is outside the mesh, its flux is 0"))
                } else if intersections.length - intersections.covered_length > 1e-9 * intersections.length {
                    Some(format!(
                        "{name} is partially outside the mesh ({:.6} of {:.6} covered)",
                        intersections.covered_length, intersections.length
                    ))
                } else {
                    None
                };
                if let Some(message) = diagnostic {
                    warn!("{message}");
                    warnings.push(message);
                }
                intersections
            })
            .collect();
        (intersections, warnings)
    }

    fn piece_flux(&self, piece: &SectionPiece, values: &[Vec<f64>]) -> f64 {
        let normal = (piece.normal.x, piece.normal.y);
        let at = |k: usize| {
            let point_values: Vec<f64> = values.iter().map(|v| piece.interpolate(k, v)).collect();
            self.kind.integrand(&point_values, normal)
        };
        piece.length / 6.0 * (at(0) + 4.0 * at(1) + at(2))
    }

    /// Flux through one section, `values` ordered as [`FluxKind::variables`].
    pub fn flux_in_frame(&self, intersections: &SectionIntersections, values: &[Vec<f64>]) -> f64 {
        intersections
            .pieces
            .iter()
            .map(|piece| self.piece_flux(piece, values))
            .sum()
    }

    pub fn run(
        &self,
        reader: &dyn MeshReader,
        index: &MeshIndex,
        time_indices: &[usize],
        progress: &mut dyn FnMut(f64),
    ) -> Result<Table, ReadError> {
        let (intersections, warnings) = self.construct_intersections(index);
        let mut table = Table::new(self.csv_header());
        table.warnings = warnings;
        let time = reader.time();
        for (i, &frame) in time_indices.iter().enumerate() {
            let t = *time
                .get(frame)
                .ok_or_else(|| ReadError::Request(format!("Frame {frame} does not exist")))?;
            let values = self
                .kind
                .variables()
                .into_iter()
                .map(|var| reader.read_nodal_values(frame, var, index.nb_nodes()))
                .collect::<Result<Vec<_>, _>>()?;
            let mut row = vec![t];
            row.extend(intersections.iter().map(|section| self.flux_in_frame(section, &values)));
            table.push_row(row);
            progress(100.0 * (i + 1) as f64 / time_indices.len() as f64);
        }
        debug!("Computed fluxes through {} sections over {} frames", self.sections.len(), time_indices.len());
        Ok(table)
    }
}
