//! The unwrap pipeline.
//!
//! [`unwrap`] runs the stages in order: topology, seams, charts, per-chart
//! conformal parameterization, packing and placeholder metrics. Each stage
//! completes before the next starts and nothing is shared between calls,
//! so independent meshes can be unwrapped from different threads.
//!
//! A chart that fails to parameterize does not abort the call. Its
//! vertices keep the zero UV they started with, the failure is logged and
//! reported to the [`Observer`], and the chart is marked
//! [`ChartStatus::Failed`] in the result.
//!
//! # Example
//!
//! ```
//! use chartwise::mesh::primitives;
//! use chartwise::unwrap::{unwrap, UnwrapParams};
//!
//! let cube = primitives::cube();
//! let (unwrapped, result) = unwrap(&cube, &UnwrapParams::default()).unwrap();
//!
//! assert!(unwrapped.uvs.is_some());
//! assert_eq!(result.face_chart_ids.len(), cube.num_faces());
//! ```

use std::collections::HashSet;

use crate::algo::islands::extract_islands;
use crate::algo::metrics::apply_placeholder_metrics;
use crate::algo::pack::pack_charts;
use crate::algo::parameterize::{lscm, LscmOptions, UVMap};
use crate::algo::seams::{select_seams, SeamOptions};
use crate::algo::{Event, Observer, Stage};
use crate::error::{Result, UnwrapError};
use crate::mesh::{build_topology, Mesh};

/// Parameters for an unwrap.
#[derive(Debug, Clone)]
pub struct UnwrapParams {
    /// Angular defect threshold in degrees used by curvature refinement.
    pub angle_threshold: f64,

    /// Charts with fewer faces are left unparameterized.
    pub min_island_faces: usize,

    /// Whether to pack charts into the unit square.
    pub pack_islands: bool,

    /// Gap between packed charts, before the final rescale.
    pub island_margin: f64,

    /// Seam selection options.
    pub seam: SeamOptions,

    /// Parameterization options.
    pub lscm: LscmOptions,
}

impl Default for UnwrapParams {
    fn default() -> Self {
        Self {
            angle_threshold: 30.0,
            min_island_faces: 5,
            pack_islands: true,
            island_margin: 0.02,
            seam: SeamOptions::default(),
            lscm: LscmOptions::default(),
        }
    }
}

impl UnwrapParams {
    /// Set the angle threshold in degrees.
    pub fn with_angle_threshold(mut self, degrees: f64) -> Self {
        self.angle_threshold = degrees;
        self
    }

    /// Set the minimum number of faces a chart needs to be parameterized.
    pub fn with_min_island_faces(mut self, faces: usize) -> Self {
        self.min_island_faces = faces;
        self
    }

    /// Enable or disable packing.
    pub fn with_packing(mut self, pack: bool) -> Self {
        self.pack_islands = pack;
        self
    }

    /// Set the packing margin.
    pub fn with_island_margin(mut self, margin: f64) -> Self {
        self.island_margin = margin;
        self
    }

    /// Set the seam selection options.
    pub fn with_seam_options(mut self, seam: SeamOptions) -> Self {
        self.seam = seam;
        self
    }

    /// Set the parameterization options.
    pub fn with_lscm_options(mut self, lscm: LscmOptions) -> Self {
        self.lscm = lscm;
        self
    }

    /// Check every parameter.
    pub fn validate(&self) -> Result<()> {
        if !self.angle_threshold.is_finite() {
            return Err(UnwrapError::invalid_param(
                "angle_threshold",
                self.angle_threshold,
                "must be finite",
            ));
        }
        if !(self.island_margin.is_finite() && self.island_margin >= 0.0) {
            return Err(UnwrapError::invalid_param(
                "island_margin",
                self.island_margin,
                "must be finite and non-negative",
            ));
        }
        self.lscm.validate()
    }
}

/// What happened to a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStatus {
    /// UVs were computed.
    Parameterized,
    /// The chart had fewer than `min_island_faces` faces.
    Skipped,
    /// Parameterization failed; the chart's UVs stay at zero.
    Failed,
}

/// Per-chart outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSummary {
    /// Chart id.
    pub id: usize,
    /// Number of faces.
    pub faces: usize,
    /// Number of distinct vertices.
    pub vertices: usize,
    /// Outcome.
    pub status: ChartStatus,
}

/// Chart assignment and quality figures of an unwrap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnwrapResult {
    /// Number of charts.
    pub num_charts: usize,
    /// Chart id of every face.
    pub face_chart_ids: Vec<usize>,
    /// One summary per chart, in id order.
    pub charts: Vec<ChartSummary>,
    /// Mean triangle stretch.
    pub avg_stretch: f64,
    /// Largest triangle stretch.
    pub max_stretch: f64,
    /// Covered fraction of the unit square.
    pub coverage: f64,
    /// Largest corner-angle error in radians.
    pub angle_distortion: f64,
}

impl UnwrapResult {
    /// Faces of a chart in ascending order.
    pub fn chart_faces(&self, id: usize) -> Vec<usize> {
        self.face_chart_ids
            .iter()
            .enumerate()
            .filter(|&(_, &c)| c == id)
            .map(|(f, _)| f)
            .collect()
    }

    /// Number of charts that received UVs.
    pub fn num_parameterized(&self) -> usize {
        self.charts
            .iter()
            .filter(|c| c.status == ChartStatus::Parameterized)
            .count()
    }
}

/// Unwrap a mesh.
///
/// Returns a copy of the mesh with one UV per vertex, plus the chart
/// assignment. The input is not modified.
///
/// # Errors
///
/// Fails before doing any work if the parameters are invalid or the mesh
/// fails [`Mesh::validate`]. Per-chart failures are not errors.
pub fn unwrap(mesh: &Mesh, params: &UnwrapParams) -> Result<(Mesh, UnwrapResult)> {
    unwrap_with_observer(mesh, params, &Observer::none())
}

/// Unwrap a mesh, reporting progress and diagnostics to `observer`.
pub fn unwrap_with_observer(
    mesh: &Mesh,
    params: &UnwrapParams,
    observer: &Observer,
) -> Result<(Mesh, UnwrapResult)> {
    params.validate()?;
    mesh.validate()?;

    observer.stage(Stage::Topology);
    let topology = build_topology(mesh);
    let euler = topology.validate(mesh);
    observer.notify(&Event::Topology {
        vertices: euler.vertices,
        edges: euler.edges,
        faces: euler.faces,
        euler: euler.characteristic,
        boundary_edges: topology.boundary_edge_count(),
    });

    observer.stage(Stage::Seams);
    let seams = select_seams(mesh, &topology, params.angle_threshold, &params.seam);
    observer.notify(&Event::Seams {
        candidates: seams.candidates(),
        selected: seams.len(),
        closed: seams.is_closed(),
    });

    observer.stage(Stage::Islands);
    let islands = extract_islands(mesh, &topology, &seams);
    let num_charts = islands.num_charts();
    observer.notify(&Event::Charts { count: num_charts });

    observer.stage(Stage::Parameterize);
    let mut uvs = UVMap::zeros(mesh.num_vertices());
    let mut charts = Vec::with_capacity(num_charts);

    for (id, faces) in islands.chart_faces().iter().enumerate() {
        if faces.len() < params.min_island_faces {
            log::debug!("chart {}: {} faces, skipped", id, faces.len());
            observer.notify(&Event::ChartSkipped {
                chart: id,
                faces: faces.len(),
            });
            charts.push(ChartSummary {
                id,
                faces: faces.len(),
                vertices: distinct_vertices(mesh, faces),
                status: ChartStatus::Skipped,
            });
            continue;
        }

        let status = match lscm(mesh, faces, &params.lscm) {
            Ok(chart) => {
                chart.write_into(&mut uvs);
                observer.notify(&Event::ChartParameterized {
                    chart: id,
                    vertices: chart.num_vertices(),
                });
                ChartStatus::Parameterized
            }
            Err(e) if e.is_chart_local() => {
                log::warn!("chart {} ({} faces) failed: {}", id, faces.len(), e);
                observer.notify(&Event::ChartFailed {
                    chart: id,
                    error: e.to_string(),
                });
                ChartStatus::Failed
            }
            Err(e) => return Err(e),
        };

        charts.push(ChartSummary {
            id,
            faces: faces.len(),
            vertices: distinct_vertices(mesh, faces),
            status,
        });
    }

    observer.stage(Stage::Pack);
    let face_chart_ids = islands.into_face_chart();
    if params.pack_islands {
        let packed = pack_charts(
            &mut uvs,
            &mesh.triangles,
            &face_chart_ids,
            num_charts,
            params.island_margin,
        );
        if let Some(report) = packed {
            observer.notify(&Event::Packed {
                charts: report.placed,
                width: report.width,
                height: report.height,
            });
        }
    }

    observer.stage(Stage::Metrics);
    let mut result = UnwrapResult {
        num_charts,
        face_chart_ids,
        charts,
        ..Default::default()
    };
    apply_placeholder_metrics(&mut result);

    log::info!(
        "unwrapped {} faces into {} charts ({} parameterized, {} seams)",
        mesh.num_faces(),
        num_charts,
        result.num_parameterized(),
        seams.len()
    );

    let unwrapped = Mesh {
        positions: mesh.positions.clone(),
        triangles: mesh.triangles.clone(),
        uvs: Some(uvs),
    };

    Ok((unwrapped, result))
}

fn distinct_vertices(mesh: &Mesh, faces: &[usize]) -> usize {
    faces
        .iter()
        .flat_map(|&f| mesh.triangles[f])
        .collect::<HashSet<usize>>()
        .len()
}
