//! Least Squares Conformal Maps (LSCM) parameterization of a single chart.
//!
//! LSCM computes a conformal (angle-preserving) parameterization of a chart
//! by minimizing the conformal energy, which measures how far each triangle's
//! map is from a similarity. Two vertices are pinned to remove the four
//! remaining degrees of freedom (translation, rotation and scale).
//!
//! Each chart is solved in its own dense local index space, so the system
//! size depends only on the chart and not on the whole mesh.
//!
//! # References
//!
//! - Lévy, B., Petitjean, S., Ray, N., & Maillot, J. (2002). "Least squares
//!   conformal maps for automatic texture atlas generation." ACM SIGGRAPH.

use std::collections::HashMap;

use nalgebra::{DVector, Point2, Point3};

use crate::error::{Result, UnwrapError};
use crate::mesh::{Edge, Mesh};

use super::sparse::{conjugate_gradient, CsrMatrix};
use super::uv::UVMap;

/// Triangles with a smaller projected area contribute no conformality rows.
pub const MIN_TRIANGLE_AREA: f64 = 1e-12;

/// Options for LSCM parameterization.
#[derive(Debug, Clone)]
pub struct LscmOptions {
    /// Strategy for selecting pinned (fixed) vertices.
    pub pin_strategy: PinStrategy,

    /// Maximum iterations for the conjugate gradient solver.
    pub max_iterations: usize,

    /// Convergence tolerance for the CG solver (relative residual).
    pub tolerance: f64,

    /// Largest boundary searched exhaustively for the farthest pin pair.
    ///
    /// Longer boundaries are subsampled at a uniform stride down to at most
    /// this many vertices.
    pub boundary_sample_limit: usize,
}

impl Default for LscmOptions {
    fn default() -> Self {
        Self {
            pin_strategy: PinStrategy::Automatic,
            max_iterations: 10_000,
            tolerance: 1e-10,
            boundary_sample_limit: 200,
        }
    }
}

impl LscmOptions {
    /// Create options with automatic pin selection (farthest boundary vertices).
    pub fn automatic() -> Self {
        Self::default()
    }

    /// Create options with manually specified pinned vertices.
    pub fn with_pins(pin0: PinnedVertex, pin1: PinnedVertex) -> Self {
        Self {
            pin_strategy: PinStrategy::Manual(pin0, pin1),
            ..Default::default()
        }
    }

    /// Set the maximum CG iterations.
    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    /// Set the convergence tolerance.
    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Set the boundary sample limit for automatic pinning.
    pub fn with_boundary_sample_limit(mut self, limit: usize) -> Self {
        self.boundary_sample_limit = limit;
        self
    }

    /// Check that the options can drive a solve.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(UnwrapError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(UnwrapError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be finite and positive",
            ));
        }
        if self.boundary_sample_limit < 2 {
            return Err(UnwrapError::invalid_param(
                "boundary_sample_limit",
                self.boundary_sample_limit,
                "must be at least 2",
            ));
        }
        if let PinStrategy::Manual(p0, p1) = &self.pin_strategy {
            for pin in [p0, p1] {
                if !(pin.u.is_finite() && pin.v.is_finite()) {
                    return Err(UnwrapError::invalid_param(
                        "pin_strategy",
                        format!("({}, {})", pin.u, pin.v),
                        "pinned UVs must be finite",
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Strategy for selecting which vertices to pin (fix) during parameterization.
#[derive(Debug, Clone, Default)]
pub enum PinStrategy {
    /// Pin the two farthest boundary vertices to (0,0) and (1,0).
    ///
    /// A chart without boundary pins its first vertex and the vertex
    /// farthest from it.
    #[default]
    Automatic,

    /// Pin two global vertices to the given UV coordinates.
    ///
    /// Charts that do not contain both vertices fall back to
    /// [`PinStrategy::Automatic`].
    Manual(PinnedVertex, PinnedVertex),
}

/// A vertex pinned to a specific UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedVertex {
    /// The vertex index to pin.
    pub vertex: usize,
    /// The fixed U coordinate.
    pub u: f64,
    /// The fixed V coordinate.
    pub v: f64,
}

impl PinnedVertex {
    /// Create a new pinned vertex.
    pub fn new(vertex: usize, u: f64, v: f64) -> Self {
        Self { vertex, u, v }
    }
}

/// The UVs produced for one chart.
#[derive(Debug, Clone)]
pub struct ChartParameterization {
    vertices: Vec<usize>,
    uvs: UVMap,
    pins: [PinnedVertex; 2],
}

impl ChartParameterization {
    /// Global vertex index of every local vertex, in first-seen order.
    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    /// UVs indexed by local vertex.
    pub fn uvs(&self) -> &UVMap {
        &self.uvs
    }

    /// The two pins used, by global vertex, with their pre-normalization UVs.
    pub fn pins(&self) -> [PinnedVertex; 2] {
        self.pins
    }

    /// Number of distinct vertices in the chart.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Copy the chart's UVs into a mesh-wide UV map.
    ///
    /// Vertices shared with a previously written chart are overwritten.
    pub fn write_into(&self, target: &mut UVMap) {
        for (local, &global) in self.vertices.iter().enumerate() {
            target.set(global, self.uvs.get(local));
        }
    }
}

/// Bijection between the global vertices of a chart and `0..n`.
#[derive(Debug)]
struct LocalIndex {
    to_local: HashMap<usize, usize>,
    to_global: Vec<usize>,
}

impl LocalIndex {
    fn build(mesh: &Mesh, faces: &[usize]) -> Self {
        let mut to_local = HashMap::with_capacity(faces.len());
        let mut to_global = Vec::with_capacity(faces.len());
        for &f in faces {
            for &v in &mesh.triangles[f] {
                to_local.entry(v).or_insert_with(|| {
                    to_global.push(v);
                    to_global.len() - 1
                });
            }
        }
        Self {
            to_local,
            to_global,
        }
    }

    #[inline]
    fn local(&self, global: usize) -> Option<usize> {
        self.to_local.get(&global).copied()
    }

    #[inline]
    fn len(&self) -> usize {
        self.to_global.len()
    }
}

/// Compute the LSCM parameterization of one chart.
///
/// The result is normalized: translated to the origin and uniformly scaled
/// so the larger side of its bounding box is 1.
///
/// # Arguments
///
/// * `mesh` - The mesh containing the chart
/// * `faces` - Face indices of the chart
/// * `options` - Parameterization options
///
/// # Errors
///
/// These are all local to the chart:
/// - [`UnwrapError::ChartTooSmall`] if the chart has fewer than 3 vertices
/// - [`UnwrapError::DegenerateChart`] if no triangle has positive area
/// - [`UnwrapError::DegeneratePins`] if both pins coincide
/// - [`UnwrapError::SolverBreakdown`], [`UnwrapError::ConvergenceFailed`]
///   or [`UnwrapError::NonFiniteSolution`] if the linear solve fails
///
/// # Example
///
/// ```
/// use chartwise::algo::parameterize::{lscm, LscmOptions};
/// use chartwise::mesh::primitives;
///
/// let grid = primitives::grid(4);
/// let faces: Vec<usize> = (0..grid.num_faces()).collect();
/// let chart = lscm(&grid, &faces, &LscmOptions::default()).unwrap();
///
/// assert_eq!(chart.num_vertices(), 25);
/// let (min, max) = chart.uvs().bounding_box().unwrap();
/// assert!(min.x.abs() < 1e-9 && min.y.abs() < 1e-9);
/// assert!((max.x.max(max.y) - 1.0).abs() < 1e-9);
/// ```
pub fn lscm(mesh: &Mesh, faces: &[usize], options: &LscmOptions) -> Result<ChartParameterization> {
    let mut chart = solve_chart(mesh, faces, options)?;
    chart.uvs.normalize();
    Ok(chart)
}

/// Assemble and solve the pinned LSCM system without normalizing.
fn solve_chart(
    mesh: &Mesh,
    faces: &[usize],
    options: &LscmOptions,
) -> Result<ChartParameterization> {
    let index = LocalIndex::build(mesh, faces);
    let n = index.len();
    if n < 3 {
        return Err(UnwrapError::ChartTooSmall { vertices: n });
    }

    let (rows, used) = conformal_rows(mesh, faces, &index);
    if used == 0 {
        return Err(UnwrapError::DegenerateChart);
    }
    log::trace!(
        "chart: {} vertices, {} of {} triangles assembled, {} nonzeros",
        n,
        used,
        faces.len(),
        rows.nnz()
    );

    let pins = choose_pins(mesh, faces, &index, options)?;
    let local_pins = [
        index.local(pins[0].vertex).ok_or(UnwrapError::DegeneratePins)?,
        index.local(pins[1].vertex).ok_or(UnwrapError::DegeneratePins)?,
    ];

    let fixed = [
        (local_pins[0], pins[0].u),
        (n + local_pins[0], pins[0].v),
        (local_pins[1], pins[1].u),
        (n + local_pins[1], pins[1].v),
    ];
    let (matrix, rhs) = pin_system(&rows.gram(), &fixed);

    let solution = conjugate_gradient(
        &matrix,
        &rhs,
        None,
        options.max_iterations,
        options.tolerance,
    )?;

    // Extract UV coordinates from solution
    let mut uv_coords: Vec<Point2<f64>> = (0..n)
        .map(|i| Point2::new(solution[i], solution[n + i]))
        .collect();

    // Set pinned vertices exactly
    for (pin, &local) in pins.iter().zip(&local_pins) {
        uv_coords[local] = Point2::new(pin.u, pin.v);
    }

    let uvs = UVMap::new(uv_coords);
    if !uvs.is_finite() {
        return Err(UnwrapError::NonFiniteSolution);
    }

    Ok(ChartParameterization {
        vertices: index.to_global,
        uvs,
        pins,
    })
}

/// Build the conformality residual matrix, two rows per usable triangle.
///
/// Unknowns use a blocked layout: `u` of local vertex `i` at column `i`,
/// `v` at column `n + i`. Returns the matrix and the number of triangles
/// that contributed rows.
fn conformal_rows(mesh: &Mesh, faces: &[usize], index: &LocalIndex) -> (CsrMatrix, usize) {
    let n = index.len();
    let mut triplets: Vec<(usize, usize, f64)> = Vec::with_capacity(faces.len() * 12);
    let mut row = 0;

    for &f in faces {
        let Some(q) = project_to_plane(&mesh.triangle_positions(f)) else {
            continue;
        };
        let tri = mesh.triangles[f];

        // Area of the projected triangle
        let area = 0.5 * q[1].x * q[2].y;
        let scale = area.sqrt() / (2.0 * area);

        for k in 0..3 {
            let prev = (k + 2) % 3;
            let next = (k + 1) % 3;
            let re = (q[prev].x - q[next].x) * scale;
            let im = (q[prev].y - q[next].y) * scale;

            // Indices come from the same faces the index was built from
            let local = index.to_local[&tri[k]];
            let (u, v) = (local, n + local);

            // Re(W·w) = re·u - im·v
            triplets.push((row, u, re));
            triplets.push((row, v, -im));
            // Im(W·w) = im·u + re·v
            triplets.push((row + 1, u, im));
            triplets.push((row + 1, v, re));
        }
        row += 2;
    }

    (CsrMatrix::from_triplets(row, 2 * n, triplets), row / 2)
}

/// Isometric projection of a triangle into its own plane.
///
/// Vertex 0 goes to the origin, vertex 1 onto the positive x axis and
/// vertex 2 into the upper half plane. Returns `None` below
/// [`MIN_TRIANGLE_AREA`].
fn project_to_plane(p: &[Point3<f64>; 3]) -> Option<[Point2<f64>; 3]> {
    let e1 = p[1] - p[0];
    let e2 = p[2] - p[0];
    let normal = e1.cross(&e2);
    let area = 0.5 * normal.norm();
    if !(area.is_finite() && area >= MIN_TRIANGLE_AREA) {
        return None;
    }

    let e1_len = e1.norm();
    let x_axis = e1 / e1_len;
    let z_axis = normal / (2.0 * area);
    let y_axis = z_axis.cross(&x_axis);

    Some([
        Point2::origin(),
        Point2::new(e1_len, 0.0),
        Point2::new(e2.dot(&x_axis), e2.dot(&y_axis)),
    ])
}

/// Replace pinned unknowns with identity rows and move their columns to the
/// right-hand side.
fn pin_system(normal: &CsrMatrix, fixed: &[(usize, f64)]) -> (CsrMatrix, DVector<f64>) {
    let size = normal.nrows();
    let mut value_of: Vec<Option<f64>> = vec![None; size];
    for &(i, value) in fixed {
        value_of[i] = Some(value);
    }

    let mut rhs = DVector::zeros(size);
    let mut triplets = Vec::with_capacity(normal.nnz());
    for (r, c, a) in normal.iter() {
        match (value_of[r], value_of[c]) {
            (None, None) => triplets.push((r, c, a)),
            (None, Some(value)) => rhs[r] -= a * value,
            _ => {}
        }
    }
    for &(i, value) in fixed {
        triplets.push((i, i, 1.0));
        rhs[i] = value;
    }

    (CsrMatrix::from_triplets(size, size, triplets), rhs)
}

/// Pick the two pinned vertices for a chart.
fn choose_pins(
    mesh: &Mesh,
    faces: &[usize],
    index: &LocalIndex,
    options: &LscmOptions,
) -> Result<[PinnedVertex; 2]> {
    if let PinStrategy::Manual(p0, p1) = &options.pin_strategy {
        if index.local(p0.vertex).is_some() && index.local(p1.vertex).is_some() {
            if p0.vertex == p1.vertex || (p0.u == p1.u && p0.v == p1.v) {
                return Err(UnwrapError::DegeneratePins);
            }
            return Ok([*p0, *p1]);
        }
        log::debug!(
            "pins {} and {} are not both in the chart, choosing automatically",
            p0.vertex,
            p1.vertex
        );
    }

    let boundary = find_boundary_vertices(mesh, faces);
    let (a, b) = if boundary.len() >= 2 {
        let sample = subsample(&boundary, options.boundary_sample_limit);
        farthest_pair(&mesh.positions, &sample).ok_or(UnwrapError::DegeneratePins)?
    } else {
        let anchor = index.to_global[0];
        let far = farthest_from(&mesh.positions, anchor, &index.to_global[1..])
            .ok_or(UnwrapError::DegeneratePins)?;
        (anchor, far)
    };

    if a == b || mesh.positions[a] == mesh.positions[b] {
        return Err(UnwrapError::DegeneratePins);
    }

    Ok([PinnedVertex::new(a, 0.0, 0.0), PinnedVertex::new(b, 1.0, 0.0)])
}

/// Vertices on edges used by exactly one face of the chart, ascending.
fn find_boundary_vertices(mesh: &Mesh, faces: &[usize]) -> Vec<usize> {
    // Count edge occurrences
    let mut edge_count: HashMap<Edge, usize> = HashMap::with_capacity(faces.len() * 3 / 2);
    for &f in faces {
        let t = mesh.triangles[f];
        for i in 0..3 {
            *edge_count.entry(Edge::new(t[i], t[(i + 1) % 3])).or_insert(0) += 1;
        }
    }

    // Boundary edges have count 1
    let mut boundary: Vec<usize> = edge_count
        .into_iter()
        .filter(|&(_, count)| count == 1)
        .flat_map(|(edge, _)| edge.vertices())
        .collect();
    boundary.sort_unstable();
    boundary.dedup();
    boundary
}

/// Uniform stride subsample of at most `limit` entries.
fn subsample(vertices: &[usize], limit: usize) -> Vec<usize> {
    if vertices.len() <= limit {
        return vertices.to_vec();
    }
    let stride = vertices.len().div_ceil(limit);
    vertices.iter().step_by(stride).copied().collect()
}

/// The candidate pair with the largest 3D separation.
///
/// The first pair found wins ties.
fn farthest_pair(positions: &[Point3<f64>], candidates: &[usize]) -> Option<(usize, usize)> {
    let mut max_dist = -1.0;
    let mut best = None;
    for (i, &v0) in candidates.iter().enumerate() {
        for &v1 in &candidates[i + 1..] {
            let dist = (positions[v1] - positions[v0]).norm_squared();
            if dist > max_dist {
                max_dist = dist;
                best = Some((v0, v1));
            }
        }
    }
    best
}

fn farthest_from(positions: &[Point3<f64>], anchor: usize, candidates: &[usize]) -> Option<usize> {
    let origin = positions[anchor];
    let mut max_dist = -1.0;
    let mut best = None;
    for &v in candidates {
        let dist = (positions[v] - origin).norm_squared();
        if dist > max_dist {
            max_dist = dist;
            best = Some(v);
        }
    }
    best
}
