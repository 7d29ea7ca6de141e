//! Quality metrics for a finished unwrap.
//!
//! The pipeline itself only fills in placeholder values through
//! [`apply_placeholder_metrics`]. Exact numbers come from
//! [`QualityMetrics::compute`], which callers run on the unwrapped mesh
//! and then copy into the result with [`QualityMetrics::apply`].
//!
//! # Metrics
//!
//! - **Stretch**: per triangle, `sqrt(λmax / λmin)` of the Gram matrix
//!   `JᵀJ` of the UV→3D Jacobian `J`. A conformal triangle scores 1.
//! - **Coverage**: fraction of a `resolution²` grid over `[0,1]²` whose
//!   pixel centres fall inside some UV triangle.
//! - **Angle distortion**: largest difference between a 3D corner angle and
//!   the same corner in UV space, in radians.
//!
//! # Example
//!
//! ```
//! use chartwise::algo::metrics::{MetricsOptions, QualityMetrics};
//! use chartwise::mesh::primitives;
//! use chartwise::unwrap::{unwrap, UnwrapParams};
//!
//! let (mesh, mut result) = unwrap(&primitives::grid(4), &UnwrapParams::default()).unwrap();
//! let metrics = QualityMetrics::compute(&mesh, &MetricsOptions::default()).unwrap();
//! metrics.apply(&mut result);
//!
//! assert!((result.avg_stretch - 1.0).abs() < 1e-6);
//! ```

use nalgebra::{Matrix2, Matrix3x2, Point2};
use rayon::prelude::*;

use crate::error::{Result, UnwrapError};
use crate::mesh::Mesh;
use crate::unwrap::UnwrapResult;

/// Coverage reported before any real measurement.
pub const PLACEHOLDER_COVERAGE: f64 = 0.7;

/// UV triangles with a smaller absolute determinant are skipped.
const MIN_UV_DETERMINANT: f64 = 1e-12;

/// Fill the result's quality fields with neutral placeholder values.
///
/// Stretch is 1, coverage is [`PLACEHOLDER_COVERAGE`] and angle distortion
/// is 0. The chart data the exact metrics need is already complete when
/// this runs.
pub fn apply_placeholder_metrics(result: &mut UnwrapResult) {
    result.avg_stretch = 1.0;
    result.max_stretch = 1.0;
    result.coverage = PLACEHOLDER_COVERAGE;
    result.angle_distortion = 0.0;
}

/// Options for exact metric computation.
#[derive(Debug, Clone)]
pub struct MetricsOptions {
    /// Coverage grid resolution per axis.
    pub resolution: usize,

    /// Whether to use parallel execution (default: true).
    pub parallel: bool,
}

impl Default for MetricsOptions {
    fn default() -> Self {
        Self {
            resolution: 256,
            parallel: true,
        }
    }
}

impl MetricsOptions {
    /// Set the coverage grid resolution.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Exact quality statistics of an unwrapped mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityMetrics {
    /// Mean stretch over measured triangles.
    pub avg_stretch: f64,
    /// Largest stretch.
    pub max_stretch: f64,
    /// Covered fraction of the unit square.
    pub coverage: f64,
    /// Largest corner-angle error in radians.
    pub angle_distortion: f64,
    /// Triangles that entered the stretch statistics.
    pub measured_faces: usize,
}

/// Per-face measurements; `None` where the UV triangle is degenerate.
#[derive(Debug, Clone, Copy)]
struct FaceQuality {
    stretch: Option<f64>,
    angle_error: Option<f64>,
}

impl QualityMetrics {
    /// Measure a mesh that carries UVs.
    ///
    /// When no triangle can be measured, stretch is reported as 1.
    ///
    /// # Errors
    ///
    /// Returns [`UnwrapError::InvalidParameter`] if the mesh has no UVs, the
    /// UV count differs from the vertex count, or `resolution` is 0.
    pub fn compute(mesh: &Mesh, options: &MetricsOptions) -> Result<Self> {
        let uvs = match &mesh.uvs {
            Some(uvs) if uvs.len() == mesh.num_vertices() => uvs.as_slice(),
            Some(uvs) => {
                return Err(UnwrapError::invalid_param(
                    "uvs",
                    uvs.len(),
                    "UV count must match vertex count",
                ))
            }
            None => return Err(UnwrapError::invalid_param("uvs", "none", "mesh has no UVs")),
        };
        if options.resolution == 0 {
            return Err(UnwrapError::invalid_param(
                "resolution",
                options.resolution,
                "must be at least 1",
            ));
        }

        let faces: Vec<FaceQuality> = if options.parallel {
            (0..mesh.num_faces())
                .into_par_iter()
                .map(|f| face_quality(mesh, uvs, f))
                .collect()
        } else {
            (0..mesh.num_faces())
                .map(|f| face_quality(mesh, uvs, f))
                .collect()
        };

        let stretches: Vec<f64> = faces.iter().filter_map(|q| q.stretch).collect();
        let (avg_stretch, max_stretch) = if stretches.is_empty() {
            (1.0, 1.0)
        } else {
            let sum: f64 = stretches.iter().sum();
            let max = stretches.iter().copied().fold(1.0, f64::max);
            (sum / stretches.len() as f64, max)
        };
        let angle_distortion = faces
            .iter()
            .filter_map(|q| q.angle_error)
            .fold(0.0, f64::max);

        let coverage = coverage(uvs, &mesh.triangles, options);

        log::debug!(
            "metrics: stretch avg {:.3} max {:.3}, coverage {:.3}, angle {:.4} rad over {} faces",
            avg_stretch,
            max_stretch,
            coverage,
            angle_distortion,
            stretches.len()
        );

        Ok(Self {
            avg_stretch,
            max_stretch,
            coverage,
            angle_distortion,
            measured_faces: stretches.len(),
        })
    }

    /// Overwrite the quality fields of an unwrap result.
    pub fn apply(&self, result: &mut UnwrapResult) {
        result.avg_stretch = self.avg_stretch;
        result.max_stretch = self.max_stretch;
        result.coverage = self.coverage;
        result.angle_distortion = self.angle_distortion;
    }
}

fn face_quality(mesh: &Mesh, uvs: &[Point2<f64>], face: usize) -> FaceQuality {
    let [a, b, c] = mesh.triangles[face];
    let [p0, p1, p2] = mesh.triangle_positions(face);
    let (t0, t1, t2) = (uvs[a], uvs[b], uvs[c]);

    let duv = Matrix2::from_columns(&[t1 - t0, t2 - t0]);
    let stretch = duv
        .try_inverse()
        .filter(|_| duv.determinant().abs() > MIN_UV_DETERMINANT)
        .and_then(|inv| {
            let dp = Matrix3x2::from_columns(&[p1 - p0, p2 - p0]);
            let jacobian = dp * inv;
            gram_stretch(&(jacobian.transpose() * jacobian))
        });

    let angle_error = if stretch.is_some() {
        let angles_3d = mesh.corner_angles(face);
        let angles_2d = uv_corner_angles(&[t0, t1, t2]);
        angles_3d
            .iter()
            .zip(&angles_2d)
            .map(|(x, y)| (x - y).abs())
            .filter(|e| e.is_finite())
            .reduce(f64::max)
    } else {
        None
    };

    FaceQuality {
        stretch,
        angle_error,
    }
}

/// `sqrt(λmax / λmin)` of a symmetric positive definite 2×2 matrix.
fn gram_stretch(g: &Matrix2<f64>) -> Option<f64> {
    let trace = g.trace();
    let det = g.determinant();
    let disc = (0.25 * trace * trace - det).max(0.0).sqrt();
    let lambda_max = 0.5 * trace + disc;
    let lambda_min = 0.5 * trace - disc;
    if lambda_min.is_nan() || lambda_min <= 1e-16 || !lambda_max.is_finite() {
        return None;
    }
    Some((lambda_max / lambda_min).sqrt())
}

fn uv_corner_angles(t: &[Point2<f64>; 3]) -> [f64; 3] {
    let mut angles = [0.0; 3];
    for (i, angle) in angles.iter_mut().enumerate() {
        let e1 = t[(i + 1) % 3] - t[i];
        let e2 = t[(i + 2) % 3] - t[i];
        let denom = e1.norm() * e2.norm();
        *angle = if denom > 0.0 {
            (e1.dot(&e2) / denom).clamp(-1.0, 1.0).acos()
        } else {
            f64::NAN
        };
    }
    angles
}

/// A UV triangle prepared for scanline tests.
struct RasterTriangle {
    corners: [Point2<f64>; 3],
    min_y: f64,
    max_y: f64,
    min_x: f64,
    max_x: f64,
}

impl RasterTriangle {
    fn new(corners: [Point2<f64>; 3]) -> Option<Self> {
        let [a, b, c] = corners;
        let area2 = (b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y);
        if area2.is_nan() || area2.abs() <= MIN_UV_DETERMINANT {
            return None;
        }
        // Store counter-clockwise so inside means all edge functions >= 0
        let corners = if area2 > 0.0 { corners } else { [a, c, b] };
        Some(Self {
            corners,
            min_x: a.x.min(b.x).min(c.x),
            max_x: a.x.max(b.x).max(c.x),
            min_y: a.y.min(b.y).min(c.y),
            max_y: a.y.max(b.y).max(c.y),
        })
    }

    fn contains(&self, p: Point2<f64>) -> bool {
        (0..3).all(|i| {
            let a = self.corners[i];
            let b = self.corners[(i + 1) % 3];
            (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x) >= 0.0
        })
    }
}

/// Fraction of pixel centres in `[0,1]²` covered by at least one triangle.
fn coverage(uvs: &[Point2<f64>], triangles: &[[usize; 3]], options: &MetricsOptions) -> f64 {
    let res = options.resolution;
    let raster: Vec<RasterTriangle> = triangles
        .iter()
        .filter_map(|&[a, b, c]| RasterTriangle::new([uvs[a], uvs[b], uvs[c]]))
        .collect();

    let filled_row = |row: usize| -> usize {
        let y = (row as f64 + 0.5) / res as f64;
        let mut cells = vec![false; res];
        for tri in raster.iter().filter(|t| t.min_y <= y && y <= t.max_y) {
            let first = ((tri.min_x * res as f64 - 0.5).ceil().max(0.0)) as usize;
            let last = ((tri.max_x * res as f64 - 0.5).floor()).min(res as f64 - 1.0);
            if last < 0.0 {
                continue;
            }
            for (col, cell) in cells.iter_mut().enumerate().take(last as usize + 1).skip(first) {
                if !*cell {
                    let x = (col as f64 + 0.5) / res as f64;
                    *cell = tri.contains(Point2::new(x, y));
                }
            }
        }
        cells.iter().filter(|&&c| c).count()
    };

    let filled: usize = if options.parallel {
        (0..res).into_par_iter().map(filled_row).sum()
    } else {
        (0..res).map(filled_row).sum()
    };

    filled as f64 / (res * res) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::parameterize::UVMap;
    use crate::mesh::primitives;
    use nalgebra::Point3;

    fn with_uvs(mut mesh: Mesh, f: impl Fn(&Point3<f64>) -> Point2<f64>) -> Mesh {
        mesh.uvs = Some(UVMap::new(mesh.positions.iter().map(f).collect()));
        mesh
    }

    #[test]
    fn test_placeholder_values() {
        let mut result = UnwrapResult::default();
        result.max_stretch = 7.0;
        apply_placeholder_metrics(&mut result);
        assert_eq!(result.avg_stretch, 1.0);
        assert_eq!(result.max_stretch, 1.0);
        assert_eq!(result.coverage, PLACEHOLDER_COVERAGE);
        assert_eq!(result.angle_distortion, 0.0);
    }

    #[test]
    fn test_isometric_grid_has_unit_stretch() {
        // 4x4 grid mapped onto the unit square
        let mesh = with_uvs(primitives::grid(4), |p| Point2::new(p.x / 4.0, p.y / 4.0));
        let m = QualityMetrics::compute(&mesh, &MetricsOptions::default()).unwrap();

        assert_eq!(m.measured_faces, 32);
        assert!((m.avg_stretch - 1.0).abs() < 1e-9);
        assert!((m.max_stretch - 1.0).abs() < 1e-9);
        assert!(m.angle_distortion < 1e-9);
        assert!((m.coverage - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_axis_scaling_doubles_stretch() {
        let mesh = with_uvs(primitives::grid(2), |p| Point2::new(p.x / 2.0, p.y / 4.0));
        let m = QualityMetrics::compute(&mesh, &MetricsOptions::default().sequential()).unwrap();

        assert!((m.avg_stretch - 2.0).abs() < 1e-9);
        assert!((m.max_stretch - 2.0).abs() < 1e-9);
        assert!(m.angle_distortion > 0.1);
        // Only the lower half of the square is used
        assert!((m.coverage - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let mesh = with_uvs(primitives::icosphere(1), |p| {
            Point2::new(0.5 + 0.4 * p.x, 0.5 + 0.4 * p.y)
        });
        let options = MetricsOptions::default().with_resolution(64);
        let par = QualityMetrics::compute(&mesh, &options).unwrap();
        let seq = QualityMetrics::compute(&mesh, &options.clone().with_parallel(false)).unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_degenerate_uvs_fall_back_to_unit_stretch() {
        let mesh = with_uvs(primitives::cube(), |_| Point2::origin());
        let m = QualityMetrics::compute(&mesh, &MetricsOptions::default()).unwrap();
        assert_eq!(m.measured_faces, 0);
        assert_eq!(m.avg_stretch, 1.0);
        assert_eq!(m.max_stretch, 1.0);
        assert_eq!(m.coverage, 0.0);
    }

    #[test]
    fn test_apply_overwrites_result() {
        let metrics = QualityMetrics {
            avg_stretch: 1.2,
            max_stretch: 1.8,
            coverage: 0.4,
            angle_distortion: 0.1,
            measured_faces: 3,
        };
        let mut result = UnwrapResult::default();
        apply_placeholder_metrics(&mut result);
        metrics.apply(&mut result);
        assert_eq!(result.max_stretch, 1.8);
        assert_eq!(result.coverage, 0.4);
    }

    #[test]
    fn test_requires_uvs() {
        assert!(QualityMetrics::compute(&primitives::cube(), &MetricsOptions::default()).is_err());
        let mesh = with_uvs(primitives::cube(), |p| Point2::new(p.x, p.y));
        let options = MetricsOptions::default().with_resolution(0);
        assert!(QualityMetrics::compute(&mesh, &options).is_err());
    }

    #[test]
    fn test_gram_stretch() {
        assert!((gram_stretch(&Matrix2::identity()).unwrap() - 1.0).abs() < 1e-12);
        let g = Matrix2::new(9.0, 0.0, 0.0, 1.0);
        assert!((gram_stretch(&g).unwrap() - 3.0).abs() < 1e-12);
        assert!(gram_stretch(&Matrix2::zeros()).is_none());
    }
}
