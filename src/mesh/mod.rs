//! Core mesh data structures.
//!
//! This module provides the triangle-soup [`Mesh`] that flows through the
//! unwrapping pipeline, the edge [`Topology`] derived from it, and a few
//! procedural [`primitives`].
//!
//! # Overview
//!
//! A [`Mesh`] is an indexed triangle list: a vertex position array, a list of
//! `[v0, v1, v2]` index triples, and an optional per-vertex [`UVMap`] that is
//! only populated after parameterization.
//!
//! ```
//! use chartwise::mesh::Mesh;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = Mesh::new(positions, vec![[0, 1, 2]]);
//!
//! assert!(mesh.validate().is_ok());
//! assert_eq!(mesh.num_faces(), 1);
//! ```

pub mod primitives;
mod topology;

pub use topology::{build_topology, Edge, EdgeFaces, EulerCheck, Topology};

use nalgebra::{Point3, Vector3};

use crate::algo::parameterize::UVMap;
use crate::error::{Result, UnwrapError};

/// An indexed triangle mesh with optional per-vertex UV coordinates.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Point3<f64>>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[usize; 3]>,
    /// Per-vertex UV coordinates, one per position when present.
    pub uvs: Option<UVMap>,
}

impl Mesh {
    /// Create a mesh without UVs.
    ///
    /// Indices are not checked here; call [`Mesh::validate`] before handing
    /// foreign data to the pipeline.
    pub fn new(positions: Vec<Point3<f64>>, triangles: Vec<[usize; 3]>) -> Self {
        Self {
            positions,
            triangles,
            uvs: None,
        }
    }

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.triangles.len()
    }

    /// Check that every triangle index is in range.
    ///
    /// A mesh without faces is valid and unwraps to zero charts. Triangles
    /// that repeat a vertex are accepted too; topology ignores their
    /// collapsed edge.
    ///
    /// # Errors
    ///
    /// Returns [`UnwrapError::InvalidVertexIndex`] for the first index that
    /// does not name a vertex.
    pub fn validate(&self) -> Result<()> {
        let n = self.positions.len();
        for (fi, tri) in self.triangles.iter().enumerate() {
            if let Some(&vi) = tri.iter().find(|&&vi| vi >= n) {
                return Err(UnwrapError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        Ok(())
    }

    /// Get the three corner positions of a triangle.
    #[inline]
    pub fn triangle_positions(&self, face: usize) -> [Point3<f64>; 3] {
        let [a, b, c] = self.triangles[face];
        [self.positions[a], self.positions[b], self.positions[c]]
    }

    /// Compute the unnormalized normal of a triangle (length is twice the area).
    pub fn face_cross(&self, face: usize) -> Vector3<f64> {
        let [p0, p1, p2] = self.triangle_positions(face);
        (p1 - p0).cross(&(p2 - p0))
    }

    /// Compute the area of a triangle.
    pub fn face_area(&self, face: usize) -> f64 {
        0.5 * self.face_cross(face).norm()
    }

    /// Interior angle at each corner of a triangle, in radians.
    ///
    /// A corner with a zero-length edge yields NaN.
    pub fn corner_angles(&self, face: usize) -> [f64; 3] {
        let p = self.triangle_positions(face);
        let mut angles = [0.0; 3];
        for (i, angle) in angles.iter_mut().enumerate() {
            let e1 = p[(i + 1) % 3] - p[i];
            let e2 = p[(i + 2) % 3] - p[i];
            let denom = e1.norm() * e2.norm();
            *angle = if denom > 0.0 {
                (e1.dot(&e2) / denom).clamp(-1.0, 1.0).acos()
            } else {
                f64::NAN
            };
        }
        angles
    }

    /// Compute the axis-aligned bounding box of the vertex positions.
    ///
    /// Returns `None` if the mesh has no vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = *self.positions.first()?;
        let mut min = first;
        let mut max = first;
        for p in &self.positions {
            min = min.inf(p);
            max = max.sup(p);
        }
        Some((min, max))
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        (0..self.num_faces()).map(|f| self.face_area(f)).sum()
    }
}
