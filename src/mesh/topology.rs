//! Edge topology of a triangle list.
//!
//! [`build_topology`] extracts every unique undirected edge of a [`Mesh`]
//! together with the one or two faces that use it. Edges are stored in
//! canonical form (smaller vertex index first) and are numbered in the order
//! they are first met while scanning the triangles, so the numbering is
//! deterministic for a given input.

use std::collections::HashMap;

use super::Mesh;

/// An undirected edge stored as `(min, max)` vertex indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    a: usize,
    b: usize,
}

impl Edge {
    /// Create the canonical edge between two vertices.
    #[inline]
    pub fn new(v0: usize, v1: usize) -> Self {
        if v0 < v1 {
            Self { a: v0, b: v1 }
        } else {
            Self { a: v1, b: v0 }
        }
    }

    /// Both endpoints, smaller first.
    #[inline]
    pub fn vertices(&self) -> [usize; 2] {
        [self.a, self.b]
    }
}

/// The faces incident to an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeFaces {
    /// The first face that referenced the edge.
    pub first: usize,
    /// The second face, or `None` for a boundary edge.
    pub second: Option<usize>,
}

impl EdgeFaces {
    /// Both faces when the edge is interior.
    #[inline]
    pub fn pair(&self) -> Option<(usize, usize)> {
        self.second.map(|s| (self.first, s))
    }
}

/// Unique edges of a mesh and their incident faces.
#[derive(Debug, Clone)]
pub struct Topology {
    edges: Vec<Edge>,
    edge_faces: Vec<EdgeFaces>,
    non_manifold: usize,
}

/// Result of the Euler characteristic check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EulerCheck {
    /// Vertex count (V).
    pub vertices: usize,
    /// Edge count (E).
    pub edges: usize,
    /// Face count (F).
    pub faces: usize,
    /// V - E + F.
    pub characteristic: i64,
}

impl EulerCheck {
    /// Whether the characteristic matches a closed genus-0 surface.
    #[inline]
    pub fn is_sphere_like(&self) -> bool {
        self.characteristic == 2
    }
}

/// Build the edge topology of a mesh.
///
/// Each triangle contributes its edges `(v0,v1)`, `(v1,v2)`, `(v2,v0)`. The
/// first face to reference an edge becomes its `first` face, the second
/// becomes `second`. Any further reference marks the edge as non-manifold;
/// it is counted and logged, and the extra face is dropped. A triangle
/// that repeats a vertex contributes only its one real edge, recorded once.
///
/// Runs in expected O(F).
///
/// # Example
///
/// ```
/// use chartwise::mesh::{build_topology, primitives};
///
/// let cube = primitives::cube();
/// let topology = build_topology(&cube);
/// assert_eq!(topology.num_edges(), 18);
/// assert!(topology.is_closed());
/// ```
pub fn build_topology(mesh: &Mesh) -> Topology {
    let mut index: HashMap<Edge, usize> = HashMap::with_capacity(mesh.num_faces() * 3 / 2 + 1);
    let mut edges = Vec::with_capacity(mesh.num_faces() * 3 / 2 + 1);
    let mut edge_faces: Vec<EdgeFaces> = Vec::with_capacity(edges.capacity());
    let mut non_manifold = 0;

    for (f, tri) in mesh.triangles.iter().enumerate() {
        for i in 0..3 {
            let (v0, v1) = (tri[i], tri[(i + 1) % 3]);
            if v0 == v1 {
                continue;
            }
            let edge = Edge::new(v0, v1);
            match index.get(&edge) {
                None => {
                    index.insert(edge, edges.len());
                    edges.push(edge);
                    edge_faces.push(EdgeFaces {
                        first: f,
                        second: None,
                    });
                }
                Some(&e) => {
                    let faces = &mut edge_faces[e];
                    // A triangle like [a, a, b] names (a, b) twice
                    if faces.first == f || faces.second == Some(f) {
                        continue;
                    }
                    if faces.second.is_none() {
                        faces.second = Some(f);
                    } else {
                        non_manifold += 1;
                    }
                }
            }
        }
    }

    if non_manifold > 0 {
        log::warn!(
            "{} non-manifold edge references ignored (only the first two faces per edge are kept)",
            non_manifold
        );
    }

    Topology {
        edges,
        edge_faces,
        non_manifold,
    }
}

impl Topology {
    /// Number of unique edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get an edge by index.
    #[inline]
    pub fn edge(&self, e: usize) -> Edge {
        self.edges[e]
    }

    /// Get the faces incident to an edge.
    #[inline]
    pub fn faces(&self, e: usize) -> EdgeFaces {
        self.edge_faces[e]
    }

    /// Whether an edge has exactly one incident face.
    #[inline]
    pub fn is_boundary(&self, e: usize) -> bool {
        self.edge_faces[e].second.is_none()
    }

    /// Iterate over interior edges as `(edge, face0, face1)`, in edge order.
    pub fn interior_edges(&self) -> impl Iterator<Item = (usize, usize, usize)> + '_ {
        self.edge_faces
            .iter()
            .enumerate()
            .filter_map(|(e, ef)| ef.pair().map(|(f0, f1)| (e, f0, f1)))
    }

    /// Number of boundary edges.
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_faces.iter().filter(|ef| ef.second.is_none()).count()
    }

    /// Whether the mesh has no boundary edges.
    pub fn is_closed(&self) -> bool {
        self.edge_faces.iter().all(|ef| ef.second.is_some())
    }

    /// Number of dropped third-or-later face references.
    #[inline]
    pub fn non_manifold_edges(&self) -> usize {
        self.non_manifold
    }

    /// Number of edges incident to each vertex.
    pub fn vertex_degrees(&self, num_vertices: usize) -> Vec<usize> {
        let mut degrees = vec![0; num_vertices];
        for edge in &self.edges {
            degrees[edge.a] += 1;
            degrees[edge.b] += 1;
        }
        degrees
    }

    /// Compute V - E + F for the mesh this topology was built from.
    pub fn euler_characteristic(&self, mesh: &Mesh) -> i64 {
        mesh.num_vertices() as i64 - self.num_edges() as i64 + mesh.num_faces() as i64
    }

    /// Check the Euler characteristic, logging a warning when it is not 2.
    ///
    /// Open meshes legitimately differ from 2, so this never fails.
    pub fn validate(&self, mesh: &Mesh) -> EulerCheck {
        let check = EulerCheck {
            vertices: mesh.num_vertices(),
            edges: self.num_edges(),
            faces: mesh.num_faces(),
            characteristic: self.euler_characteristic(mesh),
        };

        log::debug!(
            "topology: V={}, E={}, F={}, euler={}",
            check.vertices,
            check.edges,
            check.faces,
            check.characteristic
        );
        if !check.is_sphere_like() {
            log::warn!(
                "non-standard Euler characteristic {} (2 expected for a closed mesh)",
                check.characteristic
            );
        }

        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::primitives;
    use nalgebra::Point3;

    #[test]
    fn test_edge_canonical() {
        assert_eq!(Edge::new(5, 2), Edge::new(2, 5));
        assert_eq!(Edge::new(5, 2).vertices(), [2, 5]);
    }

    #[test]
    fn test_cube_topology() {
        let mesh = primitives::cube();
        let topo = build_topology(&mesh);

        assert_eq!(topo.num_edges(), 18);
        assert!(topo.is_closed());
        assert_eq!(topo.boundary_edge_count(), 0);
        assert_eq!(topo.euler_characteristic(&mesh), 2);
        assert!(topo.validate(&mesh).is_sphere_like());
    }

    #[test]
    fn test_icosphere_topology() {
        let mesh = primitives::icosphere(1);
        assert_eq!(mesh.num_vertices(), 42);
        assert_eq!(mesh.num_faces(), 80);

        let topo = build_topology(&mesh);
        assert_eq!(topo.num_edges(), 120);
        assert_eq!(topo.euler_characteristic(&mesh), 2);
    }

    #[test]
    fn test_open_cylinder_topology() {
        let mesh = primitives::open_cylinder(16, 2);
        let topo = build_topology(&mesh);

        assert!(!topo.is_closed());
        assert_eq!(topo.boundary_edge_count(), 32);
        // An open tube is an annulus
        assert_eq!(topo.euler_characteristic(&mesh), 0);
        assert!(!topo.validate(&mesh).is_sphere_like());
    }

    #[test]
    fn test_every_triangle_edge_stored_once() {
        let mesh = primitives::icosphere(1);
        let topo = build_topology(&mesh);

        let mut uses = vec![0usize; topo.num_edges()];
        for (e, ef) in topo.edge_faces.iter().enumerate() {
            uses[e] += 1 + ef.second.is_some() as usize;
            let [a, b] = topo.edge(e).vertices();
            assert!(a < b);
            let tri = mesh.triangles[ef.first];
            assert!(tri.contains(&a) && tri.contains(&b));
        }
        assert_eq!(uses.iter().sum::<usize>(), mesh.num_faces() * 3);
    }

    #[test]
    fn test_first_seen_numbering() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let topo = build_topology(&mesh);

        assert_eq!(topo.num_edges(), 5);
        assert_eq!(topo.edge(0), Edge::new(0, 1));
        assert_eq!(topo.edge(1), Edge::new(1, 2));
        assert_eq!(topo.edge(2), Edge::new(0, 2));
        assert_eq!(topo.faces(2), EdgeFaces { first: 0, second: Some(1) });
        assert_eq!(topo.interior_edges().collect::<Vec<_>>(), vec![(2, 0, 1)]);
        assert_eq!(topo.vertex_degrees(4), vec![3, 2, 3, 2]);
    }

    #[test]
    fn test_non_manifold_edge_keeps_first_two_faces() {
        // Three triangles fanning around edge (0, 1)
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.5, 1.0, 0.0),
                Point3::new(0.5, -1.0, 0.0),
                Point3::new(0.5, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [1, 0, 3], [0, 1, 4]],
        );
        let topo = build_topology(&mesh);

        assert_eq!(topo.non_manifold_edges(), 1);
        assert_eq!(topo.faces(0), EdgeFaces { first: 0, second: Some(1) });
    }

    #[test]
    fn test_repeated_corner_adds_no_self_loop() {
        let mesh = Mesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 0, 1]],
        );
        let topo = build_topology(&mesh);

        assert_eq!(topo.num_edges(), 3);
        assert!((0..topo.num_edges()).all(|e| {
            let [a, b] = topo.edge(e).vertices();
            a != b
        }));
        // (0, 1) is shared with the collapsed face exactly once
        assert_eq!(topo.faces(0), EdgeFaces { first: 0, second: Some(1) });
        assert_eq!(topo.non_manifold_edges(), 0);
        assert_eq!(topo.vertex_degrees(3), vec![2, 2, 2]);
    }

    #[test]
    fn test_empty_mesh_topology() {
        let topo = build_topology(&Mesh::default());
        assert_eq!(topo.num_edges(), 0);
        assert!(topo.is_closed());
    }
}
