//! Seam selection.
//!
//! Seams are chosen on the dual graph (faces as nodes, interior edges as
//! links). A breadth-first spanning forest keeps each connected region in one
//! piece; the interior edges left out of the forest are the seam candidates.
//! Cutting every candidate usually cuts far more than needed, so only a
//! budgeted prefix is kept. Candidates are ranked by the summed edge degree
//! of their endpoints, lowest first. The budget depends on face count and on
//! whether the mesh is closed (see [`SeamBudget`]).
//!
//! # Example
//!
//! ```
//! use chartwise::algo::seams::{select_seams, SeamOptions};
//! use chartwise::mesh::{build_topology, primitives};
//!
//! let cube = primitives::cube();
//! let topology = build_topology(&cube);
//! let seams = select_seams(&cube, &topology, 30.0, &SeamOptions::default());
//!
//! // 18 interior edges, 11 of them in the spanning tree
//! assert_eq!(seams.candidates(), 7);
//! assert_eq!(seams.len(), 7);
//! ```

use std::collections::VecDeque;

use crate::mesh::{Mesh, Topology};

/// Face-count bands that decide how many seam candidates to keep.
///
/// The defaults are tuned on a cube (12 faces), an open cylinder and an
/// 80-face icosphere. They are heuristics, not a minimal-distortion
/// guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeamBudget {
    /// Closed meshes with at most this many faces keep every candidate.
    pub simple_face_limit: usize,
    /// Upper face count of the medium band for closed meshes.
    pub medium_face_limit: usize,
    /// Medium band keeps `candidates / medium_divisor` (at least one).
    pub medium_divisor: usize,
    /// Medium band cap.
    pub medium_cap: usize,
    /// Complex band keeps `candidates / complex_divisor` (at least one).
    pub complex_divisor: usize,
    /// Complex band cap.
    pub complex_cap: usize,
    /// Open meshes keep `candidates / open_divisor` (at least one).
    pub open_divisor: usize,
    /// Open mesh cap.
    pub open_cap: usize,
}

impl Default for SeamBudget {
    fn default() -> Self {
        Self {
            simple_face_limit: 20,
            medium_face_limit: 70,
            medium_divisor: 3,
            medium_cap: 2,
            complex_divisor: 14,
            complex_cap: 5,
            open_divisor: 3,
            open_cap: 2,
        }
    }
}

impl SeamBudget {
    /// Number of candidates to keep.
    ///
    /// Never exceeds `candidates`, and is zero only when there are no
    /// candidates.
    pub fn target(&self, num_faces: usize, candidates: usize, closed: bool) -> usize {
        fn banded(candidates: usize, divisor: usize, cap: usize) -> usize {
            (candidates / divisor.max(1)).max(1).min(cap)
        }

        let target = if !closed {
            banded(candidates, self.open_divisor, self.open_cap)
        } else if num_faces <= self.simple_face_limit {
            candidates
        } else if num_faces <= self.medium_face_limit {
            banded(candidates, self.medium_divisor, self.medium_cap)
        } else {
            banded(candidates, self.complex_divisor, self.complex_cap)
        };

        target.min(candidates)
    }
}

/// Options for seam selection.
#[derive(Debug, Clone, Default)]
pub struct SeamOptions {
    /// Candidate budget.
    pub budget: SeamBudget,

    /// Also cut every interior edge around vertices whose angular defect
    /// exceeds the angle threshold. Off by default; on curved meshes it
    /// shatters the surface into many small charts.
    pub curvature_refinement: bool,
}

impl SeamOptions {
    /// Set the candidate budget.
    pub fn with_budget(mut self, budget: SeamBudget) -> Self {
        self.budget = budget;
        self
    }

    /// Enable or disable curvature refinement.
    pub fn with_curvature_refinement(mut self, enabled: bool) -> Self {
        self.curvature_refinement = enabled;
        self
    }
}

/// Edges chosen as cuts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeamSet {
    edges: Vec<usize>,
    candidates: usize,
    closed: bool,
}

impl SeamSet {
    /// Build a seam set from hand-picked edge indices of `topology`.
    ///
    /// Only interior edges can separate charts, so boundary edges and
    /// indices past `topology.num_edges()` are dropped, as are duplicates.
    pub fn from_edges<I>(topology: &Topology, edges: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut kept = Vec::new();
        let mut dropped = 0;
        for e in edges {
            if e < topology.num_edges() && !topology.is_boundary(e) {
                kept.push(e);
            } else {
                dropped += 1;
            }
        }
        let mut edges = kept;
        edges.sort_unstable();
        edges.dedup();
        if dropped > 0 {
            log::debug!("ignored {} seam edges that are not interior", dropped);
        }
        Self {
            edges,
            candidates: 0,
            closed: topology.is_closed(),
        }
    }

    /// Seam edge indices in ascending order.
    #[inline]
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }

    /// Number of seams.
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Whether there are no seams.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Whether an edge is a seam.
    #[inline]
    pub fn contains(&self, edge: usize) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    /// Boolean lookup table indexed by edge.
    ///
    /// Seams at or past `num_edges` are left out of the table.
    pub fn mask(&self, num_edges: usize) -> Vec<bool> {
        let mut mask = vec![false; num_edges];
        for &e in &self.edges {
            if e < num_edges {
                mask[e] = true;
            }
        }
        mask
    }

    /// Number of non-tree interior edges that were considered.
    #[inline]
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// Whether the mesh had no boundary edges.
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Face adjacency through interior edges.
#[derive(Debug, Clone)]
pub struct DualGraph {
    /// For each face, its `(neighbor face, shared edge)` pairs in edge order.
    adjacency: Vec<Vec<(usize, usize)>>,
}

impl DualGraph {
    /// Build the dual graph of a mesh.
    ///
    /// Boundary edges have a single face and contribute no link.
    pub fn new(topology: &Topology, num_faces: usize) -> Self {
        let mut adjacency = vec![Vec::new(); num_faces];
        for (e, f0, f1) in topology.interior_edges() {
            adjacency[f0].push((f1, e));
            adjacency[f1].push((f0, e));
        }
        Self { adjacency }
    }

    /// Number of nodes (faces).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.adjacency.len()
    }

    /// Neighbors of a face.
    #[inline]
    pub fn neighbors(&self, face: usize) -> &[(usize, usize)] {
        &self.adjacency[face]
    }

    /// Breadth-first spanning forest.
    ///
    /// Traversal restarts from every unvisited face in index order. Returns a
    /// mask over mesh edges marking those used to reach a new face.
    pub fn spanning_forest(&self, num_edges: usize) -> Vec<bool> {
        let mut tree = vec![false; num_edges];
        let mut visited = vec![false; self.num_faces()];
        let mut queue = VecDeque::new();

        for start in 0..self.num_faces() {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            queue.push_back(start);

            while let Some(face) = queue.pop_front() {
                for &(next, edge) in &self.adjacency[face] {
                    if !visited[next] {
                        visited[next] = true;
                        tree[edge] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        tree
    }
}

/// Select seam edges for a mesh.
///
/// `angle_threshold` (degrees) only matters when
/// [`SeamOptions::curvature_refinement`] is enabled.
///
/// The result is deterministic. Candidates with equal priority are ordered
/// by edge index.
pub fn select_seams(
    mesh: &Mesh,
    topology: &Topology,
    angle_threshold: f64,
    options: &SeamOptions,
) -> SeamSet {
    let num_edges = topology.num_edges();
    let dual = DualGraph::new(topology, mesh.num_faces());
    let tree = dual.spanning_forest(num_edges);

    let closed = topology.is_closed();
    let degrees = topology.vertex_degrees(mesh.num_vertices());

    let mut candidates: Vec<(usize, usize)> = topology
        .interior_edges()
        .filter(|&(e, _, _)| !tree[e])
        .map(|(e, _, _)| {
            let [a, b] = topology.edge(e).vertices();
            (degrees[a] + degrees[b], e)
        })
        .collect();
    candidates.sort_by_key(|&(priority, edge)| (priority, edge));

    let target = options
        .budget
        .target(mesh.num_faces(), candidates.len(), closed);

    let mut edges: Vec<usize> = candidates[..target].iter().map(|&(_, e)| e).collect();

    if options.curvature_refinement {
        let added = refine_by_curvature(mesh, topology, angle_threshold.to_radians(), &mut edges);
        log::debug!("curvature refinement added {} seams", added);
    }

    edges.sort_unstable();
    edges.dedup();

    log::debug!(
        "seam selection: {} mesh, {} candidates, {} seams",
        if closed { "closed" } else { "open" },
        candidates.len(),
        edges.len()
    );

    SeamSet {
        edges,
        candidates: candidates.len(),
        closed,
    }
}

/// Angular defect `2π - Σ corner angles` at every vertex.
///
/// Near zero on flat regions, positive at convex corners, negative at saddles.
/// Degenerate corners (NaN angles) are ignored.
pub fn angular_defects(mesh: &Mesh) -> Vec<f64> {
    let mut defects = vec![std::f64::consts::TAU; mesh.num_vertices()];
    for (f, tri) in mesh.triangles.iter().enumerate() {
        let angles = mesh.corner_angles(f);
        for (corner, &v) in tri.iter().enumerate() {
            if angles[corner].is_finite() {
                defects[v] -= angles[corner];
            }
        }
    }
    defects
}

/// Add interior edges around high-defect vertices to `seams`.
///
/// Returns the number of edges added.
fn refine_by_curvature(
    mesh: &Mesh,
    topology: &Topology,
    threshold: f64,
    seams: &mut Vec<usize>,
) -> usize {
    let defects = angular_defects(mesh);
    let before = seams.len();

    let mut is_seam = vec![false; topology.num_edges()];
    for &e in seams.iter() {
        is_seam[e] = true;
    }

    for (e, _, _) in topology.interior_edges() {
        if is_seam[e] {
            continue;
        }
        let [a, b] = topology.edge(e).vertices();
        if defects[a].abs() > threshold || defects[b].abs() > threshold {
            is_seam[e] = true;
            seams.push(e);
        }
    }

    seams.len() - before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_topology, primitives};

    fn seams_for(mesh: &Mesh) -> SeamSet {
        let topo = build_topology(mesh);
        select_seams(mesh, &topo, 30.0, &SeamOptions::default())
    }

    #[test]
    fn test_budget_bands() {
        let budget = SeamBudget::default();
        assert_eq!(budget.target(12, 7, true), 7);
        assert_eq!(budget.target(64, 30, true), 2);
        assert_eq!(budget.target(64, 2, true), 1);
        assert_eq!(budget.target(80, 41, true), 2);
        assert_eq!(budget.target(1000, 500, true), 5);
        assert_eq!(budget.target(64, 17, false), 2);
        assert_eq!(budget.target(64, 1, false), 1);
        assert_eq!(budget.target(64, 0, false), 0);
        assert_eq!(budget.target(500, 0, true), 0);
    }

    #[test]
    fn test_spanning_forest_size() {
        let mesh = primitives::icosphere(1);
        let topo = build_topology(&mesh);
        let dual = DualGraph::new(&topo, mesh.num_faces());
        let tree = dual.spanning_forest(topo.num_edges());

        // A connected dual graph has a spanning tree with F - 1 links
        assert_eq!(tree.iter().filter(|&&t| t).count(), mesh.num_faces() - 1);
    }

    #[test]
    fn test_spanning_forest_restarts_per_component() {
        // Two disjoint triangles
        let mut mesh = primitives::grid(1);
        let offset = mesh.num_vertices();
        let copy = mesh.clone();
        let shift = nalgebra::Vector3::new(5.0, 0.0, 0.0);
        mesh.positions.extend(copy.positions.iter().map(|p| p + shift));
        mesh.triangles.extend(
            copy.triangles
                .iter()
                .map(|t| [t[0] + offset, t[1] + offset, t[2] + offset]),
        );

        let topo = build_topology(&mesh);
        let dual = DualGraph::new(&topo, mesh.num_faces());
        let tree = dual.spanning_forest(topo.num_edges());

        // Four faces in two components: 4 - 2 tree links
        assert_eq!(tree.iter().filter(|&&t| t).count(), 2);
    }

    #[test]
    fn test_cube_seam_count() {
        let seams = seams_for(&primitives::cube());
        assert!(seams.is_closed());
        assert!((7..=11).contains(&seams.len()), "got {} seams", seams.len());
    }

    #[test]
    fn test_sphere_seam_count() {
        let seams = seams_for(&primitives::icosphere(1));
        assert_eq!(seams.candidates(), 41);
        assert!((1..=5).contains(&seams.len()), "got {} seams", seams.len());
    }

    #[test]
    fn test_open_cylinder_seam_count() {
        let seams = seams_for(&primitives::open_cylinder(16, 2));
        assert!(!seams.is_closed());
        assert!((1..=3).contains(&seams.len()), "got {} seams", seams.len());
    }

    #[test]
    fn test_seams_are_interior_non_tree_edges() {
        for mesh in [
            primitives::cube(),
            primitives::icosphere(1),
            primitives::open_cylinder(16, 2),
        ] {
            let topo = build_topology(&mesh);
            let tree = DualGraph::new(&topo, mesh.num_faces()).spanning_forest(topo.num_edges());
            let seams = select_seams(&mesh, &topo, 30.0, &SeamOptions::default());
            for &e in seams.edges() {
                assert!(!topo.is_boundary(e));
                assert!(!tree[e]);
            }
        }
    }

    #[test]
    fn test_lowest_priority_candidates_win() {
        let mesh = primitives::icosphere(1);
        let topo = build_topology(&mesh);
        let tree = DualGraph::new(&topo, mesh.num_faces()).spanning_forest(topo.num_edges());
        let degrees = topo.vertex_degrees(mesh.num_vertices());
        let priority = |e: usize| {
            let [a, b] = topo.edge(e).vertices();
            degrees[a] + degrees[b]
        };

        let seams = select_seams(&mesh, &topo, 30.0, &SeamOptions::default());
        let worst_kept = seams.edges().iter().map(|&e| priority(e)).max().unwrap();
        for (e, _, _) in topo.interior_edges() {
            if !tree[e] && !seams.contains(e) {
                assert!(priority(e) >= worst_kept);
            }
        }
    }

    #[test]
    fn test_selection_is_reproducible() {
        let mesh = primitives::icosphere(2);
        assert_eq!(seams_for(&mesh), seams_for(&mesh));
    }

    #[test]
    fn test_flat_grid_has_no_candidates() {
        // A triangulated disk: tree edges = F - 1 = interior edges
        let seams = seams_for(&primitives::grid(1));
        assert_eq!(seams.candidates(), 0);
        assert!(seams.is_empty());
    }

    #[test]
    fn test_angular_defects() {
        let cube = primitives::cube();
        for d in angular_defects(&cube) {
            // Three right angles meet at every cube corner
            assert!((d - std::f64::consts::FRAC_PI_2).abs() < 1e-9);
        }

        // Interior vertex of a flat grid is flat
        let grid = primitives::grid(2);
        assert!(angular_defects(&grid)[4].abs() < 1e-9);
    }

    #[test]
    fn test_curvature_refinement_adds_interior_edges_only() {
        let mesh = primitives::cube();
        let topo = build_topology(&mesh);
        let options = SeamOptions::default().with_curvature_refinement(true);
        let seams = select_seams(&mesh, &topo, 30.0, &options);

        // Every cube corner exceeds 30 degrees of defect
        assert_eq!(seams.len(), 18);

        let open = primitives::open_cylinder(8, 1);
        let topo = build_topology(&open);
        let seams = select_seams(&open, &topo, 1.0, &options);
        assert!(seams.edges().iter().all(|&e| !topo.is_boundary(e)));
    }

    #[test]
    fn test_seam_set_lookup() {
        let mesh = primitives::cube();
        let topo = build_topology(&mesh);
        let seams = SeamSet::from_edges(&topo, vec![9, 2, 2, 5]);
        assert_eq!(seams.edges(), &[2, 5, 9]);
        assert!(seams.contains(5));
        assert!(!seams.contains(4));
        assert!(seams.is_closed());
        assert_eq!(seams.mask(6), vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_seam_set_keeps_only_interior_edges() {
        let mesh = primitives::grid(2);
        let topo = build_topology(&mesh);
        let n = topo.num_edges();
        let boundary: Vec<usize> = (0..n).filter(|&e| topo.is_boundary(e)).collect();
        let interior: Vec<usize> = topo.interior_edges().map(|(e, _, _)| e).collect();
        assert!(!boundary.is_empty() && interior.len() >= 2);

        let picked = vec![interior[1], boundary[0], interior[0], n, n + 7, interior[1]];
        let seams = SeamSet::from_edges(&topo, picked);

        let mut expected = vec![interior[0], interior[1]];
        expected.sort_unstable();
        assert_eq!(seams.edges(), &expected[..]);
        assert!(!seams.is_closed());
        assert_eq!(seams.mask(n).iter().filter(|&&m| m).count(), 2);
    }
}
