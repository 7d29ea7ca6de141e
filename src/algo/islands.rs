//! Chart (island) extraction.
//!
//! A chart is a maximal set of faces reachable from each other across
//! interior edges that are not seams. Charts are labelled by breadth-first
//! search in face index order, so ids are stable for a given input.

use std::collections::VecDeque;

use crate::mesh::{Mesh, Topology};

use super::seams::SeamSet;

/// Chart assignment for every face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Islands {
    face_chart: Vec<usize>,
    num_charts: usize,
}

impl Islands {
    /// Number of charts.
    #[inline]
    pub fn num_charts(&self) -> usize {
        self.num_charts
    }

    /// Chart id per face.
    #[inline]
    pub fn face_chart(&self) -> &[usize] {
        &self.face_chart
    }

    /// Chart id of a face.
    #[inline]
    pub fn chart_of(&self, face: usize) -> usize {
        self.face_chart[face]
    }

    /// Faces of every chart, each list in ascending face order.
    pub fn chart_faces(&self) -> Vec<Vec<usize>> {
        let mut charts = vec![Vec::new(); self.num_charts];
        for (f, &c) in self.face_chart.iter().enumerate() {
            charts[c].push(f);
        }
        charts
    }

    /// Consume into the per-face chart id array.
    pub fn into_face_chart(self) -> Vec<usize> {
        self.face_chart
    }
}

/// Label connected components of the dual graph with seams removed.
///
/// Runs in O(F + E).
///
/// # Example
///
/// ```
/// use chartwise::algo::islands::extract_islands;
/// use chartwise::algo::seams::SeamSet;
/// use chartwise::mesh::{build_topology, primitives};
///
/// let grid = primitives::grid(1);
/// let topology = build_topology(&grid);
///
/// let whole = extract_islands(&grid, &topology, &SeamSet::default());
/// assert_eq!(whole.num_charts(), 1);
///
/// // Cutting the diagonal splits the quad in two
/// let diagonal = topology.interior_edges().next().unwrap().0;
/// let cut = extract_islands(&grid, &topology, &SeamSet::from_edges(&topology, [diagonal]));
/// assert_eq!(cut.num_charts(), 2);
/// ```
pub fn extract_islands(mesh: &Mesh, topology: &Topology, seams: &SeamSet) -> Islands {
    let num_faces = mesh.num_faces();
    let is_seam = seams.mask(topology.num_edges());

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); num_faces];
    for (e, f0, f1) in topology.interior_edges() {
        if !is_seam[e] {
            adjacency[f0].push(f1);
            adjacency[f1].push(f0);
        }
    }

    const UNVISITED: usize = usize::MAX;
    let mut face_chart = vec![UNVISITED; num_faces];
    let mut num_charts = 0;
    let mut queue = VecDeque::new();

    for start in 0..num_faces {
        if face_chart[start] != UNVISITED {
            continue;
        }
        face_chart[start] = num_charts;
        queue.push_back(start);

        while let Some(face) = queue.pop_front() {
            for &next in &adjacency[face] {
                if face_chart[next] == UNVISITED {
                    face_chart[next] = num_charts;
                    queue.push_back(next);
                }
            }
        }
        num_charts += 1;
    }

    log::debug!("extracted {} charts from {} faces", num_charts, num_faces);

    Islands {
        face_chart,
        num_charts,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::seams::{select_seams, SeamOptions};
    use crate::mesh::{build_topology, primitives};

    fn islands_for(mesh: &Mesh, seams: &SeamSet) -> Islands {
        let topo = build_topology(mesh);
        extract_islands(mesh, &topo, seams)
    }

    #[test]
    fn test_no_seams_single_chart() {
        let islands = islands_for(&primitives::icosphere(1), &SeamSet::default());
        assert_eq!(islands.num_charts(), 1);
        assert!(islands.face_chart().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_cutting_every_interior_edge_isolates_faces() {
        let mesh = primitives::cube();
        let topo = build_topology(&mesh);
        let all = SeamSet::from_edges(&topo, topo.interior_edges().map(|(e, _, _)| e));
        let islands = extract_islands(&mesh, &topo, &all);

        assert_eq!(islands.num_charts(), 12);
        // Ids follow face order
        assert_eq!(islands.face_chart(), &(0..12).collect::<Vec<_>>()[..]);
    }

    #[test]
    fn test_charts_partition_faces() {
        let mesh = primitives::icosphere(2);
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, 30.0, &SeamOptions::default());
        let islands = extract_islands(&mesh, &topo, &seams);

        let charts = islands.chart_faces();
        assert_eq!(charts.len(), islands.num_charts());
        assert_eq!(charts.iter().map(Vec::len).sum::<usize>(), mesh.num_faces());
        for (id, faces) in charts.iter().enumerate() {
            assert!(!faces.is_empty());
            assert!(faces.windows(2).all(|w| w[0] < w[1]));
            assert!(faces.iter().all(|&f| islands.chart_of(f) == id));
        }
    }

    #[test]
    fn test_ids_assigned_in_first_face_order() {
        let mesh = primitives::open_cylinder(6, 3);
        let topo = build_topology(&mesh);
        let every_other = topo.interior_edges().map(|(e, _, _)| e).step_by(2);
        let seams = SeamSet::from_edges(&topo, every_other);
        let islands = extract_islands(&mesh, &topo, &seams);

        // The first face of chart k always precedes the first face of chart k + 1
        let firsts: Vec<usize> = islands.chart_faces().iter().map(|f| f[0]).collect();
        assert!(firsts.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(islands.chart_of(0), 0);
    }

    #[test]
    fn test_extraction_is_reproducible() {
        let mesh = primitives::icosphere(1);
        let topo = build_topology(&mesh);
        let seams = select_seams(&mesh, &topo, 30.0, &SeamOptions::default());
        assert_eq!(
            extract_islands(&mesh, &topo, &seams),
            extract_islands(&mesh, &topo, &seams)
        );
    }
}
