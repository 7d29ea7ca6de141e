//! Procedural test shapes.
//!
//! These are the canonical shapes the seam budget is calibrated against:
//! a unit cube, a subdivided icosahedron and an open cylinder, plus a flat
//! grid for disk-topology cases.

use std::collections::HashMap;

use nalgebra::Point3;

use super::{Edge, Mesh};

/// Unit cube `[0,1]³` with 8 vertices and 12 outward-facing triangles.
pub fn cube() -> Mesh {
    let positions = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(1.0, 1.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.0, 0.0, 1.0),
        Point3::new(1.0, 0.0, 1.0),
        Point3::new(1.0, 1.0, 1.0),
        Point3::new(0.0, 1.0, 1.0),
    ];
    let triangles = vec![
        [0, 2, 1], // bottom
        [0, 3, 2],
        [4, 5, 6], // top
        [4, 6, 7],
        [0, 1, 5], // front
        [0, 5, 4],
        [3, 7, 6], // back
        [3, 6, 2],
        [0, 4, 7], // left
        [0, 7, 3],
        [1, 2, 6], // right
        [1, 6, 5],
    ];
    Mesh::new(positions, triangles)
}

/// Unit sphere built by midpoint subdivision of an icosahedron.
///
/// Level 0 is the icosahedron itself (12 vertices, 20 faces); each level
/// quadruples the face count, so level 1 has 42 vertices and 80 faces.
pub fn icosphere(subdivisions: usize) -> Mesh {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let mut positions: Vec<Point3<f64>> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .iter()
    .map(|&(x, y, z)| Point3::from(nalgebra::Vector3::new(x, y, z).normalize()))
    .collect();

    let mut triangles: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..subdivisions {
        let mut midpoints: HashMap<Edge, usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<Point3<f64>>| -> usize {
            *midpoints.entry(Edge::new(a, b)).or_insert_with(|| {
                let m = (positions[a].coords + positions[b].coords).normalize();
                positions.push(Point3::from(m));
                positions.len() - 1
            })
        };

        let mut next = Vec::with_capacity(triangles.len() * 4);
        for &[a, b, c] in &triangles {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            next.push([a, ab, ca]);
            next.push([b, bc, ab]);
            next.push([c, ca, bc]);
            next.push([ab, bc, ca]);
        }
        triangles = next;
    }

    Mesh::new(positions, triangles)
}

/// Open tube of radius 1 and height 2 around the z axis.
///
/// `segments` vertices per ring, `rows` quad rows (each split into two
/// triangles). Both end rings are boundary loops.
pub fn open_cylinder(segments: usize, rows: usize) -> Mesh {
    let segments = segments.max(3);
    let rows = rows.max(1);

    let mut positions = Vec::with_capacity(segments * (rows + 1));
    for j in 0..=rows {
        let z = 2.0 * j as f64 / rows as f64;
        for i in 0..segments {
            let theta = std::f64::consts::TAU * i as f64 / segments as f64;
            positions.push(Point3::new(theta.cos(), theta.sin(), z));
        }
    }

    let mut triangles = Vec::with_capacity(2 * segments * rows);
    for j in 0..rows {
        for i in 0..segments {
            let a = j * segments + i;
            let b = j * segments + (i + 1) % segments;
            let c = (j + 1) * segments + (i + 1) % segments;
            let d = (j + 1) * segments + i;
            triangles.push([a, b, c]);
            triangles.push([a, c, d]);
        }
    }

    Mesh::new(positions, triangles)
}

/// Flat `n × n` grid of unit cells in the z = 0 plane.
pub fn grid(n: usize) -> Mesh {
    let mut positions = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            positions.push(Point3::new(i as f64, j as f64, 0.0));
        }
    }

    let mut triangles = Vec::with_capacity(n * n * 2);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            triangles.push([v00, v10, v11]);
            triangles.push([v00, v11, v01]);
        }
    }

    Mesh::new(positions, triangles)
}
