//! # Chartwise
//!
//! Automatic UV atlas generation for triangle meshes.
//!
//! Chartwise takes an indexed triangle mesh and produces one UV coordinate
//! per vertex, laid out in the unit square. The pipeline runs in fixed
//! stages:
//!
//! 1. **Topology**: unique edges and their adjacent faces
//! 2. **Seams**: a spanning tree over the face adjacency graph picks which
//!    edges to cut
//! 3. **Charts**: connected face groups across non-seam edges
//! 4. **Parameterization**: each chart is flattened with Least Squares
//!    Conformal Maps
//! 5. **Packing**: charts are arranged in shelves and scaled into `[0,1]²`
//! 6. **Metrics**: placeholder quality figures, with exact ones available
//!    from [`algo::metrics::QualityMetrics`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use chartwise::prelude::*;
//!
//! let mesh = chartwise::io::load("model.obj").unwrap();
//! let (unwrapped, result) = unwrap(&mesh, &UnwrapParams::default()).unwrap();
//!
//! println!("Charts: {}", result.num_charts);
//! chartwise::io::save(&unwrapped, "model_uv.obj").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use chartwise::prelude::*;
//! use nalgebra::Point3;
//!
//! let positions = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let triangles = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let mesh = Mesh::new(positions, triangles);
//!
//! let topology = build_topology(&mesh);
//! assert_eq!(topology.num_edges(), 6);
//! assert!(topology.is_closed());
//! ```
//!
//! ## Observing Progress
//!
//! Stages report to an [`algo::Observer`] instead of printing:
//!
//! ```
//! use chartwise::prelude::*;
//!
//! let observer = Observer::new(|event| {
//!     if let Event::Stage { stage, .. } = event {
//!         eprintln!("{}", stage);
//!     }
//! });
//! let cube = primitives::cube();
//! unwrap_with_observer(&cube, &UnwrapParams::default(), &observer).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod unwrap;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use chartwise::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::parameterize::{LscmOptions, UVMap};
    pub use crate::algo::seams::SeamOptions;
    pub use crate::algo::{Event, Observer, Stage};
    pub use crate::error::{Result, UnwrapError};
    pub use crate::mesh::{build_topology, primitives, Mesh, Topology};
    pub use crate::unwrap::{
        unwrap, unwrap_with_observer, ChartStatus, ChartSummary, UnwrapParams, UnwrapResult,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];

        let triangles = vec![
            [0, 2, 1], // bottom
            [0, 1, 3], // front
            [1, 2, 3], // right
            [2, 0, 3], // left
        ];

        let mesh = Mesh::new(positions, triangles);
        let params = UnwrapParams::default().with_min_island_faces(1);
        let (unwrapped, result) = unwrap(&mesh, &params).unwrap();

        // Closed and connected: one chart, no boundary
        assert_eq!(result.num_charts, 1);
        assert_eq!(result.charts[0].status, ChartStatus::Parameterized);
        assert!(build_topology(&mesh).is_closed());

        let uvs = unwrapped.uvs.unwrap();
        assert_eq!(uvs.len(), 4);
        assert!(uvs.is_finite());
    }
}
