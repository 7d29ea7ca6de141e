//! Conformal parameterization of charts.
//!
//! Each chart produced by [`crate::algo::islands`] is flattened on its own
//! with Least Squares Conformal Maps, which minimizes angle distortion. The
//! solver works in a dense chart-local index space and returns coordinates
//! that the caller copies into the mesh-wide [`UVMap`].
//!
//! # Available Algorithms
//!
//! - [`lscm`]: Least Squares Conformal Maps - minimizes angle distortion
//!
//! Closed charts are accepted: when a chart has no boundary the pins fall
//! back to its first vertex and the vertex farthest from it.
//!
//! # Example
//!
//! ```
//! use chartwise::algo::parameterize::{lscm, LscmOptions, UVMap};
//! use chartwise::mesh::primitives;
//!
//! let mesh = primitives::grid(2);
//! let faces: Vec<usize> = (0..mesh.num_faces()).collect();
//!
//! // Compute LSCM parameterization
//! let chart = lscm(&mesh, &faces, &LscmOptions::default()).unwrap();
//!
//! // Copy into a mesh-wide map
//! let mut uvs = UVMap::zeros(mesh.num_vertices());
//! chart.write_into(&mut uvs);
//! for (v, uv) in uvs.iter() {
//!     println!("Vertex {}: u={:.3}, v={:.3}", v, uv.x, uv.y);
//! }
//! ```

mod lscm;
mod sparse;
mod uv;

pub use lscm::{
    lscm, ChartParameterization, LscmOptions, PinStrategy, PinnedVertex, MIN_TRIANGLE_AREA,
};
pub use sparse::{conjugate_gradient, CsrMatrix};
pub use uv::UVMap;
