//! The stages of the unwrapping pipeline.
//!
//! Each stage lives in its own module and can be driven on its own:
//!
//! - **Seams**: spanning-tree seam selection on the dual graph, with an
//!   optional curvature refinement pass
//! - **Islands**: connected chart extraction across non-seam edges
//! - **Parameterization**: per-chart Least Squares Conformal Maps
//! - **Packing**: shelf packing of charts into the unit square
//! - **Metrics**: placeholder and exact quality statistics
//!
//! [`crate::unwrap::unwrap`] runs them in order and reports through an
//! [`Observer`].

pub mod islands;
pub mod metrics;
pub mod pack;
pub mod parameterize;
pub mod seams;

mod observer;

pub use observer::{Event, Observer, Stage};
