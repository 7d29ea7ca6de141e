//! Progress and diagnostic reporting for the unwrap pipeline.
//!
//! The pipeline never prints. Instead it hands structured [`Event`]s to an
//! [`Observer`] supplied by the caller, in addition to the `log` records it
//! emits.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use chartwise::algo::{Event, Observer};
//!
//! let charts = Arc::new(Mutex::new(0));
//! let seen = charts.clone();
//! let observer = Observer::new(move |event| {
//!     if let Event::Charts { count } = event {
//!         *seen.lock().unwrap() = *count;
//!     }
//! });
//!
//! observer.notify(&Event::Charts { count: 3 });
//! assert_eq!(*charts.lock().unwrap(), 3);
//! ```

use std::fmt;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Building the edge topology.
    Topology,
    /// Selecting seam edges.
    Seams,
    /// Extracting charts.
    Islands,
    /// Parameterizing charts.
    Parameterize,
    /// Packing charts into the unit square.
    Pack,
    /// Filling in the result metrics.
    Metrics,
}

impl Stage {
    /// Number of stages in a full run.
    pub const COUNT: usize = 6;

    /// Zero-based position of the stage.
    pub fn index(self) -> usize {
        match self {
            Stage::Topology => 0,
            Stage::Seams => 1,
            Stage::Islands => 2,
            Stage::Parameterize => 3,
            Stage::Pack => 4,
            Stage::Metrics => 5,
        }
    }

    /// Human-readable description.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Topology => "Building topology",
            Stage::Seams => "Selecting seams",
            Stage::Islands => "Extracting charts",
            Stage::Parameterize => "Parameterizing charts",
            Stage::Pack => "Packing charts",
            Stage::Metrics => "Computing metrics",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Something that happened during an unwrap.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A stage started.
    Stage {
        /// The stage.
        stage: Stage,
        /// Zero-based stage index.
        index: usize,
        /// Total number of stages.
        total: usize,
    },
    /// Topology was built.
    Topology {
        /// Vertex count.
        vertices: usize,
        /// Edge count.
        edges: usize,
        /// Face count.
        faces: usize,
        /// V - E + F.
        euler: i64,
        /// Number of boundary edges.
        boundary_edges: usize,
    },
    /// Seams were selected.
    Seams {
        /// Non-tree interior edges considered.
        candidates: usize,
        /// Edges chosen as seams.
        selected: usize,
        /// Whether the mesh had no boundary.
        closed: bool,
    },
    /// Charts were extracted.
    Charts {
        /// Number of charts.
        count: usize,
    },
    /// A chart was below the minimum face count and left unparameterized.
    ChartSkipped {
        /// Chart id.
        chart: usize,
        /// Face count.
        faces: usize,
    },
    /// A chart failed to parameterize.
    ChartFailed {
        /// Chart id.
        chart: usize,
        /// Rendered error.
        error: String,
    },
    /// A chart was parameterized.
    ChartParameterized {
        /// Chart id.
        chart: usize,
        /// Distinct vertices in the chart.
        vertices: usize,
    },
    /// Charts were packed.
    Packed {
        /// Number of charts placed.
        charts: usize,
        /// Packed extent before rescaling.
        width: f64,
        /// Packed extent before rescaling.
        height: f64,
    },
}

/// A callback that receives [`Event`]s during an unwrap.
pub struct Observer {
    callback: Box<dyn Fn(&Event) + Send + Sync>,
}

impl Observer {
    /// Create a new observer with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Deliver an event.
    #[inline]
    pub fn notify(&self, event: &Event) {
        (self.callback)(event);
    }

    /// Report the start of a stage.
    #[inline]
    pub fn stage(&self, stage: Stage) {
        self.notify(&Event::Stage {
            stage,
            index: stage.index(),
            total: Stage::COUNT,
        });
    }

    /// Create a no-op observer that discards all events.
    pub fn none() -> Self {
        Self::new(|_| {})
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_stage_events_carry_position() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let observer = Observer::new(move |e| sink.lock().unwrap().push(e.clone()));

        observer.stage(Stage::Pack);

        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            Event::Stage {
                stage: Stage::Pack,
                index: 4,
                total: 6
            }
        );
    }

    #[test]
    fn test_none_discards() {
        let observer = Observer::default();
        observer.notify(&Event::Charts { count: 1 });
        assert_eq!(format!("{:?}", observer), "Observer { .. }");
    }
}
