//! Error types for chartwise.
//!
//! Input validation failures abort an unwrap before any work is done.
//! Per-chart failures ([`UnwrapError::ChartTooSmall`], the solver variants)
//! are caught by the pipeline, which carries on with the remaining charts.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`UnwrapError`].
pub type Result<T> = std::result::Result<T, UnwrapError>;

/// Errors that can occur while unwrapping a mesh.
#[derive(Error, Debug)]
pub enum UnwrapError {
    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// A chart has too few vertices to parameterize.
    #[error("chart has only {vertices} vertices")]
    ChartTooSmall {
        /// Number of distinct vertices in the chart.
        vertices: usize,
    },

    /// The two pinned vertices coincide, leaving scale and rotation free.
    #[error("pinned vertices coincide")]
    DegeneratePins,

    /// Every triangle of a chart has (near) zero area.
    #[error("chart has no triangle with positive area")]
    DegenerateChart,

    /// The conjugate gradient iteration hit a non-positive curvature direction.
    #[error("linear system is singular or indefinite (breakdown at iteration {iteration})")]
    SolverBreakdown {
        /// Iteration at which the breakdown was detected.
        iteration: usize,
    },

    /// Algorithm failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// The solver produced NaN or infinite coordinates.
    #[error("solver produced non-finite coordinates")]
    NonFiniteSolution,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl UnwrapError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        UnwrapError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Whether this error is confined to a single chart.
    ///
    /// The pipeline skips the chart and continues when this returns `true`.
    pub fn is_chart_local(&self) -> bool {
        matches!(
            self,
            UnwrapError::ChartTooSmall { .. }
                | UnwrapError::DegeneratePins
                | UnwrapError::DegenerateChart
                | UnwrapError::SolverBreakdown { .. }
                | UnwrapError::ConvergenceFailed { .. }
                | UnwrapError::NonFiniteSolution
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_param_message() {
        let err = UnwrapError::invalid_param("island_margin", -0.5, "must be non-negative");
        assert_eq!(
            err.to_string(),
            "invalid parameter: island_margin = -0.5 (must be non-negative)"
        );
    }

    #[test]
    fn test_chart_local_classification() {
        assert!(UnwrapError::DegeneratePins.is_chart_local());
        assert!(UnwrapError::ConvergenceFailed { iterations: 10 }.is_chart_local());
        assert!(!UnwrapError::InvalidVertexIndex { face: 3, vertex: 9 }.is_chart_local());
    }
}
