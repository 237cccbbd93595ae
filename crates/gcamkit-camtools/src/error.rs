//! Error types for the CAM tools crate.

use thiserror::Error;

/// A toolpath cannot be planned from the given parameters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CamToolError {
    #[error("{name} must not be negative (got {value})")]
    Negative { name: &'static str, value: f64 },

    #[error("{name} must be positive (got {value})")]
    NotPositive { name: &'static str, value: f64 },

    /// A target depth lies above the surface it is cut from.
    #[error("{name} {value} is above the surface at {surface}")]
    AboveSurface {
        name: &'static str,
        value: f64,
        surface: f64,
    },
}

/// Result type alias for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;
