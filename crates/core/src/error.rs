//! Error types for scatterfill

use thiserror::Error;

/// Main error type for scatterfill operations
#[derive(Error, Debug)]
pub enum Error {
    /// Value array does not carry one row per source point.
    #[error("Shape mismatch in {context}: expected {expected} source rows, got {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        context: &'static str,
    },

    /// Coordinate input has more structural axes than (points, dims).
    #[error("Cannot normalize coordinates with {ndim} structural dimensions (at most 2 supported)")]
    CoordinateRank { ndim: usize },

    #[error("Coordinate axis {axis} has {actual} points, expected {expected}")]
    UnequalAxes {
        axis: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Coordinate dimensionality mismatch: sources are {source_dim}-D, targets are {target_dim}-D")]
    DimensionMismatch { source_dim: usize, target_dim: usize },

    /// Missing-value handling is only defined for values of rank <= 2.
    #[error("Values of rank {ndim} containing non-finite entries are not supported")]
    UnsupportedRank { ndim: usize },

    #[error("{context} requires at least {required} points, got {actual}")]
    InsufficientPoints {
        required: usize,
        actual: usize,
        context: &'static str,
    },

    #[error("{context} does not support {dim}-D coordinates")]
    UnsupportedDimension { dim: usize, context: &'static str },

    #[error("Field size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Index out of bounds: ({row}, {col}) in field of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid covariance model: {0}")]
    Parse(String),

    #[error("Array shape error: {0}")]
    Array(#[from] ndarray::ShapeError),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error reports an array or coordinate shape violation.
    pub fn is_shape_error(&self) -> bool {
        matches!(
            self,
            Error::ShapeMismatch { .. }
                | Error::CoordinateRank { .. }
                | Error::UnequalAxes { .. }
                | Error::DimensionMismatch { .. }
                | Error::SizeMismatch { .. }
                | Error::Array(_)
        )
    }
}

/// Result type alias for scatterfill operations
pub type Result<T> = std::result::Result<T, Error>;
