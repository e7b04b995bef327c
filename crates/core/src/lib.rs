//! # scatterfill core
//!
//! Core types shared by the scatterfill interpolation algorithms.
//!
//! This crate provides:
//! - `CoordinateSet`: canonical (points × dims) coordinate storage
//! - `PolarField<T>`: azimuth × range field with an optional clutter mask
//! - `Error`/`Result`: the error taxonomy of every public operation

pub mod coords;
pub mod error;
pub mod field;

pub use coords::{CoordinateSet, IntoCoordinates};
pub use error::{Error, Result};
pub use field::{FieldElement, PolarField};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::coords::{CoordinateSet, IntoCoordinates};
    pub use crate::error::{Error, Result};
    pub use crate::field::{FieldElement, PolarField};
}
