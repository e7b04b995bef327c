//! # scatterfill algorithms
//!
//! Interpolation of values attached to scattered points.
//!
//! ## Available components
//!
//! - **interpolation**: nearest neighbor, inverse distance weighting and
//!   linear (triangulation based) interpolators, the NaN-tolerant driver
//!   and clutter filling for polar fields
//! - **interpolation::covariance**: covariance models parsed from text
//!
//! ```
//! use ndarray::{arr1, arr2};
//! use scatterfill_algorithms::prelude::*;
//!
//! let ip = Method::InverseDistance(IdwParams { k: 2, power: 1.0 })
//!     .build(arr2(&[[0.0], [10.0]]), arr2(&[[5.0]]))
//!     .unwrap();
//! let out = ip.evaluate(&arr1(&[0.0, 100.0])).unwrap();
//! assert!((out[0] - 50.0).abs() < 1e-12);
//! ```

pub mod interpolation;
mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::interpolation::{
        fill_masked_polar, interpolate_with_missing, parse_covariogram, IdwInterpolator,
        IdwParams, Interpolator, LinearInterpolator, LinearParams, Method, NearestInterpolator,
        NearestParams,
    };
    pub use scatterfill_core::prelude::*;
}
