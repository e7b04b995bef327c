//! Scattered-data interpolation
//!
//! Interpolate values attached to scattered N-D source points onto an
//! arbitrary set of target points:
//! - Nearest Neighbor: value row of the closest source
//! - IDW: Inverse Distance Weighting over the k nearest sources
//! - Linear: barycentric interpolation over a triangulation (1-D and 2-D)
//!
//! Interpolators are built once per (sources, targets) pair and evaluated
//! any number of times against value arrays whose first axis runs over the
//! sources. On top of them sit the NaN-tolerant driver
//! ([`interpolate_with_missing`]) and the polar clutter filler
//! ([`fill_masked_polar`]).

pub mod covariance;
mod driver;
mod idw;
pub mod kdtree;
mod linear;
mod method;
mod nearest;
mod polar;
mod triangulation;

pub use covariance::{parse_covariogram, CovarianceComponent, CovarianceFunction, CovarianceModel};
pub use driver::interpolate_with_missing;
pub use idw::{IdwInterpolator, IdwParams, WeightedQueryResult, COINCIDENCE_TOLERANCE};
pub use kdtree::{KdTree, Neighbor, NeighborTable};
pub use linear::{LinearInterpolator, LinearParams};
pub use method::{Interpolator, Method};
pub use nearest::{NearestInterpolator, NearestParams};
pub use polar::{fill_masked_polar, polar_bin_centers};
pub use triangulation::LinearNd;

use ndarray::{Array, ArrayBase, CowArray, Data, Dimension, Ix2};
use scatterfill_core::{Error, Result};

/// View `values` as a (rows × channels) matrix, flattening the trailing
/// axes in logical order.
///
/// # Errors
/// `ShapeMismatch` if `values` is 0-D or its first axis is not `expected`.
pub(crate) fn value_rows<'a, S, D>(
    values: &'a ArrayBase<S, D>,
    expected: usize,
    context: &'static str,
) -> Result<CowArray<'a, f64, Ix2>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let shape = values.shape();
    let Some((&rows, trailing)) = shape.split_first() else {
        return Err(Error::ShapeMismatch {
            expected,
            actual: 0,
            context,
        });
    };
    if rows != expected {
        return Err(Error::ShapeMismatch {
            expected,
            actual: rows,
            context,
        });
    }

    let channels = trailing.iter().product::<usize>();
    Ok(values.to_shape((rows, channels))?)
}

/// Reassemble row-major `(n_targets × channels)` data into the dimension
/// of the value array it was computed from.
pub(crate) fn output_from_rows<D: Dimension>(
    mut dim: D,
    n_targets: usize,
    data: Vec<f64>,
) -> Result<Array<f64, D>> {
    dim[0] = n_targets;
    Ok(Array::from_shape_vec(dim, data)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr0, arr1, Array3};

    #[test]
    fn test_value_rows_flattens_trailing_axes() {
        let values = Array3::from_shape_fn((2, 3, 4), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        let rows = value_rows(&values, 2, "test").unwrap();
        assert_eq!(rows.dim(), (2, 12));
        assert_eq!(rows[(1, 5)], 111.0);
    }

    #[test]
    fn test_value_rows_one_dimensional() {
        let values = arr1(&[1.0, 2.0, 3.0]);
        let rows = value_rows(&values, 3, "test").unwrap();
        assert_eq!(rows.dim(), (3, 1));
    }

    #[test]
    fn test_value_rows_rejects_scalar_and_wrong_length() {
        assert!(matches!(
            value_rows(&arr0(1.0), 1, "test"),
            Err(Error::ShapeMismatch { actual: 0, .. })
        ));
        assert!(matches!(
            value_rows(&arr1(&[1.0, 2.0]), 3, "test"),
            Err(Error::ShapeMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_output_from_rows_resizes_first_axis() {
        let values = Array3::<f64>::zeros((5, 2, 2));
        let out = output_from_rows(values.raw_dim(), 3, (0..12).map(|v| v as f64).collect()).unwrap();
        assert_eq!(out.shape(), &[3, 2, 2]);
        assert_eq!(out[(2, 1, 1)], 11.0);
    }
}
