//! Piecewise-linear (barycentric) interpolation
//!
//! Uniform construct-once/evaluate-many wrapper around [`LinearNd`].
//! The triangulation needs the values, so it is rebuilt on every
//! evaluation; construction only normalizes and stores the coordinates.

use ndarray::{Array, ArrayBase, Data, Dimension};
use scatterfill_core::{CoordinateSet, Error, IntoCoordinates, Result};

use super::triangulation::LinearNd;
use super::{output_from_rows, value_rows};

/// Evaluation options for linear interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinearParams {
    /// Value assigned to targets outside the convex hull of the sources
    /// (default: NaN)
    pub fill_value: f64,
}

impl Default for LinearParams {
    fn default() -> Self {
        Self {
            fill_value: f64::NAN,
        }
    }
}

/// Linear interpolator between fixed source and target sets.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    sources: CoordinateSet,
    targets: CoordinateSet,
}

impl LinearInterpolator {
    /// Store normalized source and target coordinates.
    ///
    /// # Errors
    /// `UnsupportedDimension` for coordinates with more than two dimensions.
    pub fn new(sources: impl IntoCoordinates, targets: impl IntoCoordinates) -> Result<Self> {
        Self::from_sets(sources.into_coordinates()?, targets.into_coordinates()?)
    }

    pub(crate) fn from_sets(sources: CoordinateSet, targets: CoordinateSet) -> Result<Self> {
        sources.ensure_same_dim(&targets)?;
        let dim = if sources.is_empty() {
            targets.dim()
        } else {
            sources.dim()
        };
        if dim > 2 {
            return Err(Error::UnsupportedDimension {
                dim,
                context: "linear interpolation",
            });
        }

        Ok(Self { sources, targets })
    }

    pub fn num_sources(&self) -> usize {
        self.sources.len()
    }

    pub fn num_targets(&self) -> usize {
        self.targets.len()
    }

    /// Interpolate `values` (one row per source point) onto the targets.
    ///
    /// Targets outside the convex hull of the sources receive `fill_value`.
    /// The output keeps the trailing shape of `values`.
    ///
    /// # Errors
    /// `ShapeMismatch` if `values` does not have one row per source.
    pub fn evaluate<S, D>(&self, values: &ArrayBase<S, D>, fill_value: f64) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let rows = value_rows(values, self.sources.len(), "linear evaluation")?;
        let interpolant = LinearNd::new(&self.sources, rows.view(), fill_value)?;
        let out = interpolant.evaluate(&self.targets)?;

        output_from_rows(values.raw_dim(), self.num_targets(), out.iter().copied().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{arr1, arr2, Array3};

    fn triangle_sources() -> CoordinateSet {
        CoordinateSet::from_points(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0]])
    }

    #[test]
    fn test_linear_inside_triangle() {
        let ip = LinearInterpolator::new(triangle_sources(), arr2(&[[2.0, 3.0]])).unwrap();
        // z = 1 + x - y on the vertices
        let out = ip.evaluate(&arr1(&[1.0, 11.0, -9.0]), f64::NAN).unwrap();
        assert_relative_eq!(out[0], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_linear_fill_value_outside_hull() {
        let ip = LinearInterpolator::new(triangle_sources(), arr2(&[[9.0, 9.0], [1.0, 1.0]]))
            .unwrap();
        let values = arr1(&[1.0, 2.0, 3.0]);

        let out = ip.evaluate(&values, f64::NAN).unwrap();
        assert!(out[0].is_nan());
        assert!(out[1].is_finite());

        let out = ip.evaluate(&values, -99.0).unwrap();
        assert_eq!(out[0], -99.0);
    }

    #[test]
    fn test_linear_preserves_trailing_shape() {
        let ip = LinearInterpolator::new(triangle_sources(), arr2(&[[0.0, 0.0], [5.0, 5.0]]))
            .unwrap();
        let values = Array3::from_shape_fn((3, 2, 2), |(s, i, j)| (s + i + j) as f64);
        let out = ip.evaluate(&values, f64::NAN).unwrap();
        assert_eq!(out.shape(), &[2, 2, 2]);
        assert_relative_eq!(out[(0, 1, 1)], 2.0, epsilon = 1e-12);
        // midpoint of the hypotenuse: mean of sources 1 and 2
        assert_relative_eq!(out[(1, 0, 0)], 1.5, epsilon = 1e-10);
    }

    #[test]
    fn test_linear_one_dimensional_flat_coords() {
        let ip = LinearInterpolator::new(arr1(&[0.0, 1.0, 2.0]), arr1(&[0.25, 1.5])).unwrap();
        let out = ip.evaluate(&arr1(&[0.0, 4.0, 8.0]), f64::NAN).unwrap();
        assert_relative_eq!(out[0], 1.0);
        assert_relative_eq!(out[1], 6.0);
    }

    #[test]
    fn test_linear_rejects_three_dimensions() {
        let err = LinearInterpolator::new(
            arr2(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]),
            arr2(&[[0.5, 0.0, 0.0]]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnsupportedDimension { dim: 3, .. }));
    }

    #[test]
    fn test_linear_shape_mismatch() {
        let ip = LinearInterpolator::new(triangle_sources(), arr2(&[[1.0, 1.0]])).unwrap();
        assert!(matches!(
            ip.evaluate(&arr1(&[1.0]), f64::NAN),
            Err(Error::ShapeMismatch { expected: 3, actual: 1, .. })
        ));
    }
}
