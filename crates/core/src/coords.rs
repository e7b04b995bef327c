//! Canonical coordinate sets
//!
//! Every interpolator works on points stored as an (N points × D dims)
//! table. Callers may hand over coordinates in several shapes:
//! - a single `(N, D)` array
//! - a flat `(N,)` array, treated as one-dimensional points
//! - one flat array per axis (`D` arrays of `N` values each)
//!
//! All of them are normalized into a [`CoordinateSet`] before any spatial
//! computation happens.

use ndarray::{Array2, ArrayBase, Data, Dimension};

use crate::error::{Error, Result};

/// An immutable set of N points in D dimensions.
///
/// Points are stored contiguously in row-major order, so each point is
/// available as a plain `&[f64]` slice.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateSet {
    data: Vec<f64>,
    len: usize,
    dim: usize,
}

impl CoordinateSet {
    /// Normalize a single coordinate array.
    ///
    /// `(N,)` arrays become `(N, 1)`; `(N, D)` arrays are copied as is.
    /// Anything with more than two axes is rejected.
    pub fn from_array<S, D>(coords: &ArrayBase<S, D>) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        match coords.ndim() {
            1 => Ok(Self {
                data: coords.iter().copied().collect(),
                len: coords.len(),
                dim: 1,
            }),
            2 => {
                let shape = coords.shape();
                let (len, dim) = (shape[0], shape[1]);
                if dim == 0 && len > 0 {
                    return Err(Error::InvalidParameter {
                        name: "coords",
                        value: format!("({len}, 0)"),
                        reason: "points must have at least one dimension".into(),
                    });
                }
                // iter() walks in logical row-major order regardless of memory layout
                Ok(Self {
                    data: coords.iter().copied().collect(),
                    len,
                    dim,
                })
            }
            ndim => Err(Error::CoordinateRank { ndim }),
        }
    }

    /// Normalize a sequence of per-axis arrays, one per dimension.
    ///
    /// Each axis array is flattened; all of them must hold the same number
    /// of values.
    pub fn from_axes<S, D>(axes: &[ArrayBase<S, D>]) -> Result<Self>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let Some(first) = axes.first() else {
            return Err(Error::InvalidParameter {
                name: "axes",
                value: "[]".into(),
                reason: "at least one coordinate axis is required".into(),
            });
        };

        let len = first.len();
        for (axis, values) in axes.iter().enumerate() {
            if values.len() != len {
                return Err(Error::UnequalAxes {
                    axis,
                    expected: len,
                    actual: values.len(),
                });
            }
        }

        let dim = axes.len();
        let mut data = vec![0.0; len * dim];
        for (axis, values) in axes.iter().enumerate() {
            for (i, &v) in values.iter().enumerate() {
                data[i * dim + axis] = v;
            }
        }

        Ok(Self { data, len, dim })
    }

    /// Build a set from fixed-size points.
    pub fn from_points<const D: usize>(points: &[[f64; D]]) -> Self {
        Self {
            data: points.iter().flat_map(|p| p.iter().copied()).collect(),
            len: points.len(),
            dim: D,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the set holds no points.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of dimensions per point.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn point(&self, i: usize) -> &[f64] {
        &self.data[i * self.dim..(i + 1) * self.dim]
    }

    /// Iterate over all points in order.
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.len).map(move |i| self.point(i))
    }

    /// New set containing only the points at `indices`, in that order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.dim);
        for &i in indices {
            data.extend_from_slice(self.point(i));
        }
        Self {
            data,
            len: indices.len(),
            dim: self.dim,
        }
    }

    /// Copy the points into an `(N, D)` array.
    pub fn to_array(&self) -> Array2<f64> {
        Array2::from_shape_fn((self.len, self.dim), |(i, j)| self.data[i * self.dim + j])
    }

    /// Fail unless `other` has the same dimensionality.
    ///
    /// Empty sets are compatible with anything.
    pub fn ensure_same_dim(&self, other: &CoordinateSet) -> Result<()> {
        if self.is_empty() || other.is_empty() || self.dim == other.dim {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                source_dim: self.dim,
                target_dim: other.dim,
            })
        }
    }
}

/// Conversion into a normalized [`CoordinateSet`].
///
/// Implemented for coordinate sets themselves, for any `f64` ndarray
/// (subject to the rank rules of [`CoordinateSet::from_array`]) and for
/// sequences of per-axis arrays.
pub trait IntoCoordinates {
    fn into_coordinates(self) -> Result<CoordinateSet>;
}

impl IntoCoordinates for CoordinateSet {
    fn into_coordinates(self) -> Result<CoordinateSet> {
        Ok(self)
    }
}

impl IntoCoordinates for &CoordinateSet {
    fn into_coordinates(self) -> Result<CoordinateSet> {
        Ok(self.clone())
    }
}

impl<S, D> IntoCoordinates for ArrayBase<S, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn into_coordinates(self) -> Result<CoordinateSet> {
        CoordinateSet::from_array(&self)
    }
}

impl<S, D> IntoCoordinates for &ArrayBase<S, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn into_coordinates(self) -> Result<CoordinateSet> {
        CoordinateSet::from_array(self)
    }
}

impl<S, D> IntoCoordinates for Vec<ArrayBase<S, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn into_coordinates(self) -> Result<CoordinateSet> {
        CoordinateSet::from_axes(&self)
    }
}

impl<S, D> IntoCoordinates for &[ArrayBase<S, D>]
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    fn into_coordinates(self) -> Result<CoordinateSet> {
        CoordinateSet::from_axes(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array3};

    #[test]
    fn test_flat_array_is_one_dimensional() {
        let set = CoordinateSet::from_array(&arr1(&[0.0, 1.0, 2.0])).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.dim(), 1);
        assert_eq!(set.point(2), &[2.0]);
    }

    #[test]
    fn test_two_dimensional_array() {
        let set = CoordinateSet::from_array(&arr2(&[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]])).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.dim(), 2);
        assert_eq!(set.point(1), &[2.0, 3.0]);
    }

    #[test]
    fn test_transposed_layout_keeps_logical_order() {
        let a = arr2(&[[0.0, 10.0, 20.0], [1.0, 11.0, 21.0]]);
        let set = CoordinateSet::from_array(&a.t()).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.point(1), &[10.0, 11.0]);
    }

    #[test]
    fn test_three_dimensional_array_rejected() {
        let a = Array3::<f64>::zeros((2, 2, 2));
        let err = CoordinateSet::from_array(&a).unwrap_err();
        assert!(matches!(err, Error::CoordinateRank { ndim: 3 }));
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_from_axes_equals_from_array() {
        let x = arr1(&[0.0, 1.0, 2.0]);
        let y = arr1(&[5.0, 6.0, 7.0]);
        let by_axes = CoordinateSet::from_axes(&[x, y]).unwrap();
        let by_array =
            CoordinateSet::from_array(&arr2(&[[0.0, 5.0], [1.0, 6.0], [2.0, 7.0]])).unwrap();
        assert_eq!(by_axes, by_array);
    }

    #[test]
    fn test_from_axes_flattens_grids() {
        let x = arr2(&[[0.0, 1.0], [0.0, 1.0]]);
        let y = arr2(&[[0.0, 0.0], [1.0, 1.0]]);
        let set = vec![x, y].into_coordinates().unwrap();
        assert_eq!(set.len(), 4);
        assert_eq!(set.point(3), &[1.0, 1.0]);
    }

    #[test]
    fn test_from_axes_unequal_lengths() {
        let err = CoordinateSet::from_axes(&[arr1(&[0.0, 1.0]), arr1(&[0.0])]).unwrap_err();
        assert!(matches!(
            err,
            Error::UnequalAxes { axis: 1, expected: 2, actual: 1 }
        ));
    }

    #[test]
    fn test_select_and_to_array() {
        let set = CoordinateSet::from_points(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        let sub = set.select(&[2, 0]);
        assert_eq!(sub.len(), 2);
        assert_eq!(sub.to_array(), arr2(&[[2.0, 2.0], [0.0, 0.0]]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = CoordinateSet::from_points(&[[0.0, 0.0]]);
        let b = CoordinateSet::from_points(&[[0.0]]);
        assert!(a.ensure_same_dim(&b).is_err());
        assert!(a.ensure_same_dim(&CoordinateSet::from_points::<1>(&[])).is_ok());
    }
}
