//! Nearest Neighbor interpolation
//!
//! Assigns each target point the value row of the closest source point.
//! Fast and simple, produces a Voronoi-like tessellation. Of two
//! equidistant sources the lower-indexed one is used.

use ndarray::{Array, ArrayBase, Data, Dimension};
use scatterfill_core::{CoordinateSet, IntoCoordinates, Result};

use super::kdtree::KdTree;
use super::{output_from_rows, value_rows};

/// Evaluation options for nearest-neighbor interpolation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NearestParams {
    /// Maximum distance to the nearest source. Targets farther away
    /// receive NaN. `None` for unlimited.
    pub max_distance: Option<f64>,
}

/// Nearest-neighbor interpolator between fixed source and target sets.
///
/// The nearest source of every target is found once at construction;
/// evaluation is a pure row gather.
#[derive(Debug, Clone)]
pub struct NearestInterpolator {
    num_sources: usize,
    /// Distance to the nearest source, infinite if there is none
    distances: Vec<f64>,
    /// Index of the nearest source, `num_sources` if there is none
    indices: Vec<usize>,
}

impl NearestInterpolator {
    /// Build the interpolator from source and target coordinates.
    pub fn new(sources: impl IntoCoordinates, targets: impl IntoCoordinates) -> Result<Self> {
        let sources = sources.into_coordinates()?;
        let targets = targets.into_coordinates()?;
        Self::from_sets(&sources, &targets)
    }

    pub(crate) fn from_sets(sources: &CoordinateSet, targets: &CoordinateSet) -> Result<Self> {
        sources.ensure_same_dim(targets)?;

        let tree = KdTree::build(sources);
        let table = tree.query(targets, 1);

        Ok(Self {
            num_sources: sources.len(),
            distances: table.distances().column(0).to_vec(),
            indices: table.indices().column(0).to_vec(),
        })
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn num_targets(&self) -> usize {
        self.indices.len()
    }

    /// Distance from each target to its nearest source
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Index of each target's nearest source
    pub fn nearest_indices(&self) -> &[usize] {
        &self.indices
    }

    /// Interpolate `values` (one row per source point) onto the targets.
    ///
    /// The output keeps the trailing shape of `values`, with the first
    /// axis resized to the number of targets. Targets without any source,
    /// or farther than `max_distance` from it, receive NaN.
    ///
    /// # Errors
    /// `ShapeMismatch` if `values` does not have one row per source.
    pub fn evaluate<S, D>(
        &self,
        values: &ArrayBase<S, D>,
        max_distance: Option<f64>,
    ) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let rows = value_rows(values, self.num_sources, "nearest-neighbor evaluation")?;
        let channels = rows.ncols();

        let mut out = Vec::with_capacity(self.num_targets() * channels);
        for (&ix, &dist) in self.indices.iter().zip(&self.distances) {
            let too_far = max_distance.is_some_and(|max| dist > max);
            if ix >= self.num_sources || too_far {
                out.extend(std::iter::repeat(f64::NAN).take(channels));
            } else {
                out.extend(rows.row(ix).iter().copied());
            }
        }

        output_from_rows(values.raw_dim(), self.num_targets(), out)
    }
}
