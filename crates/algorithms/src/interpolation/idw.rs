//! Inverse Distance Weighting (IDW) interpolation
//!
//! Estimates values at target locations as a weighted average of the
//! nearest source points, where weights are inversely proportional to
//! distance raised to a power parameter.
//!
//! Reference:
//! Shepard, D. (1968). A two-dimensional interpolation function for
//! irregularly-spaced data. ACM National Conference.

use ndarray::{Array, ArrayBase, Data, Dimension};
use scatterfill_core::{CoordinateSet, Error, IntoCoordinates, Result};

use super::kdtree::{KdTree, NeighborTable};
use super::{output_from_rows, value_rows};
use crate::maybe_rayon::*;

/// Distance below which a target is treated as coincident with a source
pub const COINCIDENCE_TOLERANCE: f64 = 1e-10;

/// Parameters for IDW interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdwParams {
    /// Maximum number of nearest sources used per target (default: 4)
    pub k: usize,
    /// Power parameter (default: 2.0).
    /// Higher values give more weight to nearby points.
    pub power: f64,
}

impl Default for IdwParams {
    fn default() -> Self {
        Self { k: 4, power: 2.0 }
    }
}

/// Source indices and normalized weights that make up one target value.
///
/// Weights are non-negative and sum to 1. A target without any reachable
/// source has no entries.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WeightedQueryResult {
    pub indices: Vec<usize>,
    pub weights: Vec<f64>,
}

impl WeightedQueryResult {
    fn single(index: usize) -> Self {
        Self {
            indices: vec![index],
            weights: vec![1.0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Inverse-distance-weighting interpolator between fixed source and
/// target sets.
///
/// Neighbor search and weighting happen once at construction; every
/// evaluation is a sparse matrix-vector product over the value rows.
#[derive(Debug, Clone)]
pub struct IdwInterpolator {
    num_sources: usize,
    params: IdwParams,
    weights: Vec<WeightedQueryResult>,
}

impl IdwInterpolator {
    /// Build the interpolator from source and target coordinates.
    ///
    /// # Errors
    /// `InvalidParameter` if `k == 0` or `power` is not finite.
    pub fn new(
        sources: impl IntoCoordinates,
        targets: impl IntoCoordinates,
        params: IdwParams,
    ) -> Result<Self> {
        let sources = sources.into_coordinates()?;
        let targets = targets.into_coordinates()?;
        Self::from_sets(&sources, &targets, params)
    }

    pub(crate) fn from_sets(
        sources: &CoordinateSet,
        targets: &CoordinateSet,
        params: IdwParams,
    ) -> Result<Self> {
        if params.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                value: "0".into(),
                reason: "at least one neighbor is required".into(),
            });
        }
        if !params.power.is_finite() {
            return Err(Error::InvalidParameter {
                name: "power",
                value: params.power.to_string(),
                reason: "must be finite".into(),
            });
        }
        sources.ensure_same_dim(targets)?;

        let tree = KdTree::build(sources);
        let table = tree.query(targets, params.k);
        let weights = compute_weights(&table, params);

        Ok(Self {
            num_sources: sources.len(),
            params,
            weights,
        })
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    pub fn num_targets(&self) -> usize {
        self.weights.len()
    }

    pub fn params(&self) -> IdwParams {
        self.params
    }

    /// The neighbor weights used for every target
    pub fn weights(&self) -> &[WeightedQueryResult] {
        &self.weights
    }

    /// Interpolate `values` (one row per source point) onto the targets.
    ///
    /// # Algorithm
    ///
    /// For each target with neighbors at distances d₁ ≤ d₂ ≤ … ≤ dₖ:
    ///
    /// ```text
    /// k == 1          → z = z₁
    /// d₁ < 1e-10      → z = z₁                  (coincident point)
    /// otherwise       → z = Σ(wᵢ·zᵢ) / Σwᵢ,  wᵢ = 1 / dᵢ^p
    /// ```
    ///
    /// Targets without any source receive NaN. The output keeps the
    /// trailing shape of `values`.
    ///
    /// # Errors
    /// `ShapeMismatch` if `values` does not have one row per source.
    pub fn evaluate<S, D>(&self, values: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let rows = value_rows(values, self.num_sources, "IDW evaluation")?;
        let rows = rows.view();
        let channels = rows.ncols();

        let data: Vec<f64> = (0..self.num_targets())
            .into_par_iter()
            .flat_map(|t| {
                let wq = &self.weights[t];
                if wq.is_empty() {
                    return vec![f64::NAN; channels];
                }
                if let [ix] = wq.indices.as_slice() {
                    return rows.row(*ix).to_vec();
                }

                let mut acc = vec![0.0; channels];
                for (&ix, &w) in wq.indices.iter().zip(&wq.weights) {
                    for (a, &v) in acc.iter_mut().zip(rows.row(ix)) {
                        *a += w * v;
                    }
                }
                acc
            })
            .collect();

        output_from_rows(values.raw_dim(), self.num_targets(), data)
    }
}

/// Turn neighbor distances into normalized weights, one target at a time.
fn compute_weights(table: &NeighborTable, params: IdwParams) -> Vec<WeightedQueryResult> {
    (0..table.num_targets())
        .into_par_iter()
        .map(|t| {
            let neighbors = table.valid(t);
            let Some(&(nearest_dist, nearest_ix)) = neighbors.first() else {
                return WeightedQueryResult::default();
            };

            if params.k == 1 || nearest_dist < COINCIDENCE_TOLERANCE {
                return WeightedQueryResult::single(nearest_ix);
            }

            let raw: Vec<f64> = neighbors
                .iter()
                .map(|&(d, _)| 1.0 / d.powf(params.power))
                .collect();
            let sum: f64 = raw.iter().sum();

            WeightedQueryResult {
                indices: neighbors.iter().map(|&(_, ix)| ix).collect(),
                weights: raw.iter().map(|w| w / sum).collect(),
            }
        })
        .collect()
}
