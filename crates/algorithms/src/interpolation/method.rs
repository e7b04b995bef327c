//! Closed set of interpolation strategies

use ndarray::{Array, ArrayBase, Data, Dimension};
use scatterfill_core::{CoordinateSet, IntoCoordinates, Result};

use super::idw::{IdwInterpolator, IdwParams};
use super::linear::{LinearInterpolator, LinearParams};
use super::nearest::{NearestInterpolator, NearestParams};

/// Interpolation strategy with its parameters.
///
/// Selected at configuration time; [`Method::build`] produces the matching
/// [`Interpolator`] for a (sources, targets) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "method", rename_all = "snake_case"))]
pub enum Method {
    Nearest(NearestParams),
    InverseDistance(IdwParams),
    Linear(LinearParams),
}

impl Default for Method {
    fn default() -> Self {
        Method::Nearest(NearestParams::default())
    }
}

impl Method {
    /// Short name of the strategy
    pub fn name(&self) -> &'static str {
        match self {
            Method::Nearest(_) => "nearest",
            Method::InverseDistance(_) => "inverse_distance",
            Method::Linear(_) => "linear",
        }
    }

    /// Construct the interpolator for this strategy.
    pub fn build(
        &self,
        sources: impl IntoCoordinates,
        targets: impl IntoCoordinates,
    ) -> Result<Interpolator> {
        let sources = sources.into_coordinates()?;
        let targets = targets.into_coordinates()?;
        self.build_sets(&sources, &targets)
    }

    pub(crate) fn build_sets(
        &self,
        sources: &CoordinateSet,
        targets: &CoordinateSet,
    ) -> Result<Interpolator> {
        let kind = match *self {
            Method::Nearest(params) => InterpolatorKind::Nearest(
                NearestInterpolator::from_sets(sources, targets)?,
                params,
            ),
            Method::InverseDistance(params) => {
                InterpolatorKind::InverseDistance(IdwInterpolator::from_sets(sources, targets, params)?)
            }
            Method::Linear(params) => InterpolatorKind::Linear(
                LinearInterpolator::from_sets(sources.clone(), targets.clone())?,
                params,
            ),
        };
        Ok(Interpolator { kind })
    }
}

#[derive(Debug, Clone)]
enum InterpolatorKind {
    Nearest(NearestInterpolator, NearestParams),
    InverseDistance(IdwInterpolator),
    Linear(LinearInterpolator, LinearParams),
}

/// A constructed interpolator of any strategy, carrying the evaluation
/// options it was configured with.
#[derive(Debug, Clone)]
pub struct Interpolator {
    kind: InterpolatorKind,
}

impl Interpolator {
    pub fn num_sources(&self) -> usize {
        match &self.kind {
            InterpolatorKind::Nearest(ip, _) => ip.num_sources(),
            InterpolatorKind::InverseDistance(ip) => ip.num_sources(),
            InterpolatorKind::Linear(ip, _) => ip.num_sources(),
        }
    }

    pub fn num_targets(&self) -> usize {
        match &self.kind {
            InterpolatorKind::Nearest(ip, _) => ip.num_targets(),
            InterpolatorKind::InverseDistance(ip) => ip.num_targets(),
            InterpolatorKind::Linear(ip, _) => ip.num_targets(),
        }
    }

    /// Interpolate `values` (one row per source point) onto the targets.
    ///
    /// # Errors
    /// `ShapeMismatch` if `values` does not have one row per source.
    pub fn evaluate<S, D>(&self, values: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        match &self.kind {
            InterpolatorKind::Nearest(ip, params) => ip.evaluate(values, params.max_distance),
            InterpolatorKind::InverseDistance(ip) => ip.evaluate(values),
            InterpolatorKind::Linear(ip, params) => ip.evaluate(values, params.fill_value),
        }
    }
}
