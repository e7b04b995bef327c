//! Interpolation over value arrays with missing (non-finite) entries
//!
//! A source row holding NaN must not contaminate its neighbors, but
//! rebuilding an interpolator for every value column is wasteful when
//! only a few columns have gaps. The driver therefore works in passes:
//!
//! - 1-D values: drop the invalid source rows once and interpolate from
//!   the remaining sources.
//! - 2-D values: one pass over the full source set, then, per column,
//!   a reduced interpolator restricted to the targets that came out
//!   non-finite and the sources that are valid in that column. The column
//!   patches are computed independently and merged by index.
//! - Higher ranks: only a single full pass is supported, so any
//!   non-finite value is rejected.

use ndarray::{Array, Array1, Array2, ArrayBase, ArrayView2, Data, Dimension, Ix1, Ix2};
use scatterfill_core::{CoordinateSet, Error, IntoCoordinates, Result};

use super::method::Method;
use crate::maybe_rayon::*;

/// Recomputed values for one column of a 2-D value array
struct ColumnPatch {
    column: usize,
    targets: Vec<usize>,
    values: Array1<f64>,
}

/// Interpolate `values` from `sources` onto `targets`, ignoring non-finite
/// source values.
///
/// The first axis of `values` runs over the sources; the output has the
/// same dimension with the first axis resized to the number of targets.
/// Inputs are never modified.
///
/// # Errors
/// - `ShapeMismatch` if `values` does not have one row per source
/// - `UnsupportedRank` if `values` has three or more axes and contains
///   non-finite entries
pub fn interpolate_with_missing<S, D>(
    sources: impl IntoCoordinates,
    targets: impl IntoCoordinates,
    values: &ArrayBase<S, D>,
    method: &Method,
) -> Result<Array<f64, D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    let sources = sources.into_coordinates()?;
    let targets = targets.into_coordinates()?;
    sources.ensure_same_dim(&targets)?;

    let rows = values.shape().first().copied().unwrap_or(0);
    if values.ndim() > 0 && rows != sources.len() {
        return Err(Error::ShapeMismatch {
            expected: sources.len(),
            actual: rows,
            context: "interpolation with missing values",
        });
    }

    match values.ndim() {
        1 => {
            let column = values.view().into_dimensionality::<Ix1>()?;
            let out = interpolate_column(&sources, &targets, column.iter().copied(), method)?;
            Ok(out.into_dimensionality::<D>()?)
        }
        2 => {
            let matrix = values.view().into_dimensionality::<Ix2>()?;
            let out = interpolate_columns(&sources, &targets, matrix, method)?;
            Ok(out.into_dimensionality::<D>()?)
        }
        ndim => {
            if ndim >= 3 && values.iter().any(|v| !v.is_finite()) {
                return Err(Error::UnsupportedRank { ndim });
            }
            method.build_sets(&sources, &targets)?.evaluate(values)
        }
    }
}

/// Build on the valid sources of one column and evaluate at `targets`.
fn interpolate_column(
    sources: &CoordinateSet,
    targets: &CoordinateSet,
    column: impl Iterator<Item = f64>,
    method: &Method,
) -> Result<Array1<f64>> {
    let (keep, kept_values): (Vec<usize>, Vec<f64>) = column
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .unzip();

    if keep.len() < sources.len() {
        tracing::debug!(
            dropped = sources.len() - keep.len(),
            remaining = keep.len(),
            "dropping non-finite source rows"
        );
    }

    let interpolator = method.build_sets(&sources.select(&keep), targets)?;
    interpolator.evaluate(&Array1::from(kept_values))
}

fn interpolate_columns(
    sources: &CoordinateSet,
    targets: &CoordinateSet,
    values: ArrayView2<'_, f64>,
    method: &Method,
) -> Result<Array2<f64>> {
    let mut out = method.build_sets(sources, targets)?.evaluate(&values)?;

    let patches: Vec<Option<ColumnPatch>> = (0..values.ncols())
        .into_par_iter()
        .map(|c| column_patch(sources, targets, values, out.view(), c, method))
        .collect::<Result<_>>()?;

    for patch in patches.into_iter().flatten() {
        tracing::debug!(
            column = patch.column,
            targets = patch.targets.len(),
            "recomputed column from valid sources"
        );
        for (&t, &v) in patch.targets.iter().zip(&patch.values) {
            out[(t, patch.column)] = v;
        }
    }

    Ok(out)
}

/// Recompute the non-finite results of column `c`, if any, from the
/// sources that are valid in that column.
///
/// Returns `None` when nothing needs recomputing, including the case where
/// every source is valid so a second pass would repeat the first.
fn column_patch(
    sources: &CoordinateSet,
    targets: &CoordinateSet,
    values: ArrayView2<'_, f64>,
    first_pass: ArrayView2<'_, f64>,
    c: usize,
    method: &Method,
) -> Result<Option<ColumnPatch>> {
    let broken: Vec<usize> = first_pass
        .column(c)
        .iter()
        .enumerate()
        .filter(|(_, v)| !v.is_finite())
        .map(|(t, _)| t)
        .collect();
    if broken.is_empty() {
        return Ok(None);
    }

    let column = values.column(c);
    if column.iter().all(|v| v.is_finite()) {
        return Ok(None);
    }

    let patched = interpolate_column(
        sources,
        &targets.select(&broken),
        column.iter().copied(),
        method,
    )?;

    Ok(Some(ColumnPatch {
        column: c,
        targets: broken,
        values: patched,
    }))
}
