//! Clutter filling on polar (azimuth × range) fields
//!
//! Masked bins are treated as scattered targets and re-synthesized from
//! the unmasked bins, using the Cartesian position of every bin center.

use std::f64::consts::PI;

use ndarray::{Array1, Array2};
use scatterfill_core::{CoordinateSet, Error, FieldElement, PolarField, Result};

use super::driver::interpolate_with_missing;
use super::method::Method;

/// Cartesian centers of every bin of an `n_azimuths × n_ranges` polar grid.
///
/// Bin `(a, r)` sits at range `r + 0.5` and azimuth `a · 2π / n_azimuths`;
/// points are ordered azimuth-major, matching the row-major layout of the
/// field.
pub fn polar_bin_centers(n_azimuths: usize, n_ranges: usize) -> CoordinateSet {
    let step = if n_azimuths > 0 {
        2.0 * PI / n_azimuths as f64
    } else {
        0.0
    };

    let mut points = Vec::with_capacity(n_azimuths * n_ranges);
    for a in 0..n_azimuths {
        let (sin, cos) = (a as f64 * step).sin_cos();
        for r in 0..n_ranges {
            let range = r as f64 + 0.5;
            points.push([range * cos, range * sin]);
        }
    }
    CoordinateSet::from_points(&points)
}

/// Replace every masked bin of `field` with a value interpolated from the
/// unmasked bins.
///
/// The mask is [`PolarField::effective_mask`]. Any bin still non-finite
/// after the chosen method has run (e.g. linear interpolation outside the
/// convex hull, or an unmasked NaN/nodata bin under an explicit mask) is
/// filled again by nearest neighbor, so every bin of the result is valid.
/// A field without masked bins is returned unchanged.
///
/// # Errors
/// - `InsufficientPoints` if no unmasked bin holds a valid value
/// - `Algorithm` if an interpolated value does not fit the cell type
pub fn fill_masked_polar<T: FieldElement>(
    field: &PolarField<T>,
    method: &Method,
) -> Result<Array2<T>> {
    let mask = field.effective_mask();
    let data = field.data();
    if !mask.iter().any(|&m| m) {
        if !field.has_explicit_mask() && !field.has_invalid_bins() {
            tracing::warn!("field has neither a mask nor invalid bins; nothing to fill");
        }
        return Ok(data.clone());
    }

    let nodata = field.nodata();
    let n_ranges = field.n_ranges();
    let (mut source_bins, mut target_bins) = (Vec::new(), Vec::new());
    let mut source_values = Vec::new();
    for (flat, (&masked, value)) in mask.iter().zip(data.iter()).enumerate() {
        if masked {
            target_bins.push(flat);
        } else {
            source_bins.push(flat);
            source_values.push(bin_value(*value, nodata));
        }
    }

    let valid_sources = source_values.iter().filter(|v| v.is_finite()).count();
    if valid_sources == 0 {
        return Err(Error::InsufficientPoints {
            required: 1,
            actual: 0,
            context: "polar clutter filling",
        });
    }

    let centers = polar_bin_centers(field.n_azimuths(), n_ranges);
    let sources = centers.select(&source_bins);
    let targets = centers.select(&target_bins);
    let source_values = Array1::from(source_values);

    let filled = interpolate_with_missing(&sources, &targets, &source_values, method)?;

    // (flat bin, value) for every bin the result overwrites
    let mut updates: Vec<(usize, f64)> = target_bins.iter().copied().zip(filled).collect();
    let invalid_sources = source_bins
        .iter()
        .zip(&source_values)
        .filter(|(_, v)| !v.is_finite())
        .map(|(&flat, &v)| (flat, v));
    updates.extend(invalid_sources);

    let residual: Vec<usize> = updates
        .iter()
        .enumerate()
        .filter(|(_, (_, v))| !v.is_finite())
        .map(|(i, _)| i)
        .collect();
    if !residual.is_empty() {
        tracing::debug!(
            bins = residual.len(),
            method = method.name(),
            "refilling non-finite bins by nearest neighbor"
        );
        let residual_bins: Vec<usize> = residual.iter().map(|&i| updates[i].0).collect();
        let refill = interpolate_with_missing(
            &sources,
            centers.select(&residual_bins),
            &source_values,
            &Method::default(),
        )?;
        for (&i, &v) in residual.iter().zip(&refill) {
            updates[i].1 = v;
        }
    }

    let mut out = data.clone();
    for (flat, v) in updates {
        let cell = T::from_f64(v).ok_or_else(|| {
            Error::Algorithm(format!(
                "interpolated value {v} does not fit the field's cell type"
            ))
        })?;
        out[(flat / n_ranges, flat % n_ranges)] = cell;
    }

    Ok(out)
}

/// Value of a bin as `f64`, NaN if it is flagged invalid.
fn bin_value<T: FieldElement>(value: T, nodata: Option<T>) -> f64 {
    if value.is_invalid(nodata) {
        f64::NAN
    } else {
        value.as_f64().unwrap_or(f64::NAN)
    }
}
