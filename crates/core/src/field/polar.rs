//! Masked polar field type

use crate::error::{Error, Result};
use crate::field::FieldElement;
use ndarray::{Array2, ArrayView2};

/// A 2D field sampled on a polar (azimuth × range) bin grid.
///
/// Rows are azimuth bins spread evenly over the full circle, columns are
/// range bins. Bins that hold invalid readings are flagged either by an
/// explicit boolean mask or implicitly by the field values themselves
/// (non-finite floats or the nodata marker).
///
/// # Example
///
/// ```ignore
/// use scatterfill_core::PolarField;
///
/// let mut field = PolarField::new(data);
/// field.set_nodata(Some(-32768.0));
/// let mask = field.effective_mask();
/// ```
#[derive(Debug, Clone)]
pub struct PolarField<T: FieldElement> {
    /// Field values indexed by (azimuth, range)
    data: Array2<T>,
    /// Explicit clutter mask, true where the bin must be synthesized
    mask: Option<Array2<bool>>,
    /// No-data value
    nodata: Option<T>,
}

impl<T: FieldElement> PolarField<T> {
    /// Create a field without an explicit mask
    pub fn new(data: Array2<T>) -> Self {
        Self {
            data,
            mask: None,
            nodata: None,
        }
    }

    /// Create a field with an explicit clutter mask of the same shape
    pub fn with_mask(data: Array2<T>, mask: Array2<bool>) -> Result<Self> {
        if data.dim() != mask.dim() {
            let (er, ec) = data.dim();
            let (ar, ac) = mask.dim();
            return Err(Error::SizeMismatch { er, ec, ar, ac });
        }

        Ok(Self {
            data,
            mask: Some(mask),
            nodata: None,
        })
    }

    /// Create a field from row-major data
    pub fn from_vec(data: Vec<T>, n_azimuths: usize, n_ranges: usize) -> Result<Self> {
        if data.len() != n_azimuths * n_ranges {
            return Err(Error::SizeMismatch {
                er: n_azimuths,
                ec: n_ranges,
                ar: data.len(),
                ac: 1,
            });
        }

        let array = Array2::from_shape_vec((n_azimuths, n_ranges), data)?;
        Ok(Self::new(array))
    }

    // Dimensions

    /// Number of azimuth bins (rows)
    pub fn n_azimuths(&self) -> usize {
        self.data.nrows()
    }

    /// Number of range bins (columns)
    pub fn n_ranges(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (azimuths, ranges)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of bins
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (azimuth, range)
    pub fn get(&self, azimuth: usize, range: usize) -> Result<T> {
        self.data
            .get((azimuth, range))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row: azimuth,
                col: range,
                rows: self.n_azimuths(),
                cols: self.n_ranges(),
            })
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// The explicit mask, if one was supplied
    pub fn mask(&self) -> Option<&Array2<bool>> {
        self.mask.as_ref()
    }

    /// Replace the explicit mask
    pub fn set_mask(&mut self, mask: Option<Array2<bool>>) -> Result<()> {
        if let Some(m) = &mask {
            if m.dim() != self.data.dim() {
                let (er, ec) = self.data.dim();
                let (ar, ac) = m.dim();
                return Err(Error::SizeMismatch { er, ec, ar, ac });
            }
        }
        self.mask = mask;
        Ok(())
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    // Masks

    /// Whether an explicit mask flags at least one bin
    pub fn has_explicit_mask(&self) -> bool {
        self.mask.as_ref().is_some_and(|m| m.iter().any(|&b| b))
    }

    /// Whether any value is NaN or equal to the nodata marker
    pub fn has_invalid_bins(&self) -> bool {
        self.data.iter().any(|v| v.is_invalid(self.nodata))
    }

    /// Mask derived purely from the field values
    pub fn invalid_mask(&self) -> Array2<bool> {
        self.data.mapv(|v| v.is_invalid(self.nodata))
    }

    /// The mask that drives clutter filling.
    ///
    /// An explicit mask wins if it flags anything; otherwise the
    /// invalid markers carried by the values are used.
    pub fn effective_mask(&self) -> Array2<bool> {
        match &self.mask {
            Some(m) if m.iter().any(|&b| b) => m.clone(),
            _ => self.invalid_mask(),
        }
    }

    /// Number of bins flagged by [`Self::effective_mask`]
    pub fn masked_count(&self) -> usize {
        self.effective_mask().iter().filter(|&&b| b).count()
    }
}
