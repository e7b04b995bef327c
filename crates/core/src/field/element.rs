//! Cell element trait for masked fields

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Trait for types that can be stored in a field cell.
///
/// Interpolation itself runs in `f64`; this trait provides the lossless
/// widening into `f64` and the (rounding) narrowing back into the cell type.
pub trait FieldElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Check if this value is an invalid marker (NaN or the nodata value)
    fn is_invalid(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Widen self into f64
    fn as_f64(self) -> Option<f64> {
        NumCast::from(self)
    }

    /// Convert an interpolated f64 back into a cell value.
    ///
    /// Integer types round to the nearest value; `None` if out of range.
    fn from_f64(value: f64) -> Option<Self> {
        if Self::is_float() {
            NumCast::from(value)
        } else {
            NumCast::from(value.round())
        }
    }
}

macro_rules! impl_field_element_int {
    ($t:ty) => {
        impl FieldElement for $t {
            fn is_invalid(&self, nodata: Option<Self>) -> bool {
                match nodata {
                    Some(nd) => *self == nd,
                    None => false,
                }
            }

            fn is_float() -> bool {
                false
            }
        }
    };
}

macro_rules! impl_field_element_float {
    ($t:ty) => {
        impl FieldElement for $t {
            fn is_invalid(&self, nodata: Option<Self>) -> bool {
                if !self.is_finite() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }

            fn is_float() -> bool {
                true
            }
        }
    };
}

impl_field_element_int!(i8);
impl_field_element_int!(i16);
impl_field_element_int!(i32);
impl_field_element_int!(i64);
impl_field_element_int!(u8);
impl_field_element_int!(u16);
impl_field_element_int!(u32);
impl_field_element_int!(u64);
impl_field_element_float!(f32);
impl_field_element_float!(f64);
