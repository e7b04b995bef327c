//! Masked field data structures

mod element;
mod polar;

pub use element::FieldElement;
pub use polar::PolarField;
