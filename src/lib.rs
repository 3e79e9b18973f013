//! The `boozer_interp` crate accelerates evaluation of magnetic fields in Boozer
//! coordinates by interpolating them on regular grids, exploiting field
//! periodicity and stellarator symmetry.
pub mod error;
pub mod num;
pub mod geometry;
pub mod grid;
pub mod quantity;
pub mod symmetry;
pub mod interpolation;
pub mod field;
pub mod sampling;
pub mod interpolated;

pub use error::{BoozerError, Result};
pub use field::{BoozerFieldSource, FieldType};
pub use interpolated::{InterpolatedBoozerField, InterpolatedFieldConfig};
pub use quantity::Quantity;
