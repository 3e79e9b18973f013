//! Utilities related to numbers.

use num::traits::{Euclid, FloatConst};
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + FloatConst + Euclid + num::cast::FromPrimitive + fmt::Debug
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Reduces the given value into `[0, period)` by a floor-style remainder.
///
/// Values that round up to exactly `period` wrap around to zero.
pub fn reduce_periodic<F: BFloat>(value: F, period: F) -> F {
    let reduced = value.rem_euclid(&period);
    if reduced >= period {
        F::zero()
    } else {
        reduced
    }
}

/// Returns `2*pi` in the given floating point type.
pub fn two_pi<F: BFloat>() -> F {
    F::PI() + F::PI()
}
