//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat:
    Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug
{
}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Returns the sign of the given value as -1, 0 or 1.
pub fn sign<F: BFloat>(value: F) -> F {
    if value > F::zero() {
        F::one()
    } else if value < F::zero() {
        -F::one()
    } else {
        F::zero()
    }
}
