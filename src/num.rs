//! Utilities related to numbers.

use num;
use std::fmt;

/// Floating point marker trait for easier control over trait bounds.
pub trait BFloat: Sync + Send + num::Float + num::cast::FromPrimitive + fmt::Debug {}

impl BFloat for f32 {}
impl BFloat for f64 {}

/// Whether `a` and `b` agree to within `tolerance` times `scale`.
pub fn approx_eq_scaled<F: BFloat>(a: F, b: F, scale: F, tolerance: F) -> bool {
    (a - b).abs() <= tolerance * scale.abs().max(F::one())
}

/// Returns the smallest and largest value of the given values, ignoring NaNs.
///
/// Returns `None` if there are no non-NaN values.
pub fn finite_min_max<'a, F, I>(values: I) -> Option<(F, F)>
where
    F: BFloat + 'a,
    I: IntoIterator<Item = &'a F>,
{
    values
        .into_iter()
        .filter(|value| !value.is_nan())
        .fold(None, |range, &value| match range {
            None => Some((value, value)),
            Some((min, max)) => Some((min.min(value), max.max(value))),
        })
}
