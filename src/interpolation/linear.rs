//! Multilinear interpolation.

use super::{find_interval, interval_fraction, AxisStencil, RegularGridInterpolator};
use crate::num::BFloat;

/// Interpolator which combines the values at the corners of the enclosing
/// grid cell with weights linear in the distance along each axis.
///
/// Coordinates outside the grid are extrapolated linearly from the outermost cell.
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearInterpolator;

impl RegularGridInterpolator for LinearInterpolator {
    fn axis_stencil<F: BFloat>(&self, coords: &[F], query_coord: F) -> AxisStencil<F> {
        let interval_idx = find_interval(coords, query_coord);
        let fraction = interval_fraction(coords, interval_idx, query_coord);
        vec![
            (interval_idx, F::one() - fraction),
            (interval_idx + 1, fraction),
        ]
    }
}
