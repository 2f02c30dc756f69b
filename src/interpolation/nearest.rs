//! Nearest-neighbour interpolation.

use super::{find_interval, interval_fraction, AxisStencil, RegularGridInterpolator};
use crate::num::BFloat;

/// Interpolator which picks the value at the closest grid point along each axis.
///
/// Ties are resolved towards the lower grid point.
#[derive(Clone, Copy, Debug, Default)]
pub struct NearestInterpolator;

impl RegularGridInterpolator for NearestInterpolator {
    fn axis_stencil<F: BFloat>(&self, coords: &[F], query_coord: F) -> AxisStencil<F> {
        let interval_idx = find_interval(coords, query_coord);
        let fraction = interval_fraction(coords, interval_idx, query_coord);
        let half = F::one() / (F::one() + F::one());
        let nearest_idx = if fraction <= half {
            interval_idx
        } else {
            interval_idx + 1
        };
        vec![(nearest_idx, F::one())]
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::prelude::*;

    #[test]
    fn closest_points_are_selected() {
        let y = [0.0, 1.0];
        let x = [0.0, 1.0, 3.0];
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let result = NearestInterpolator
            .interpolate(
                &[&y, &x],
                &values.view().into_dyn(),
                &[&[0.2, 0.8], &[-2.0, 0.5, 2.1, 9.0]],
            )
            .unwrap();
        assert_eq!(
            result.into_dimensionality::<Ix2>().unwrap(),
            array![[1.0, 1.0, 3.0, 3.0], [4.0, 4.0, 6.0, 6.0]]
        );
    }
}
