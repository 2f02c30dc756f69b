//! Interpolation of values given on rectilinear grids.

pub mod linear;
pub mod nearest;

use crate::{error::RemapError, num::BFloat};
use ndarray::{prelude::*, Dimension};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

pub use linear::LinearInterpolator;
pub use nearest::NearestInterpolator;

/// Errors raised while interpolating.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InterpolationError {
    /// The number of coordinate axes does not match the dimensionality of the values.
    #[error("Got {n_coord_axes} coordinate axes and {n_query_axes} query axes for {n_value_dims}-dimensional values")]
    DimensionMismatch {
        n_coord_axes: usize,
        n_query_axes: usize,
        n_value_dims: usize,
    },

    /// An axis has too few coordinates to interpolate along.
    #[error("Axis {axis} has {n_points} coordinate(s), at least 2 are required")]
    TooFewPoints { axis: usize, n_points: usize },

    /// The coordinates along an axis do not match the values.
    #[error("Axis {axis} has {n_coords} coordinates but the values have {n_values} points")]
    ShapeMismatch {
        axis: usize,
        n_coords: usize,
        n_values: usize,
    },

    /// The coordinates along an axis are not strictly increasing.
    #[error("Coordinates along axis {axis} are not strictly increasing")]
    NonIncreasingCoords { axis: usize },

    /// No source blocks overlap a destination block.
    #[error("No source blocks overlap destination block {block}")]
    NoOverlappingBlocks { block: usize },

    /// An empty set of blocks was selected.
    #[error("No blocks were selected")]
    EmptyBlockSelection,

    /// The selected blocks do not fill the rectangular region they span.
    #[error("{n_blocks} blocks do not fill the {n_positions} lattice positions they span")]
    IncompleteBlockSelection { n_blocks: usize, n_positions: usize },
}

/// Indices of the grid points along one axis contributing to the value at a
/// query coordinate, together with their weights.
pub type AxisStencil<F> = Vec<(usize, F)>;

/// Defines the properties of an interpolator for values given on a
/// rectilinear grid.
pub trait RegularGridInterpolator: Clone + Sync + Send {
    /// Computes the contributing point indices and weights along a single
    /// axis with the given strictly increasing coordinates (at least two).
    ///
    /// Query coordinates outside the range of the axis must be extrapolated,
    /// not rejected.
    fn axis_stencil<F: BFloat>(&self, coords: &[F], query_coord: F) -> AxisStencil<F>;

    /// Interpolates the given values, specified at the tensor product of the
    /// given axis coordinates, to the tensor product of the given query
    /// coordinates.
    ///
    /// # Parameters
    ///
    /// - `axis_coords`: Strictly increasing coordinates along each axis of `values`.
    /// - `values`: Values at the grid points.
    /// - `query_coords`: Coordinates along each axis where values are wanted.
    ///
    /// # Returns
    ///
    /// A `Result` which is either:
    ///
    /// - `Ok`: Contains the interpolated values, with one axis per query axis.
    /// - `Err`: Contains an `InterpolationError` if the input is degenerate.
    ///
    /// # Type parameters
    ///
    /// - `F`: Floating point type of the coordinates and values.
    fn interpolate<F: BFloat>(
        &self,
        axis_coords: &[&[F]],
        values: &ArrayViewD<F>,
        query_coords: &[&[F]],
    ) -> Result<ArrayD<F>, InterpolationError> {
        verify_grid_input(axis_coords, values.shape(), query_coords)?;

        let stencils: Vec<Vec<AxisStencil<F>>> = axis_coords
            .iter()
            .zip(query_coords)
            .map(|(coords, queries)| {
                queries
                    .iter()
                    .map(|&query_coord| self.axis_stencil(coords, query_coord))
                    .collect()
            })
            .collect();

        Ok(evaluate_tensor_product(values, &stencils))
    }
}

/// Interpolation methods available for remapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "lowercase"))]
pub enum InterpolationMethod {
    Linear,
    Nearest,
}

impl Default for InterpolationMethod {
    fn default() -> Self {
        Self::Linear
    }
}

impl RegularGridInterpolator for InterpolationMethod {
    fn axis_stencil<F: BFloat>(&self, coords: &[F], query_coord: F) -> AxisStencil<F> {
        match self {
            Self::Linear => LinearInterpolator.axis_stencil(coords, query_coord),
            Self::Nearest => NearestInterpolator.axis_stencil(coords, query_coord),
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Linear => "linear",
                Self::Nearest => "nearest",
            }
        )
    }
}

impl FromStr for InterpolationMethod {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "linear" => Ok(Self::Linear),
            "nearest" => Ok(Self::Nearest),
            invalid => Err(RemapError::geometry(format!(
                "Invalid interpolation method {}, valid methods are linear and nearest",
                invalid
            ))),
        }
    }
}

/// Returns the index `i` of the interval `[coords[i], coords[i + 1]]` to use
/// for the given coordinate, clamped to the first and last interval when the
/// coordinate is outside the range of the coordinates.
pub(crate) fn find_interval<F: BFloat>(coords: &[F], query_coord: F) -> usize {
    let n_lower = coords.partition_point(|&coord| coord <= query_coord);
    n_lower.saturating_sub(1).min(coords.len() - 2)
}

/// Returns the position of the given coordinate relative to the interval
/// starting at the given index, as a fraction of the interval length.
///
/// The fraction is below zero or above one for coordinates outside the interval.
pub(crate) fn interval_fraction<F: BFloat>(coords: &[F], interval_idx: usize, query_coord: F) -> F {
    let lower = coords[interval_idx];
    let upper = coords[interval_idx + 1];
    (query_coord - lower) / (upper - lower)
}

fn verify_grid_input<F: BFloat>(
    axis_coords: &[&[F]],
    value_shape: &[usize],
    query_coords: &[&[F]],
) -> Result<(), InterpolationError> {
    if axis_coords.len() != value_shape.len() || query_coords.len() != value_shape.len() {
        return Err(InterpolationError::DimensionMismatch {
            n_coord_axes: axis_coords.len(),
            n_query_axes: query_coords.len(),
            n_value_dims: value_shape.len(),
        });
    }
    for (axis, (coords, &n_values)) in axis_coords.iter().zip(value_shape).enumerate() {
        if coords.len() < 2 {
            return Err(InterpolationError::TooFewPoints {
                axis,
                n_points: coords.len(),
            });
        }
        if coords.len() != n_values {
            return Err(InterpolationError::ShapeMismatch {
                axis,
                n_coords: coords.len(),
                n_values,
            });
        }
        if coords.windows(2).any(|pair| !(pair[1] > pair[0])) {
            return Err(InterpolationError::NonIncreasingCoords { axis });
        }
    }
    Ok(())
}

fn evaluate_tensor_product<F: BFloat>(
    values: &ArrayViewD<F>,
    stencils: &[Vec<AxisStencil<F>>],
) -> ArrayD<F> {
    let output_shape: Vec<usize> = stencils.iter().map(|axis| axis.len()).collect();
    let mut output = ArrayD::from_elem(IxDyn(&output_shape), F::zero());
    let mut corner = vec![0; stencils.len()];

    for (query_idx, output_value) in output.indexed_iter_mut() {
        *output_value = accumulate_stencil(
            values,
            stencils,
            query_idx.slice(),
            0,
            F::one(),
            &mut corner,
        );
    }
    output
}

fn accumulate_stencil<F: BFloat>(
    values: &ArrayViewD<F>,
    stencils: &[Vec<AxisStencil<F>>],
    query_idx: &[usize],
    axis: usize,
    weight: F,
    corner: &mut Vec<usize>,
) -> F {
    if axis == stencils.len() {
        return weight * values[corner.as_slice()];
    }
    let mut sum = F::zero();
    for &(point_idx, axis_weight) in &stencils[axis][query_idx[axis]] {
        corner[axis] = point_idx;
        sum = sum
            + accumulate_stencil(
                values,
                stencils,
                query_idx,
                axis + 1,
                weight * axis_weight,
                corner,
            );
    }
    sum
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn degenerate_input_is_rejected() {
        let values = Array2::<f64>::zeros((1, 3));
        let y = [0.0];
        let x = [0.0, 1.0, 2.0];
        let query = [0.5];
        assert_eq!(
            LinearInterpolator.interpolate(&[&y, &x], &values.view().into_dyn(), &[&query, &query]),
            Err(InterpolationError::TooFewPoints {
                axis: 0,
                n_points: 1
            })
        );

        let values = Array2::<f64>::zeros((2, 3));
        let y = [0.0, 1.0];
        let x_short = [0.0, 1.0];
        assert_eq!(
            LinearInterpolator.interpolate(
                &[&y, &x_short],
                &values.view().into_dyn(),
                &[&query, &query]
            ),
            Err(InterpolationError::ShapeMismatch {
                axis: 1,
                n_coords: 2,
                n_values: 3
            })
        );

        let x_unsorted = [0.0, 2.0, 1.0];
        assert_eq!(
            LinearInterpolator.interpolate(
                &[&y, &x_unsorted],
                &values.view().into_dyn(),
                &[&query, &query]
            ),
            Err(InterpolationError::NonIncreasingCoords { axis: 1 })
        );

        assert!(matches!(
            LinearInterpolator.interpolate(&[&y], &values.view().into_dyn(), &[&query]),
            Err(InterpolationError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn interval_search_clamps_to_edge_intervals() {
        let coords = [0.0, 1.0, 3.0, 4.0];
        assert_eq!(find_interval(&coords, -5.0), 0);
        assert_eq!(find_interval(&coords, 0.0), 0);
        assert_eq!(find_interval(&coords, 1.0), 1);
        assert_eq!(find_interval(&coords, 2.9), 1);
        assert_eq!(find_interval(&coords, 4.0), 2);
        assert_eq!(find_interval(&coords, 10.0), 2);
        assert_eq!(interval_fraction(&coords, 1, 2.0), 0.5);
        assert_eq!(interval_fraction(&coords, 2, 5.0), 2.0);
    }

    #[test]
    fn methods_parse_from_names() {
        assert_eq!(
            "linear".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Linear
        );
        assert_eq!(
            "Nearest".parse::<InterpolationMethod>().unwrap(),
            InterpolationMethod::Nearest
        );
        assert!("cubic".parse::<InterpolationMethod>().is_err());
        assert_eq!(InterpolationMethod::default().to_string(), "linear");
    }
}
