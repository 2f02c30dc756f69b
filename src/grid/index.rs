//! Mapping of blocks to their positions in the lattice of blocks.

use super::{fgr, topology::GridTopology, StaggeringLocation};
use crate::{
    error::{RemapError, RemapResult},
    geometry::{
        Dim3::{self, X, Y, Z},
        Idx3, In3D, Point3,
    },
    interpolation::InterpolationError,
};
use std::ops::Range;

impl GridTopology {
    /// Returns the distinct block center coordinates along each axis, sorted
    /// in ascending order, for the given blocks or for all blocks.
    pub fn unique_centers_per_axis(&self, blocks: Option<&[usize]>) -> In3D<Vec<fgr>> {
        match blocks {
            Some(blocks) => unique_center_coords(blocks.iter().map(|&block| &self.centers()[block])),
            None => unique_center_coords(self.centers().iter()),
        }
    }

    /// Returns the position of each of the given blocks (or of all blocks) in
    /// the lattice spanned by the unique center coordinates of those blocks.
    pub fn logical_indices(&self, blocks: Option<&[usize]>) -> Vec<Idx3<usize>> {
        let unique_centers = self.unique_centers_per_axis(blocks);
        let lookup = |center: &Point3<fgr>| {
            Idx3::with_each_component(|dim| position_in_sorted(&unique_centers[dim], center[dim]))
        };
        match blocks {
            Some(blocks) => blocks
                .iter()
                .map(|&block| lookup(&self.centers()[block]))
                .collect(),
            None => self.centers().iter().map(lookup).collect(),
        }
    }

    /// Returns the `(x, y, z)` shape of a single array that can hold the data
    /// at the given staggering location of all the given blocks (or of all
    /// blocks), as if they formed one larger block.
    ///
    /// Face-centered locations have one extra point along their face axis.
    pub fn flattened_extent(
        &self,
        blocks: Option<&[usize]>,
        location: StaggeringLocation,
    ) -> In3D<usize> {
        let unique_centers = self.unique_centers_per_axis(blocks);
        let shift = location.face_shift();
        In3D::with_each_component(|dim| {
            unique_centers[dim].len() * self.block_sizes()[dim] + shift[dim]
        })
    }

    /// Returns the range of lattice positions along each axis occupied by
    /// the given blocks.
    ///
    /// The blocks must exactly fill the rectangular region they span.
    pub fn lattice_span(&self, blocks: &[usize]) -> Result<In3D<Range<usize>>, InterpolationError> {
        if blocks.is_empty() {
            return Err(InterpolationError::EmptyBlockSelection);
        }
        let span = In3D::with_each_component(|dim| {
            let positions = blocks
                .iter()
                .map(|&block| self.lattice_index(block)[dim]);
            let start = positions.clone().min().unwrap_or(0);
            let end = positions.max().map_or(0, |max| max + 1);
            start..end
        });
        let n_covered: usize = span.iter().map(|range| range.len()).product();
        if n_covered != blocks.len() {
            return Err(InterpolationError::IncompleteBlockSelection {
                n_blocks: blocks.len(),
                n_positions: n_covered,
            });
        }
        Ok(span)
    }
}

fn unique_center_coords<'a, I>(centers: I) -> In3D<Vec<fgr>>
where
    I: Iterator<Item = &'a Point3<fgr>>,
{
    let mut coords = In3D::new(Vec::new(), Vec::new(), Vec::new());
    for center in centers {
        for dim in Dim3::slice() {
            coords[dim].push(center[dim]);
        }
    }
    for dim in Dim3::slice() {
        coords[dim].sort_by(|a, b| a.total_cmp(b));
        coords[dim].dedup();
    }
    coords
}

fn position_in_sorted(sorted: &[fgr], value: fgr) -> usize {
    sorted.partition_point(|&coord| coord < value)
}

/// Computes the lattice position of every block from its center, and
/// verifies that the centers form a complete lattice with the given number
/// of blocks along each axis.
pub fn lattice_indices_from_centers(
    centers: &[Point3<fgr>],
    axis_block_counts: &In3D<usize>,
) -> RemapResult<Vec<Idx3<usize>>> {
    let unique_centers = unique_center_coords(centers.iter());
    for dim in Dim3::slice() {
        if unique_centers[dim].len() != axis_block_counts[dim] {
            return Err(RemapError::geometry(format!(
                "Found {} distinct {}-coordinates of block centers, expected {}",
                unique_centers[dim].len(),
                dim,
                axis_block_counts[dim]
            )));
        }
    }

    let lattice_indices: Vec<_> = centers
        .iter()
        .map(|center| {
            Idx3::with_each_component(|dim| position_in_sorted(&unique_centers[dim], center[dim]))
        })
        .collect();

    let mut occupied = vec![false; centers.len()];
    for (block, lattice_idx) in lattice_indices.iter().enumerate() {
        let linear_idx = lattice_idx[X]
            + axis_block_counts[X] * (lattice_idx[Y] + axis_block_counts[Y] * lattice_idx[Z]);
        if linear_idx >= occupied.len() || occupied[linear_idx] {
            return Err(RemapError::geometry(format!(
                "Block {} occupies lattice position {} already taken by another block",
                block, lattice_idx
            )));
        }
        occupied[linear_idx] = true;
    }
    Ok(lattice_indices)
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::grid::topology::RequestedGridConfig;

    fn topology(counts: [usize; 3], sizes: [usize; 3], dimensionality: usize) -> GridTopology {
        GridTopology::from_requested_grid(
            &RequestedGridConfig {
                dimensionality,
                axis_block_counts: counts,
                block_sizes: sizes,
                ..RequestedGridConfig::default()
            },
            &In3D::same((0.0, 1.0)),
        )
        .unwrap()
    }

    #[test]
    fn face_x_extent_gains_one_point_along_x() {
        let topology = topology([2, 3, 1], [8, 8, 1], 3);
        assert_eq!(
            topology.flattened_extent(None, StaggeringLocation::FaceX),
            In3D::new(2 * 8 + 1, 3 * 8, 1)
        );
        assert_eq!(
            topology.flattened_extent(None, StaggeringLocation::Center),
            In3D::new(16, 24, 1)
        );
        assert_eq!(
            topology.flattened_extent(None, StaggeringLocation::FaceZ),
            In3D::new(16, 24, 2)
        );
    }

    #[test]
    fn logical_indices_are_relative_to_subset() {
        let topology = topology([3, 3, 2], [2, 2, 2], 3);
        // Blocks at lattice positions (1, 1, 1), (2, 1, 1), (1, 2, 1) and (2, 2, 1)
        let subset = [13, 14, 16, 17];
        let logical = topology.logical_indices(Some(&subset));
        assert_eq!(
            logical,
            vec![
                Idx3::new(0, 0, 0),
                Idx3::new(1, 0, 0),
                Idx3::new(0, 1, 0),
                Idx3::new(1, 1, 0)
            ]
        );
        let unique = topology.unique_centers_per_axis(Some(&subset));
        assert_eq!(unique[X].len(), 2);
        assert_eq!(unique[Z].len(), 1);
        assert_eq!(
            topology.flattened_extent(Some(&subset), StaggeringLocation::FaceY),
            In3D::new(4, 5, 2)
        );

        let span = topology.lattice_span(&subset).unwrap();
        assert_eq!(span, In3D::new(1..3, 1..3, 1..2));
    }

    #[test]
    fn all_blocks_map_to_global_lattice() {
        let topology = topology([2, 2, 1], [4, 4, 1], 2);
        let logical = topology.logical_indices(None);
        let lattice: Vec<_> = (0..topology.num_blocks())
            .map(|block| topology.lattice_index(block).clone())
            .collect();
        assert_eq!(logical, lattice);
    }

    #[test]
    fn incomplete_selection_is_rejected() {
        let topology = topology([3, 3, 1], [2, 2, 2], 3);
        assert!(matches!(
            topology.lattice_span(&[0, 4]),
            Err(InterpolationError::IncompleteBlockSelection {
                n_blocks: 2,
                n_positions: 4
            })
        ));
        assert!(matches!(
            topology.lattice_span(&[]),
            Err(InterpolationError::EmptyBlockSelection)
        ));
    }

    #[test]
    fn duplicate_lattice_positions_are_rejected() {
        let centers = vec![
            Point3::new(0.25, 0.5, 0.5),
            Point3::new(0.75, 0.5, 0.5),
            Point3::new(0.75, 0.5, 0.5),
        ];
        assert!(lattice_indices_from_centers(&centers, &In3D::new(2, 1, 1)).is_err());
        assert!(lattice_indices_from_centers(&centers[..2], &In3D::new(2, 1, 1)).is_ok());
    }
}
