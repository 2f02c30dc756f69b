//! Reassembly of the values of adjacent source blocks into one local array.

use crate::{
    error::RemapResult,
    geometry::Dim3::{X, Y, Z},
    grid::{topology::GridTopology, StaggeringLocation},
    storage::{fdt, FieldSource},
};
use ndarray::{prelude::*, s};
use std::io;

/// Reads the values of the given field in each of the given blocks and
/// places them in a single `(nz, ny, nx)` array, as if the blocks were one
/// larger block.
///
/// The blocks must fill the rectangular region of the block lattice they
/// span. For face-centered fields, adjacent blocks share the values on
/// their common face.
pub fn gather_local_patch<S: FieldSource>(
    grid: &GridTopology,
    blocks: &[usize],
    location: StaggeringLocation,
    field_name: &str,
    storage: &S,
) -> RemapResult<Array3<fdt>> {
    let extent = grid.flattened_extent(Some(blocks), location);
    let logical_indices = grid.logical_indices(Some(blocks));
    let block_sizes = grid.block_sizes();
    let block_shape = grid.block_array_shape(location);
    let (block_nz, block_ny, block_nx) = block_shape;

    let mut patch = Array3::from_elem((extent[Z], extent[Y], extent[X]), fdt::NAN);

    for (&block, logical_idx) in blocks.iter().zip(logical_indices.iter()) {
        let values = storage.read_block(field_name, block)?;
        if values.dim() != block_shape {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Block {} of {} has shape {:?}, expected {:?}",
                    block,
                    field_name,
                    values.dim(),
                    block_shape
                ),
            )
            .into());
        }
        let z_start = logical_idx[Z] * block_sizes[Z];
        let y_start = logical_idx[Y] * block_sizes[Y];
        let x_start = logical_idx[X] * block_sizes[X];
        patch
            .slice_mut(s![
                z_start..z_start + block_nz,
                y_start..y_start + block_ny,
                x_start..x_start + block_nx
            ])
            .assign(&values);
    }
    Ok(patch)
}
