//! Containers holding the per-block values of fields.

pub mod memory;

#[cfg(feature = "hdf5")]
pub mod hdf5;

use crate::io_result;
use ndarray::prelude::*;
use std::io;

/// Floating-point precision to use for field values.
#[allow(non_camel_case_types)]
pub type fdt = f64;

/// Shape `(num_blocks, nz, ny, nx)` of a stored field.
pub type DatasetShape = [usize; 4];

/// Defines the properties of a container that field values can be read from.
pub trait FieldSource: Sync {
    /// Returns the shape of the dataset with the given name.
    fn dataset_shape(&self, field_name: &str) -> io::Result<DatasetShape>;

    /// Reads the `(nz, ny, nx)` values of the given block of the dataset
    /// with the given name.
    fn read_block(&self, field_name: &str, block: usize) -> io::Result<Array3<fdt>>;

    /// Checks that the dataset with the given name exists and has the given shape.
    fn verify_dataset_shape(&self, field_name: &str, expected_shape: DatasetShape) -> io::Result<()> {
        let shape = self.dataset_shape(field_name)?;
        if shape != expected_shape {
            io_result!(
                InvalidData,
                "Dataset {} has shape {:?}, expected {:?}",
                field_name,
                shape,
                expected_shape
            )
        } else {
            Ok(())
        }
    }
}

/// Defines the properties of a container that field values can be written to.
///
/// Datasets are created through a mutable reference before any block is
/// written, while blocks can be written concurrently through a shared reference.
pub trait FieldSink: FieldSource {
    /// Creates a dataset with the given name and shape.
    fn create_dataset(&mut self, field_name: &str, shape: DatasetShape) -> io::Result<()>;

    /// Writes the `(nz, ny, nx)` values of the given block of the dataset
    /// with the given name.
    fn write_block(&self, field_name: &str, block: usize, values: ArrayView3<fdt>) -> io::Result<()>;
}

/// Returns an error if the given block is outside a dataset of the given shape.
pub(crate) fn verify_block_index(field_name: &str, shape: &DatasetShape, block: usize) -> io::Result<()> {
    if block >= shape[0] {
        io_result!(
            InvalidInput,
            "Block {} is out of bounds for dataset {} with {} blocks",
            block,
            field_name,
            shape[0]
        )
    } else {
        Ok(())
    }
}

/// Returns an error if the given block values do not fit a dataset of the given shape.
pub(crate) fn verify_block_shape(
    field_name: &str,
    shape: &DatasetShape,
    values: &ArrayView3<fdt>,
) -> io::Result<()> {
    if values.shape() != &shape[1..] {
        io_result!(
            InvalidInput,
            "Block values with shape {:?} do not fit dataset {} with block shape {:?}",
            values.shape(),
            field_name,
            &shape[1..]
        )
    } else {
        Ok(())
    }
}
