//! Field storage in HDF5 files, with one dataset per field in the root group.

use super::{fdt, verify_block_index, verify_block_shape, DatasetShape, FieldSink, FieldSource};
use crate::io_result;
use ndarray::{prelude::*, s};
use std::{
    io,
    path::{Path, PathBuf},
};

/// Field storage backed by an HDF5 file.
///
/// The file is closed when the storage is dropped.
#[derive(Debug)]
pub struct Hdf5FieldStorage {
    file: hdf5_rs::File,
    file_path: PathBuf,
}

impl Hdf5FieldStorage {
    /// Opens an existing HDF5 file for reading.
    pub fn open<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        let file = hdf5_rs::File::open(&file_path).map_err(|err| {
            hdf5_error_to_io(err, &format!("Could not open {}", file_path.display()))
        })?;
        Ok(Self { file, file_path })
    }

    /// Creates a new HDF5 file for writing.
    ///
    /// Unless `overwrite` is set, creation fails if the file already exists.
    pub fn create<P: AsRef<Path>>(file_path: P, overwrite: bool) -> io::Result<Self> {
        let file_path = file_path.as_ref().to_path_buf();
        if !overwrite && file_path.exists() {
            return io_result!(
                AlreadyExists,
                "File {} already exists, use overwrite to replace it",
                file_path.display()
            );
        }
        let file = if overwrite {
            hdf5_rs::File::create(&file_path)
        } else {
            hdf5_rs::File::create_excl(&file_path)
        }
        .map_err(|err| {
            hdf5_error_to_io(err, &format!("Could not create {}", file_path.display()))
        })?;
        Ok(Self { file, file_path })
    }

    /// Returns the path of the underlying file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn dataset(&self, field_name: &str) -> io::Result<hdf5_rs::Dataset> {
        self.file.dataset(field_name).map_err(|err| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!(
                    "No dataset named {} in {}: {}",
                    field_name,
                    self.file_path.display(),
                    err
                ),
            )
        })
    }
}

fn hdf5_error_to_io(err: hdf5_rs::Error, context: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn shape_from_dims(field_name: &str, dims: &[usize]) -> io::Result<DatasetShape> {
    match *dims {
        [n_blocks, nz, ny, nx] => Ok([n_blocks, nz, ny, nx]),
        _ => io_result!(
            InvalidData,
            "Dataset {} has {} dimensions, expected 4",
            field_name,
            dims.len()
        ),
    }
}

impl FieldSource for Hdf5FieldStorage {
    fn dataset_shape(&self, field_name: &str) -> io::Result<DatasetShape> {
        shape_from_dims(field_name, &self.dataset(field_name)?.shape())
    }

    fn read_block(&self, field_name: &str, block: usize) -> io::Result<Array3<fdt>> {
        let dataset = self.dataset(field_name)?;
        let shape = shape_from_dims(field_name, &dataset.shape())?;
        verify_block_index(field_name, &shape, block)?;
        dataset
            .read_slice::<fdt, _, Ix3>(s![block, .., .., ..])
            .map_err(|err| {
                hdf5_error_to_io(
                    err,
                    &format!("Could not read block {} of {}", block, field_name),
                )
            })
    }
}

impl FieldSink for Hdf5FieldStorage {
    fn create_dataset(&mut self, field_name: &str, shape: DatasetShape) -> io::Result<()> {
        if self.file.link_exists(field_name) {
            return io_result!(
                AlreadyExists,
                "Dataset {} already exists in {}",
                field_name,
                self.file_path.display()
            );
        }
        self.file
            .new_dataset::<fdt>()
            .shape(shape.to_vec())
            .create(field_name)
            .map_err(|err| {
                hdf5_error_to_io(err, &format!("Could not create dataset {}", field_name))
            })?;
        Ok(())
    }

    fn write_block(&self, field_name: &str, block: usize, values: ArrayView3<fdt>) -> io::Result<()> {
        let dataset = self.dataset(field_name)?;
        let shape = shape_from_dims(field_name, &dataset.shape())?;
        verify_block_index(field_name, &shape, block)?;
        verify_block_shape(field_name, &shape, &values)?;
        dataset
            .write_slice(values, s![block, .., .., ..])
            .map_err(|err| {
                hdf5_error_to_io(
                    err,
                    &format!("Could not write block {} of {}", block, field_name),
                )
            })
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn blocks_survive_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("fields.h5");

        let block = Array3::from_shape_fn((2, 3, 4), |(k, j, i)| (100 * k + 10 * j + i) as fdt);
        {
            let mut storage = Hdf5FieldStorage::create(&file_path, false).unwrap();
            storage.create_dataset("dens", [2, 2, 3, 4]).unwrap();
            storage.write_block("dens", 1, block.view()).unwrap();
            storage.write_block("dens", 0, (&block * 2.0).view()).unwrap();
        }

        let storage = Hdf5FieldStorage::open(&file_path).unwrap();
        assert_eq!(storage.dataset_shape("dens").unwrap(), [2, 2, 3, 4]);
        assert_eq!(storage.read_block("dens", 1).unwrap(), block);
        assert_eq!(storage.read_block("dens", 0).unwrap(), &block * 2.0);
        assert!(storage.read_block("dens", 2).is_err());
        assert!(storage.dataset_shape("pres").is_err());
    }

    #[test]
    fn existing_file_is_kept_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("fields.h5");
        Hdf5FieldStorage::create(&file_path, false).unwrap();
        assert_eq!(
            Hdf5FieldStorage::create(&file_path, false).unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
        assert!(Hdf5FieldStorage::create(&file_path, true).is_ok());
    }
}
