//! In-memory field storage.

use super::{fdt, verify_block_index, verify_block_shape, DatasetShape, FieldSink, FieldSource};
use crate::io_result;
use ndarray::prelude::*;
use std::{
    collections::HashMap,
    io,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

/// Field storage keeping every dataset in memory.
#[derive(Debug, Default)]
pub struct MemoryFieldStorage {
    datasets: RwLock<HashMap<String, Array4<fdt>>>,
}

impl MemoryFieldStorage {
    /// Creates a new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the given `(num_blocks, nz, ny, nx)` values as the dataset
    /// with the given name, replacing any existing dataset with that name.
    pub fn insert_dataset<S: Into<String>>(&mut self, field_name: S, values: Array4<fdt>) {
        self.datasets
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(field_name.into(), values);
    }

    /// Returns a copy of the dataset with the given name, if present.
    pub fn dataset(&self, field_name: &str) -> Option<Array4<fdt>> {
        self.read_datasets().get(field_name).cloned()
    }

    /// Returns the names of all datasets, sorted alphabetically.
    pub fn dataset_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read_datasets().keys().cloned().collect();
        names.sort();
        names
    }

    /// Consumes the storage and returns all datasets.
    pub fn into_datasets(self) -> HashMap<String, Array4<fdt>> {
        self.datasets
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn read_datasets(&self) -> RwLockReadGuard<'_, HashMap<String, Array4<fdt>>> {
        self.datasets
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_datasets(&self) -> RwLockWriteGuard<'_, HashMap<String, Array4<fdt>>> {
        self.datasets
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn missing_dataset(field_name: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("No dataset named {} in storage", field_name),
    )
}

impl FieldSource for MemoryFieldStorage {
    fn dataset_shape(&self, field_name: &str) -> io::Result<DatasetShape> {
        let datasets = self.read_datasets();
        let dataset = datasets
            .get(field_name)
            .ok_or_else(|| missing_dataset(field_name))?;
        Ok(dataset_shape_of(dataset))
    }

    fn read_block(&self, field_name: &str, block: usize) -> io::Result<Array3<fdt>> {
        let datasets = self.read_datasets();
        let dataset = datasets
            .get(field_name)
            .ok_or_else(|| missing_dataset(field_name))?;
        verify_block_index(field_name, &dataset_shape_of(dataset), block)?;
        Ok(dataset.index_axis(Axis(0), block).to_owned())
    }
}

impl FieldSink for MemoryFieldStorage {
    fn create_dataset(&mut self, field_name: &str, shape: DatasetShape) -> io::Result<()> {
        let datasets = self
            .datasets
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if datasets.contains_key(field_name) {
            return io_result!(AlreadyExists, "Dataset {} already exists", field_name);
        }
        datasets.insert(field_name.to_string(), Array4::from_elem(shape, fdt::NAN));
        Ok(())
    }

    fn write_block(&self, field_name: &str, block: usize, values: ArrayView3<fdt>) -> io::Result<()> {
        let mut datasets = self.write_datasets();
        let dataset = datasets
            .get_mut(field_name)
            .ok_or_else(|| missing_dataset(field_name))?;
        let shape = dataset_shape_of(dataset);
        verify_block_index(field_name, &shape, block)?;
        verify_block_shape(field_name, &shape, &values)?;
        dataset.index_axis_mut(Axis(0), block).assign(&values);
        Ok(())
    }
}

fn dataset_shape_of(dataset: &Array4<fdt>) -> DatasetShape {
    let (n_blocks, nz, ny, nx) = dataset.dim();
    [n_blocks, nz, ny, nx]
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn written_blocks_can_be_read_back() {
        let mut storage = MemoryFieldStorage::new();
        storage.create_dataset("dens", [3, 1, 2, 2]).unwrap();
        assert_eq!(storage.dataset_shape("dens").unwrap(), [3, 1, 2, 2]);

        let block = array![[[1.0, 2.0], [3.0, 4.0]]];
        storage.write_block("dens", 1, block.view()).unwrap();
        assert_eq!(storage.read_block("dens", 1).unwrap(), block);
        assert!(storage.read_block("dens", 0).unwrap().iter().all(|v| v.is_nan()));
        assert!(storage.verify_dataset_shape("dens", [3, 1, 2, 2]).is_ok());
        assert!(storage.verify_dataset_shape("dens", [3, 2, 2, 2]).is_err());
    }

    #[test]
    fn invalid_access_is_rejected() {
        let mut storage = MemoryFieldStorage::new();
        storage.create_dataset("velx", [2, 1, 1, 2]).unwrap();
        assert_eq!(
            storage.create_dataset("velx", [2, 1, 1, 2]).unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
        assert_eq!(
            storage.read_block("vely", 0).unwrap_err().kind(),
            io::ErrorKind::NotFound
        );
        assert!(storage.read_block("velx", 2).is_err());
        assert!(storage
            .write_block("velx", 0, Array3::zeros((1, 2, 1)).view())
            .is_err());
        assert_eq!(storage.dataset_names(), vec!["velx".to_string()]);
    }
}
