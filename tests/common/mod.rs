#![allow(dead_code)]

use blockremap::{
    geometry::{
        Dim3::{X, Y, Z},
        In3D,
    },
    grid::{
        fgr,
        topology::{GridTopology, RequestedGridConfig},
        StaggeringLocation,
    },
    storage::{fdt, memory::MemoryFieldStorage},
};
use ndarray::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[cfg(feature = "cli")]
use blockremap::cli;
#[cfg(feature = "cli")]
use lazy_static::lazy_static;
#[cfg(feature = "cli")]
use std::ffi::OsString;

#[cfg(feature = "cli")]
lazy_static! {
    static ref COMMAND: clap::Command<'static> = cli::build::build().no_binary_name(true);
}

/// Runs the command line program with the given arguments.
#[cfg(feature = "cli")]
pub fn run<I, T>(args: I)
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    cli::run::run_with_args(COMMAND.clone().get_matches_from(args));
}

/// Output directory of a single test, cleared when the test starts.
#[derive(Debug, Clone)]
pub struct Test {
    output_dir: PathBuf,
}

impl Test {
    const BASE_OUTPUT_DIR_PATH_COMPONENTS: [&'static str; 3] = ["tests", "data", "output"];

    pub fn new<S: AsRef<str>>(name: S) -> Self {
        let output_dir: PathBuf = Self::BASE_OUTPUT_DIR_PATH_COMPONENTS
            .iter()
            .collect::<PathBuf>()
            .join(name.as_ref());
        if let Err(err) = Self::prepare_output_dir(&output_dir) {
            panic!(
                "Could not prepare output directory {}: {}",
                output_dir.display(),
                err
            );
        }
        Self { output_dir }
    }

    pub fn output_path<S: AsRef<str>>(&self, file_name: S) -> PathBuf {
        self.output_dir.join(file_name.as_ref())
    }

    fn prepare_output_dir(output_dir: &Path) -> io::Result<()> {
        if output_dir.exists() {
            fs::remove_dir_all(output_dir)?;
        }
        fs::create_dir_all(output_dir)
    }
}

pub fn unit_ranges() -> In3D<(fgr, fgr)> {
    In3D::same((0.0, 1.0))
}

/// Creates a grid covering the unit cube with the given number of blocks
/// of the given number of cells.
pub fn unit_cube_grid(counts: [usize; 3], sizes: [usize; 3], dimensionality: usize) -> GridTopology {
    GridTopology::from_requested_grid(
        &RequestedGridConfig {
            dimensionality,
            axis_block_counts: counts,
            block_sizes: sizes,
            ..RequestedGridConfig::default()
        },
        &unit_ranges(),
    )
    .unwrap()
}

/// Evaluates the given function at every point of the given location in
/// every block of the grid.
pub fn field_values<F>(grid: &GridTopology, location: StaggeringLocation, field: F) -> Array4<fdt>
where
    F: Fn(fgr, fgr, fgr) -> fdt,
{
    let [n_blocks, nz, ny, nx] = grid.dataset_shape(location);
    let mut values = Array4::zeros((n_blocks, nz, ny, nx));
    for (block, mut block_values) in values.outer_iter_mut().enumerate() {
        let lattice_idx = grid.lattice_index(block);
        let x = grid.block_coords(location, X, lattice_idx[X]);
        let y = grid.block_coords(location, Y, lattice_idx[Y]);
        let z = grid.block_coords(location, Z, lattice_idx[Z]);
        for ((k, j, i), value) in block_values.indexed_iter_mut() {
            *value = field(x[i], y[j], z[k]);
        }
    }
    values
}

/// Creates a storage holding a single field given by the given function.
pub fn storage_with_field<F>(
    grid: &GridTopology,
    field_name: &str,
    location: StaggeringLocation,
    field: F,
) -> MemoryFieldStorage
where
    F: Fn(fgr, fgr, fgr) -> fdt,
{
    let mut storage = MemoryFieldStorage::new();
    storage.insert_dataset(field_name, field_values(grid, location, field));
    storage
}

/// Creates a storage holding a single field of uniformly random values.
pub fn storage_with_random_field(
    grid: &GridTopology,
    field_name: &str,
    location: StaggeringLocation,
    seed: u64,
) -> MemoryFieldStorage {
    let mut rng = StdRng::seed_from_u64(seed);
    let [n_blocks, nz, ny, nx] = grid.dataset_shape(location);
    let values = Array4::from_shape_simple_fn((n_blocks, nz, ny, nx), || rng.gen_range(-1.0..1.0));
    let mut storage = MemoryFieldStorage::new();
    storage.insert_dataset(field_name, values);
    storage
}

pub fn assert_all_close(actual: &Array4<fdt>, expected: &Array4<fdt>, tolerance: fdt) {
    assert_eq!(actual.shape(), expected.shape());
    for ((idx, a), b) in actual.indexed_iter().zip(expected.iter()) {
        assert!(
            (a - b).abs() <= tolerance,
            "Values differ at {:?}: {} != {}",
            idx,
            a,
            b
        );
    }
}
