//! Command line interface for interpolating a source simulation onto a new grid.

use super::utils as cli_utils;
use crate::{
    exit_on_error, exit_on_false, exit_with_error,
    grid::topology::{GridTopology, RequestedGridConfig, SourceGeometry},
    io::Verbosity,
    remap::{self, FieldMapping, RemapConfig},
};
use clap::{Arg, ArgMatches, Command};
use std::path::{Path, PathBuf};

#[cfg(feature = "hdf5")]
use crate::storage::{hdf5::Hdf5FieldStorage, memory::MemoryFieldStorage};

/// Builds a representation of the `interp` command line subcommand.
pub fn create_interp_subcommand() -> Command<'static> {
    Command::new("interp")
        .about("Interpolate fields from a block-decomposed simulation onto a new block decomposition")
        .long_about(
            "Interpolate fields from a block-decomposed simulation onto a new block decomposition.\n\
             The destination grid covers the domain of the source grid with the given number\n\
             of blocks of the given number of cells. The interpolated fields are written to a\n\
             new HDF5 file with one dataset of shape (blocks, nz, ny, nx) per field.",
        )
        .arg(
            Arg::new("source-geometry")
                .long("source-geometry")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of the JSON file describing the block geometry of the source simulation")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::new("source-data")
                .long("source-data")
                .require_equals(true)
                .value_name("PATH")
                .help(
                    "Path of the HDF5 file with the source field values\n\
                     [default: the storage path listed in the source geometry]",
                )
                .takes_value(true),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of the HDF5 file to write the interpolated fields to")
                .takes_value(true)
                .default_value("initial_block.h5"),
        )
        .arg(
            Arg::new("shape")
                .long("shape")
                .require_equals(true)
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .value_name("NX,NY[,NZ]")
                .help("Number of cells in each destination block along each axis")
                .required(true)
                .takes_value(true)
                .multiple_values(true),
        )
        .arg(
            Arg::new("blocks")
                .long("blocks")
                .require_equals(true)
                .use_value_delimiter(true)
                .require_value_delimiter(true)
                .value_name("BX,BY[,BZ]")
                .help("Number of destination blocks along each axis")
                .required(true)
                .takes_value(true)
                .multiple_values(true),
        )
        .arg(
            Arg::new("ndim")
                .long("ndim")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Dimensionality of the destination grid [default: that of the source grid]")
                .takes_value(true)
                .possible_values(&["2", "3"]),
        )
        .arg(
            Arg::new("field")
                .short('f')
                .long("field")
                .require_equals(true)
                .value_name("DEST=LOC:SOURCE:LOC")
                .help(
                    "Destination field to produce, with its location and the source field and\n\
                     location to interpolate from (locations: center, facex, facey, facez)\n\
                     Can be repeated, and replaces any mapping in the configuration file",
                )
                .takes_value(true)
                .multiple_occurrences(true),
        )
        .arg(
            Arg::new("method")
                .long("method")
                .require_equals(true)
                .value_name("NAME")
                .help("Interpolation method to use [default: linear]")
                .takes_value(true)
                .possible_values(&["linear", "nearest"]),
        )
        .arg(
            Arg::new("workers")
                .short('w')
                .long("workers")
                .require_equals(true)
                .value_name("NUMBER")
                .help("Number of workers to share the destination blocks [default: 1]")
                .takes_value(true),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .require_equals(true)
                .value_name("PATH")
                .help("Path of a JSON file with the interpolation method, workers and field mapping")
                .takes_value(true),
        )
        .arg(
            Arg::new("overwrite")
                .long("overwrite")
                .help("Overwrite the output file if it already exists"),
        )
        .arg(
            Arg::new("no-file")
                .long("no-file")
                .help("Perform the interpolation without writing an output file"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print status messages while interpolating"),
        )
        .arg(
            Arg::new("progress")
                .short('p')
                .long("progress")
                .help("Show progress bar for interpolation (also implies `verbose`)"),
        )
}

/// Runs the actions for the `interp` subcommand using the given arguments.
pub fn run_interp_subcommand(arguments: &ArgMatches) {
    let verbosity = cli_utils::parse_verbosity(arguments, true);

    let geometry_path = PathBuf::from(
        arguments
            .value_of("source-geometry")
            .expect("No value for required argument"),
    );
    if verbosity.print_messages() {
        println!("Reading source geometry from {}", geometry_path.display());
    }
    let geometry = exit_on_error!(
        SourceGeometry::from_json_file(&geometry_path),
        "Error: Could not read source geometry: {}"
    );
    let source = exit_on_error!(
        GridTopology::from_source_geometry(&geometry),
        "Error: Could not construct source grid: {}"
    );

    let config = construct_remap_config_from_options(arguments, verbosity);

    let requested_grid = RequestedGridConfig {
        dimensionality: cli_utils::get_value_from_parseable_argument(arguments, "ndim")
            .unwrap_or_else(|| source.dimensionality().num()),
        axis_block_counts: cli_utils::parse_3d_values(arguments, "blocks", 1),
        block_sizes: cli_utils::parse_3d_values(arguments, "shape", 1),
        face_coords: [None, None, None],
        storage_path: PathBuf::from(
            arguments
                .value_of("output")
                .expect("No value for argument with default"),
        ),
    };
    let destination = exit_on_error!(
        GridTopology::from_requested_grid(&requested_grid, source.physical_ranges()),
        "Error: Could not construct destination grid: {}"
    );
    exit_on_error!(
        remap::verify_compatible(&destination, &source, &config.mapping),
        "Error: {}"
    );

    if config.verbosity.print_messages() {
        println!(
            "Source grid: {} {} blocks of {} cells, destination grid: {} {} blocks of {} cells",
            source.dimensionality(),
            source.axis_block_counts(),
            source.block_sizes(),
            destination.dimensionality(),
            destination.axis_block_counts(),
            destination.block_sizes()
        );
    }

    let source_data_path = arguments
        .value_of("source-data")
        .map(PathBuf::from)
        .unwrap_or_else(|| geometry.storage_path.clone());

    run_with_hdf5_storage(
        arguments,
        &destination,
        &source,
        &config,
        &source_data_path,
    );
}

fn construct_remap_config_from_options(arguments: &ArgMatches, verbosity: Verbosity) -> RemapConfig {
    let mut config = match arguments.value_of("config") {
        Some(config_path) => exit_on_error!(
            RemapConfig::from_json_file(config_path),
            "Error: Could not read configuration: {}"
        ),
        None => RemapConfig::default(),
    };
    if let Some(method) = cli_utils::get_value_from_parseable_argument(arguments, "method") {
        config.method = method;
    }
    if let Some(num_workers) = cli_utils::get_value_from_parseable_argument(arguments, "workers") {
        config.num_workers = num_workers;
    }
    if let Some(entry_strings) = arguments.values_of("field") {
        config.mapping = exit_on_error!(
            FieldMapping::parse_entries(entry_strings),
            "Error: Could not parse field mapping: {}"
        );
    }
    exit_on_false!(
        !config.mapping.is_empty(),
        "Error: No fields to interpolate\n\
         Tip: Use --field=DEST=LOC:SOURCE:LOC or a mapping in the --config file"
    );
    exit_on_false!(
        config.num_workers > 0,
        "Error: Number of workers must be at least 1"
    );
    config.verbosity = verbosity;
    config
}

#[cfg(feature = "hdf5")]
fn run_with_hdf5_storage(
    arguments: &ArgMatches,
    destination: &GridTopology,
    source: &GridTopology,
    config: &RemapConfig,
    source_data_path: &Path,
) {
    if config.verbosity.print_messages() {
        println!("Reading source fields from {}", source_data_path.display());
    }
    let source_storage = exit_on_error!(
        Hdf5FieldStorage::open(source_data_path),
        "Error: Could not open source data: {}"
    );

    if arguments.is_present("no-file") {
        let mut destination_storage = MemoryFieldStorage::new();
        exit_on_error!(
            remap::remap_with_config(
                destination,
                source,
                config,
                &source_storage,
                &mut destination_storage
            ),
            "Error: Interpolation failed: {}"
        );
        if config.verbosity.print_messages() {
            println!("Interpolated fields were not written to file");
        }
        return;
    }

    let output_path = destination.storage_path();
    if config.verbosity.print_messages() {
        println!("Writing interpolated fields to {}", output_path.display());
    }
    let mut destination_storage = exit_on_error!(
        Hdf5FieldStorage::create(output_path, arguments.is_present("overwrite")),
        "Error: Could not create output file: {}"
    );
    let result = remap::remap_with_config(
        destination,
        source,
        config,
        &source_storage,
        &mut destination_storage,
    );
    drop(destination_storage);

    if let Err(err) = result {
        if let Err(remove_err) = std::fs::remove_file(output_path) {
            eprintln!(
                "Warning: Could not remove incomplete output file {}: {}",
                output_path.display(),
                remove_err
            );
        }
        exit_with_error!("Error: Interpolation failed: {}", err);
    }
}

#[cfg(not(feature = "hdf5"))]
fn run_with_hdf5_storage(
    _arguments: &ArgMatches,
    _destination: &GridTopology,
    _source: &GridTopology,
    _config: &RemapConfig,
    _source_data_path: &Path,
) {
    exit_with_error!(
        "Error: Compile with hdf5 feature in order to read and write HDF5 files\n\
         Tip: Use cargo flag --features=hdf5 and make sure the HDF5 library is available"
    );
}
