//! Function for running the command line program.

use super::{build, interp::run_interp_subcommand};
use clap::ArgMatches;
use std::time::Instant;

/// Runs the `blockremap` command line program.
pub fn run() {
    let command = build::build();
    run_with_args(command.get_matches());
}

/// Runs the `blockremap` command line program with the given parsed arguments.
pub fn run_with_args(arguments: ArgMatches) {
    let start_instant = Instant::now();

    if let Some(interp_arguments) = arguments.subcommand_matches("interp") {
        run_interp_subcommand(interp_arguments);
    }

    if arguments.is_present("timing") {
        println!("Elapsed time: {} s", start_instant.elapsed().as_secs_f64());
    }
}
