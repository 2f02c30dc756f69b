//! Utilities for creating the command line interface.

use crate::{exit_on_error, exit_on_false, io::Verbosity};
use clap::ArgMatches;
use std::str::FromStr;

pub fn parse_value_string<T>(argument_name: &str, value_string: &str) -> T
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    exit_on_error!(
        value_string.trim().parse(),
        "Error: Could not parse value for {0}: {1}",
        argument_name
    )
}

fn parse_value_strings<'a, 'b, T, I>(argument_name: &'a str, value_strings: I) -> Vec<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
    I: Iterator<Item = &'b str>,
{
    value_strings
        .filter_map(|value_string| {
            if value_string.is_empty() {
                None
            } else {
                Some(parse_value_string(argument_name, value_string))
            }
        })
        .collect()
}

pub fn get_value_from_parseable_argument<T>(arguments: &ArgMatches, argument_name: &str) -> Option<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    arguments
        .value_of(argument_name)
        .map(|value_string| parse_value_string(argument_name, value_string))
}

pub fn get_values_from_required_parseable_argument<T>(
    arguments: &ArgMatches,
    argument_name: &str,
) -> Vec<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    parse_value_strings(
        argument_name,
        arguments
            .values_of(argument_name)
            .expect("No values for required argument"),
    )
}

/// Parses two or three comma-separated values for the x-, y- and (optionally)
/// z-axis, with a missing z-value taken as `missing_z_value`.
pub fn parse_3d_values<T>(arguments: &ArgMatches, argument_name: &str, missing_z_value: T) -> [T; 3]
where
    T: FromStr + Copy,
    <T as FromStr>::Err: std::fmt::Display,
{
    let values: Vec<T> = get_values_from_required_parseable_argument(arguments, argument_name);
    exit_on_false!(
        values.len() == 2 || values.len() == 3,
        "Error: {} must have 2 or 3 values, got {}",
        argument_name,
        values.len()
    );
    [
        values[0],
        values[1],
        values.get(2).copied().unwrap_or(missing_z_value),
    ]
}

pub fn parse_verbosity(arguments: &ArgMatches, support_progress: bool) -> Verbosity {
    if support_progress && arguments.is_present("progress") {
        Verbosity::progress()
    } else if arguments.is_present("verbose") {
        Verbosity::Messages
    } else {
        Verbosity::Quiet
    }
}
