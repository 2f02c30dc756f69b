//! Error types for topology construction and remapping.

use crate::interpolation::InterpolationError;
use std::io;
use thiserror::Error;

/// Errors that can abort a remapping run.
#[derive(Error, Debug)]
pub enum RemapError {
    /// Grid geometry or configuration is internally inconsistent.
    #[error("Invalid grid geometry: {0}")]
    Geometry(String),

    /// Source and destination grids can not be combined.
    #[error("Incompatible source and destination grids: {0}")]
    IncompatibleGrids(String),

    /// Reading from or writing to field storage failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The interpolation of a destination block failed.
    #[error("Interpolation failed: {0}")]
    Interpolation(#[from] InterpolationError),
}

impl RemapError {
    /// Creates a geometry error.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry(message.into())
    }

    /// Creates an incompatible grids error.
    pub fn incompatible_grids(message: impl Into<String>) -> Self {
        Self::IncompatibleGrids(message.into())
    }
}

pub type RemapResult<T> = Result<T, RemapError>;

/// Returns early with a `RemapError::Geometry` built from a format string.
#[macro_export]
macro_rules! geometry_bail {
    ($($fmt_arg:tt)*) => {
        return Err($crate::error::RemapError::Geometry(format!($($fmt_arg)*)))
    };
}

#[cfg(not(feature = "for-testing"))]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        eprintln!($($print_arg)*);
        quit::with_code(1);
    }};
}

#[cfg(feature = "for-testing")]
#[macro_export]
macro_rules! exit_with_error {
    ($($print_arg:tt)*) => {{
        panic!($($print_arg)*);
    }};
}

#[macro_export]
macro_rules! exit_on_error {
    ($result:expr, $($print_arg:tt)*) => {
        match $result {
            Ok(value) => value,
            Err(err) => {
                $crate::exit_with_error!($($print_arg)*, err)
            }
        }
    };
}

#[macro_export]
macro_rules! exit_on_false {
    ($logic:expr, $($print_arg:tt)*) => {
        if $logic {
            true
        } else {
            $crate::exit_with_error!($($print_arg)*)
        }
    };
}

/// Creates an `io::Error` of the given kind with a formatted message,
/// wrapped in `Err`.
#[macro_export]
macro_rules! io_result {
    ($kind:ident, $($fmt_arg:tt)*) => {
        Err(::std::io::Error::new(
            ::std::io::ErrorKind::$kind,
            format!($($fmt_arg)*),
        ))
    };
}
