//! Command line interface.

pub mod build;
pub mod interp;
pub mod run;
pub mod utils;
