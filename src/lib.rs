//! The `blockremap` crate maps fields stored on one block-decomposed
//! structured grid onto another block-decomposed structured grid.
//!
//! A typical run builds a [`grid::topology::GridTopology`] for the source
//! simulation and one for the requested destination grid, and then streams
//! every destination block through [`remap::interpolate`].

pub mod error;
pub mod geometry;
pub mod grid;
pub mod interpolation;
pub mod io;
pub mod num;
pub mod remap;
pub mod storage;

#[cfg(feature = "cli")]
pub mod cli;
