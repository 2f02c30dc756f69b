//! Block-decomposed structured grids.

pub mod index;
pub mod locate;
pub mod topology;

use crate::{
    error::{RemapError, RemapResult},
    geometry::{Dim3, In3D},
};
use std::{fmt, str::FromStr};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

/// Floating-point precision to use for grid coordinates.
#[allow(non_camel_case_types)]
pub type fgr = f64;

/// Location within a grid cell where the values of a field are specified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(rename_all = "lowercase"))]
pub enum StaggeringLocation {
    Center = 0,
    FaceX = 1,
    FaceY = 2,
    FaceZ = 3,
}

impl StaggeringLocation {
    /// Creates an array for iterating over all locations.
    pub fn slice() -> [Self; 4] {
        [Self::Center, Self::FaceX, Self::FaceY, Self::FaceZ]
    }

    /// Returns the face-centered location along the given dimension.
    pub fn face(dim: Dim3) -> Self {
        match dim {
            Dim3::X => Self::FaceX,
            Dim3::Y => Self::FaceY,
            Dim3::Z => Self::FaceZ,
        }
    }

    /// Returns the dimension whose faces hold the values, or `None` for
    /// cell centers.
    pub fn face_dim(self) -> Option<Dim3> {
        match self {
            Self::Center => None,
            Self::FaceX => Some(Dim3::X),
            Self::FaceY => Some(Dim3::Y),
            Self::FaceZ => Some(Dim3::Z),
        }
    }

    /// Whether the values are staggered to the faces normal to the given dimension.
    pub fn is_staggered_along(self, dim: Dim3) -> bool {
        self.face_dim() == Some(dim)
    }

    /// Returns the number of extra points per block along each dimension.
    pub fn face_shift(self) -> In3D<usize> {
        In3D::with_each_component(|dim| usize::from(self.is_staggered_along(dim)))
    }

    /// Returns the name used for the location in configuration and on the
    /// command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Center => "center",
            Self::FaceX => "facex",
            Self::FaceY => "facey",
            Self::FaceZ => "facez",
        }
    }
}

impl fmt::Display for StaggeringLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StaggeringLocation {
    type Err = RemapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "center" => Ok(Self::Center),
            "facex" => Ok(Self::FaceX),
            "facey" => Ok(Self::FaceY),
            "facez" => Ok(Self::FaceZ),
            invalid => Err(RemapError::geometry(format!(
                "Invalid staggering location {}, valid locations are center, facex, facey and facez",
                invalid
            ))),
        }
    }
}

/// Number of topological dimensions of a grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(try_from = "usize", into = "usize"))]
pub enum Dimensionality {
    Two = 2,
    Three = 3,
}

impl Dimensionality {
    /// Returns the number of dimensions.
    pub fn num(self) -> usize {
        self as usize
    }

    /// Returns the dimensions along which the grid varies.
    pub fn active_dims(self) -> &'static [Dim3] {
        match self {
            Self::Two => &[Dim3::X, Dim3::Y],
            Self::Three => &[Dim3::X, Dim3::Y, Dim3::Z],
        }
    }

    /// Whether the grid varies along the given dimension.
    pub fn is_active(self, dim: Dim3) -> bool {
        self.active_dims().contains(&dim)
    }

    /// Whether a field at the given location can be stored on a grid of
    /// this dimensionality.
    pub fn supports(self, location: StaggeringLocation) -> bool {
        location
            .face_dim()
            .map_or(true, |face_dim| self.is_active(face_dim))
    }
}

impl TryFrom<usize> for Dimensionality {
    type Error = RemapError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            invalid => Err(RemapError::geometry(format!(
                "Unsupported dimensionality {}, only 2D and 3D grids can be interpolated",
                invalid
            ))),
        }
    }
}

impl From<Dimensionality> for usize {
    fn from(dimensionality: Dimensionality) -> Self {
        dimensionality.num()
    }
}

impl fmt::Display for Dimensionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.num())
    }
}

/// Computes `n_cells + 1` uniformly spaced face coordinates spanning the given bounds.
pub fn uniform_face_coords(n_cells: usize, lower_bound: fgr, upper_bound: fgr) -> Vec<fgr> {
    let cell_extent = (upper_bound - lower_bound) / (n_cells as fgr);
    (0..=n_cells)
        .map(|idx| {
            if idx == n_cells {
                upper_bound
            } else {
                lower_bound + (idx as fgr) * cell_extent
            }
        })
        .collect()
}

/// Computes the cell center coordinates between consecutive face coordinates.
pub fn center_coords_from_faces(face_coords: &[fgr]) -> Vec<fgr> {
    face_coords
        .windows(2)
        .map(|faces| 0.5 * (faces[0] + faces[1]))
        .collect()
}

/// Checks that the given coordinates are finite and strictly increasing.
pub fn verify_increasing_coords(coords: &[fgr], dim: Dim3) -> RemapResult<()> {
    if let Some(value) = coords.iter().find(|value| !value.is_finite()) {
        return Err(RemapError::geometry(format!(
            "Non-finite {}-coordinate {}",
            dim, value
        )));
    }
    match coords.windows(2).position(|pair| pair[1] <= pair[0]) {
        Some(idx) => Err(RemapError::geometry(format!(
            "{}-coordinates are not strictly increasing at index {} ({} followed by {})",
            dim,
            idx,
            coords[idx],
            coords[idx + 1]
        ))),
        None => Ok(()),
    }
}
