//! Block decompositions of a rectangular domain.

use super::{
    center_coords_from_faces, fgr, index, uniform_face_coords, verify_increasing_coords,
    Dimensionality, StaggeringLocation,
};
use crate::{
    error::{RemapError, RemapResult},
    geometry::{
        BoundingBox3,
        Dim3::{self, X, Y, Z},
        Idx3, In3D, Interval, Point3,
    },
    geometry_bail,
    num::approx_eq_scaled,
    storage::DatasetShape,
};
use std::{
    ops::Range,
    path::{Path, PathBuf},
};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "json")]
use std::{fs, io};

/// Relative tolerance (with respect to the domain extent) used when
/// comparing block extents to face coordinates.
pub const GEOMETRY_TOLERANCE: fgr = 1e-9;

/// Already parsed geometry of an existing block-decomposed simulation output.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct SourceGeometry {
    /// Number of topological dimensions (2 or 3).
    pub dimensionality: usize,
    /// Number of blocks along each axis.
    pub axis_block_counts: [usize; 3],
    /// Number of cells in each block along each axis.
    pub block_sizes: [usize; 3],
    /// Physical `(lower, upper)` bounds of the domain along each axis.
    pub physical_ranges: [Interval<fgr>; 3],
    /// Physical `(lower, upper)` extents of each block along each axis.
    pub bounding_boxes: Vec<[Interval<fgr>; 3]>,
    /// Physical center coordinates of each block.
    pub centers: Vec<[fgr; 3]>,
    /// For each axis, the face coordinates of each block along that axis
    /// (`block_size + 1` values per block). Only required for axes the grid
    /// varies along.
    #[cfg_attr(feature = "serialization", serde(default))]
    pub face_coords: [Option<Vec<Vec<fgr>>>; 3],
    /// Path of the container holding the field data.
    pub storage_path: PathBuf,
}

impl SourceGeometry {
    /// Reads a source geometry from a JSON file.
    #[cfg(feature = "json")]
    pub fn from_json_file<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let text = fs::read_to_string(file_path.as_ref())?;
        serde_json::from_str(&text).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Could not parse source geometry in {}: {}",
                    file_path.as_ref().display(),
                    err
                ),
            )
        })
    }
}

/// Configuration for a uniform block decomposition to interpolate onto.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct RequestedGridConfig {
    /// Number of topological dimensions (2 or 3). Default: 3.
    pub dimensionality: usize,
    /// Number of blocks along each axis. Default: 1 along each axis.
    pub axis_block_counts: [usize; 3],
    /// Number of cells in each block along each axis. Default: 8 along each axis.
    pub block_sizes: [usize; 3],
    /// Explicit face coordinates spanning the whole domain along each axis
    /// (`block_count * block_size + 1` values). Axes without coordinates get
    /// uniform spacing between the bounds of the source domain. Default: none.
    pub face_coords: [Option<Vec<fgr>>; 3],
    /// Path of the container to write the interpolated fields to.
    /// Default: `initial_block.h5`.
    pub storage_path: PathBuf,
}

impl Default for RequestedGridConfig {
    fn default() -> Self {
        Self {
            dimensionality: 3,
            axis_block_counts: [1, 1, 1],
            block_sizes: [8, 8, 8],
            face_coords: [None, None, None],
            storage_path: PathBuf::from("initial_block.h5"),
        }
    }
}

impl RequestedGridConfig {
    /// Checks that the configuration describes a valid decomposition.
    ///
    /// The z-axis entries are ignored for 2D grids.
    pub fn validate(&self) -> RemapResult<()> {
        let dimensionality = Dimensionality::try_from(self.dimensionality)?;
        for &dim in dimensionality.active_dims() {
            let (count, size) = (
                self.axis_block_counts[dim.num()],
                self.block_sizes[dim.num()],
            );
            if count == 0 || size == 0 {
                geometry_bail!(
                    "Requested grid must have at least one block of at least one cell along {}, got {} blocks of {} cells",
                    dim,
                    count,
                    size
                );
            }
            if let Some(coords) = &self.face_coords[dim.num()] {
                if coords.len() != count * size + 1 {
                    geometry_bail!(
                        "Requested grid needs {} {}-face coordinates for {} blocks of {} cells, got {}",
                        count * size + 1,
                        dim,
                        count,
                        size,
                        coords.len()
                    );
                }
                verify_increasing_coords(coords, dim)?;
            }
        }
        Ok(())
    }
}

/// Immutable description of how a rectangular domain is split into
/// equally shaped blocks of cells.
#[derive(Clone, Debug)]
pub struct GridTopology {
    dimensionality: Dimensionality,
    axis_block_counts: In3D<usize>,
    block_sizes: In3D<usize>,
    bounding_boxes: Vec<BoundingBox3<fgr>>,
    centers: Vec<Point3<fgr>>,
    grids: [In3D<Vec<fgr>>; 4],
    physical_ranges: In3D<Interval<fgr>>,
    lattice_indices: Vec<Idx3<usize>>,
    storage_path: PathBuf,
}

impl GridTopology {
    /// Builds the topology of an existing simulation output from its parsed geometry.
    ///
    /// The face coordinates spanning the whole domain are reconstructed from the
    /// per-block face coordinates of one block at every lattice position.
    pub fn from_source_geometry(geometry: &SourceGeometry) -> RemapResult<Self> {
        let dimensionality = Dimensionality::try_from(geometry.dimensionality)?;
        let axis_block_counts = In3D::from(geometry.axis_block_counts);
        let block_sizes = In3D::from(geometry.block_sizes);
        verify_block_layout(dimensionality, &axis_block_counts, &block_sizes)?;

        let num_blocks = axis_block_counts.iter().product::<usize>();
        if geometry.bounding_boxes.len() != num_blocks {
            geometry_bail!(
                "Expected {} bounding boxes for {} blocks, got {}",
                num_blocks,
                axis_block_counts,
                geometry.bounding_boxes.len()
            );
        }
        if geometry.centers.len() != num_blocks {
            geometry_bail!(
                "Expected {} block centers for {} blocks, got {}",
                num_blocks,
                axis_block_counts,
                geometry.centers.len()
            );
        }

        let mut bounding_boxes: Vec<_> = geometry
            .bounding_boxes
            .iter()
            .map(|intervals| BoundingBox3::from_intervals(&In3D::from(*intervals)))
            .collect();
        let mut centers: Vec<_> = geometry.centers.iter().map(|&c| Point3::from(c)).collect();

        if dimensionality == Dimensionality::Two {
            // The degenerate z-axis always spans the unit interval
            for (bounding_box, center) in bounding_boxes.iter_mut().zip(centers.iter_mut()) {
                *bounding_box = BoundingBox3::new(
                    Point3::new(bounding_box.lower()[X], bounding_box.lower()[Y], 0.0),
                    Point3::new(bounding_box.upper()[X], bounding_box.upper()[Y], 1.0),
                );
                center[Z] = 0.5;
            }
        }

        if let Some(center) = centers
            .iter()
            .find(|center| center.iter().any(|coord| !coord.is_finite()))
        {
            geometry_bail!("Non-finite block center {}", center);
        }

        let lattice_indices = index::lattice_indices_from_centers(&centers, &axis_block_counts)?;

        let face_coords: In3D<Vec<fgr>> = Dim3::slice()
            .iter()
            .map(|&dim| {
                if dimensionality.is_active(dim) {
                    reconstruct_domain_faces(
                        dim,
                        geometry.face_coords[dim.num()].as_deref(),
                        &lattice_indices,
                        axis_block_counts[dim],
                        block_sizes[dim],
                    )
                } else {
                    Ok(vec![0.0, 1.0])
                }
            })
            .collect::<RemapResult<Vec<_>>>()?
            .into_iter()
            .collect();

        for &dim in dimensionality.active_dims() {
            let (lower, upper) = geometry.physical_ranges[dim.num()];
            let faces = &face_coords[dim];
            let extent = upper - lower;
            if !approx_eq_scaled(faces[0], lower, extent, GEOMETRY_TOLERANCE)
                || !approx_eq_scaled(faces[faces.len() - 1], upper, extent, GEOMETRY_TOLERANCE)
            {
                geometry_bail!(
                    "Domain spans [{}, {}] along {}, but the block faces span [{}, {}]",
                    lower,
                    upper,
                    dim,
                    faces[0],
                    faces[faces.len() - 1]
                );
            }
        }

        Self::from_parts(
            dimensionality,
            axis_block_counts,
            block_sizes,
            face_coords,
            bounding_boxes,
            centers,
            lattice_indices,
            geometry.storage_path.clone(),
        )
    }

    /// Builds the topology of a uniform block decomposition as requested by
    /// the given configuration.
    ///
    /// Axes without explicit face coordinates are spaced uniformly between
    /// the given domain bounds (normally those of the source grid). For 2D
    /// grids the z-axis is a single cell spanning the unit interval.
    ///
    /// Blocks are numbered with the x-index varying fastest.
    pub fn from_requested_grid(
        config: &RequestedGridConfig,
        domain_ranges: &In3D<Interval<fgr>>,
    ) -> RemapResult<Self> {
        config.validate()?;
        let dimensionality = Dimensionality::try_from(config.dimensionality)?;

        let mut axis_block_counts = In3D::from(config.axis_block_counts);
        let mut block_sizes = In3D::from(config.block_sizes);
        if dimensionality == Dimensionality::Two {
            axis_block_counts[Z] = 1;
            block_sizes[Z] = 1;
        }

        let face_coords = In3D::with_each_component(|dim| {
            if !dimensionality.is_active(dim) {
                vec![0.0, 1.0]
            } else if let Some(coords) = &config.face_coords[dim.num()] {
                coords.clone()
            } else {
                let (lower, upper) = domain_ranges[dim];
                uniform_face_coords(axis_block_counts[dim] * block_sizes[dim], lower, upper)
            }
        });

        let num_blocks = axis_block_counts.iter().product::<usize>();
        let mut bounding_boxes = Vec::with_capacity(num_blocks);
        let mut centers = Vec::with_capacity(num_blocks);
        let mut lattice_indices = Vec::with_capacity(num_blocks);

        for k in 0..axis_block_counts[Z] {
            for j in 0..axis_block_counts[Y] {
                for i in 0..axis_block_counts[X] {
                    let lattice_idx = Idx3::new(i, j, k);
                    let bounding_box = BoundingBox3::from_intervals(&In3D::with_each_component(
                        |dim| {
                            let size = block_sizes[dim];
                            (
                                face_coords[dim][lattice_idx[dim] * size],
                                face_coords[dim][(lattice_idx[dim] + 1) * size],
                            )
                        },
                    ));
                    centers.push(bounding_box.center());
                    bounding_boxes.push(bounding_box);
                    lattice_indices.push(lattice_idx);
                }
            }
        }

        Self::from_parts(
            dimensionality,
            axis_block_counts,
            block_sizes,
            face_coords,
            bounding_boxes,
            centers,
            lattice_indices,
            config.storage_path.clone(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        dimensionality: Dimensionality,
        axis_block_counts: In3D<usize>,
        block_sizes: In3D<usize>,
        face_coords: In3D<Vec<fgr>>,
        bounding_boxes: Vec<BoundingBox3<fgr>>,
        centers: Vec<Point3<fgr>>,
        lattice_indices: Vec<Idx3<usize>>,
        storage_path: PathBuf,
    ) -> RemapResult<Self> {
        verify_block_layout(dimensionality, &axis_block_counts, &block_sizes)?;

        for dim in Dim3::slice() {
            let n_faces = axis_block_counts[dim] * block_sizes[dim] + 1;
            if face_coords[dim].len() != n_faces {
                geometry_bail!(
                    "Expected {} {}-face coordinates for {} blocks of {} cells, got {}",
                    n_faces,
                    dim,
                    axis_block_counts[dim],
                    block_sizes[dim],
                    face_coords[dim].len()
                );
            }
            verify_increasing_coords(&face_coords[dim], dim)?;
        }

        let physical_ranges = face_coords.map(|coords| (coords[0], coords[coords.len() - 1]));

        verify_blocks_match_faces(
            &face_coords,
            &block_sizes,
            &physical_ranges,
            &bounding_boxes,
            &centers,
            &lattice_indices,
        )?;

        let grids = StaggeringLocation::slice().map(|location| {
            In3D::with_each_component(|dim| {
                if location.is_staggered_along(dim) {
                    face_coords[dim].clone()
                } else {
                    center_coords_from_faces(&face_coords[dim])
                }
            })
        });

        Ok(Self {
            dimensionality,
            axis_block_counts,
            block_sizes,
            bounding_boxes,
            centers,
            grids,
            physical_ranges,
            lattice_indices,
            storage_path,
        })
    }

    pub fn dimensionality(&self) -> Dimensionality {
        self.dimensionality
    }

    /// Returns the number of blocks along each axis.
    pub fn axis_block_counts(&self) -> &In3D<usize> {
        &self.axis_block_counts
    }

    /// Returns the number of cells in a block along each axis.
    pub fn block_sizes(&self) -> &In3D<usize> {
        &self.block_sizes
    }

    /// Returns the total number of blocks.
    pub fn num_blocks(&self) -> usize {
        self.bounding_boxes.len()
    }

    pub fn bounding_boxes(&self) -> &[BoundingBox3<fgr>] {
        &self.bounding_boxes
    }

    pub fn bounding_box(&self, block: usize) -> &BoundingBox3<fgr> {
        &self.bounding_boxes[block]
    }

    pub fn centers(&self) -> &[Point3<fgr>] {
        &self.centers
    }

    /// Returns the `(lower, upper)` bounds of the domain along each axis.
    pub fn physical_ranges(&self) -> &In3D<Interval<fgr>> {
        &self.physical_ranges
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the position of the given block in the lattice of blocks.
    pub fn lattice_index(&self, block: usize) -> &Idx3<usize> {
        &self.lattice_indices[block]
    }

    /// Returns the coordinates along the given axis of all points at the
    /// given staggering location, spanning the whole domain.
    pub fn axis_coords(&self, location: StaggeringLocation, dim: Dim3) -> &[fgr] {
        &self.grids[location as usize][dim]
    }

    /// Returns the coordinates along the given axis of the points at the given
    /// staggering location inside the blocks at the given lattice positions.
    ///
    /// Blocks sharing a face share the coordinates on that face.
    pub fn span_coords(
        &self,
        location: StaggeringLocation,
        dim: Dim3,
        lattice_span: Range<usize>,
    ) -> &[fgr] {
        let size = self.block_sizes[dim];
        let shift = location.face_shift()[dim];
        &self.axis_coords(location, dim)[lattice_span.start * size..lattice_span.end * size + shift]
    }

    /// Returns the coordinates along the given axis of the points at the
    /// given staggering location inside a block at the given lattice position.
    pub fn block_coords(
        &self,
        location: StaggeringLocation,
        dim: Dim3,
        lattice_idx: usize,
    ) -> &[fgr] {
        self.span_coords(location, dim, lattice_idx..lattice_idx + 1)
    }

    /// Returns the `(nz, ny, nx)` shape of the values of a single block at
    /// the given staggering location.
    pub fn block_array_shape(&self, location: StaggeringLocation) -> (usize, usize, usize) {
        let shift = location.face_shift();
        (
            self.block_sizes[Z] + shift[Z],
            self.block_sizes[Y] + shift[Y],
            self.block_sizes[X] + shift[X],
        )
    }

    /// Returns the `(num_blocks, nz, ny, nx)` shape of a stored field at the
    /// given staggering location.
    pub fn dataset_shape(&self, location: StaggeringLocation) -> DatasetShape {
        let (nz, ny, nx) = self.block_array_shape(location);
        [self.num_blocks(), nz, ny, nx]
    }

    /// Describes this grid in the form accepted by `from_source_geometry`,
    /// with the given path as the location of the field data.
    pub fn to_source_geometry<P: AsRef<Path>>(&self, storage_path: P) -> SourceGeometry {
        SourceGeometry {
            dimensionality: self.dimensionality.num(),
            axis_block_counts: self.axis_block_counts.to_array(),
            block_sizes: self.block_sizes.to_array(),
            physical_ranges: self.physical_ranges.to_array(),
            bounding_boxes: self
                .bounding_boxes
                .iter()
                .map(|bounding_box| [X, Y, Z].map(|dim| bounding_box.interval(dim)))
                .collect(),
            centers: self.centers.iter().map(|center| center.to_array()).collect(),
            face_coords: [X, Y, Z].map(|dim| {
                if self.dimensionality.is_active(dim) {
                    Some(
                        self.lattice_indices
                            .iter()
                            .map(|lattice_idx| {
                                self.block_coords(StaggeringLocation::face(dim), dim, lattice_idx[dim])
                                    .to_vec()
                            })
                            .collect(),
                    )
                } else {
                    None
                }
            }),
            storage_path: storage_path.as_ref().to_path_buf(),
        }
    }
}

fn verify_block_layout(
    dimensionality: Dimensionality,
    axis_block_counts: &In3D<usize>,
    block_sizes: &In3D<usize>,
) -> RemapResult<()> {
    for dim in Dim3::slice() {
        if axis_block_counts[dim] == 0 || block_sizes[dim] == 0 {
            geometry_bail!(
                "Block counts and sizes must be positive, got {} blocks of {} cells",
                axis_block_counts,
                block_sizes
            );
        }
    }
    if dimensionality == Dimensionality::Two
        && (axis_block_counts[Z] != 1 || block_sizes[Z] != 1)
    {
        geometry_bail!(
            "2D grids must have a single block of one cell along z, got {} blocks of {} cells",
            axis_block_counts[Z],
            block_sizes[Z]
        );
    }
    Ok(())
}

fn reconstruct_domain_faces(
    dim: Dim3,
    block_face_coords: Option<&[Vec<fgr>]>,
    lattice_indices: &[Idx3<usize>],
    block_count: usize,
    block_size: usize,
) -> RemapResult<Vec<fgr>> {
    let block_face_coords = match block_face_coords {
        Some(coords) => coords,
        None => geometry_bail!("Missing {}-face coordinates for {} grid axis", dim, dim),
    };
    if block_face_coords.len() != lattice_indices.len() {
        geometry_bail!(
            "Expected {}-face coordinates for {} blocks, got {}",
            dim,
            lattice_indices.len(),
            block_face_coords.len()
        );
    }
    if let Some(coords) = block_face_coords
        .iter()
        .find(|coords| coords.len() != block_size + 1)
    {
        geometry_bail!(
            "Expected {} {}-face coordinates per block of {} cells, got {}",
            block_size + 1,
            dim,
            block_size,
            coords.len()
        );
    }

    let mut domain_faces = Vec::with_capacity(block_count * block_size + 1);
    for position in 0..block_count {
        let block = lattice_indices
            .iter()
            .position(|lattice_idx| lattice_idx[dim] == position)
            .ok_or_else(|| {
                RemapError::geometry(format!("No block at {}-lattice position {}", dim, position))
            })?;
        let coords = &block_face_coords[block];
        domain_faces.extend_from_slice(&coords[..block_size]);
        if position + 1 == block_count {
            domain_faces.push(coords[block_size]);
        }
    }
    Ok(domain_faces)
}

fn verify_blocks_match_faces(
    face_coords: &In3D<Vec<fgr>>,
    block_sizes: &In3D<usize>,
    physical_ranges: &In3D<Interval<fgr>>,
    bounding_boxes: &[BoundingBox3<fgr>],
    centers: &[Point3<fgr>],
    lattice_indices: &[Idx3<usize>],
) -> RemapResult<()> {
    if bounding_boxes.len() != lattice_indices.len() || centers.len() != lattice_indices.len() {
        geometry_bail!(
            "Got {} bounding boxes and {} centers for {} blocks",
            bounding_boxes.len(),
            centers.len(),
            lattice_indices.len()
        );
    }
    for (block, ((bounding_box, center), lattice_idx)) in bounding_boxes
        .iter()
        .zip(centers)
        .zip(lattice_indices)
        .enumerate()
    {
        for dim in Dim3::slice() {
            let (range_lower, range_upper) = physical_ranges[dim];
            let extent = range_upper - range_lower;
            let size = block_sizes[dim];
            let expected_lower = face_coords[dim][lattice_idx[dim] * size];
            let expected_upper = face_coords[dim][(lattice_idx[dim] + 1) * size];
            let (lower, upper) = bounding_box.interval(dim);
            let is_consistent = approx_eq_scaled(lower, expected_lower, extent, GEOMETRY_TOLERANCE)
                && approx_eq_scaled(upper, expected_upper, extent, GEOMETRY_TOLERANCE)
                && approx_eq_scaled(
                    center[dim],
                    0.5 * (expected_lower + expected_upper),
                    extent,
                    GEOMETRY_TOLERANCE,
                );
            if !is_consistent {
                geometry_bail!(
                    "Block {} spans [{}, {}] with center {} along {}, but its face coordinates span [{}, {}]",
                    block,
                    lower,
                    upper,
                    center[dim],
                    dim,
                    expected_lower,
                    expected_upper
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_cube_config(counts: [usize; 3], sizes: [usize; 3]) -> RequestedGridConfig {
        RequestedGridConfig {
            axis_block_counts: counts,
            block_sizes: sizes,
            ..RequestedGridConfig::default()
        }
    }

    fn unit_ranges() -> In3D<Interval<fgr>> {
        In3D::same((0.0, 1.0))
    }

    /// Creates source geometry equivalent to a requested grid, with blocks
    /// numbered in reverse order.
    fn geometry_from_topology(topology: &GridTopology) -> SourceGeometry {
        let mut geometry = topology.to_source_geometry("source.h5");
        geometry.bounding_boxes.reverse();
        geometry.centers.reverse();
        for block_face_coords in geometry.face_coords.iter_mut().flatten() {
            block_face_coords.reverse();
        }
        geometry
    }

    #[test]
    fn requested_grid_has_consistent_structure() {
        let topology =
            GridTopology::from_requested_grid(&unit_cube_config([2, 3, 1], [4, 2, 5]), &unit_ranges())
                .unwrap();
        assert_eq!(topology.num_blocks(), 6);
        assert_eq!(topology.axis_coords(StaggeringLocation::Center, X).len(), 8);
        assert_eq!(topology.axis_coords(StaggeringLocation::FaceX, X).len(), 9);
        assert_eq!(topology.axis_coords(StaggeringLocation::FaceX, Y).len(), 6);
        assert_eq!(topology.dataset_shape(StaggeringLocation::Center), [6, 5, 2, 4]);
        assert_eq!(topology.dataset_shape(StaggeringLocation::FaceY), [6, 5, 3, 4]);
        assert_eq!(topology.dataset_shape(StaggeringLocation::FaceZ), [6, 6, 2, 4]);

        // Block 1 is the second block along x
        assert_eq!(topology.lattice_index(1), &Idx3::new(1, 0, 0));
        assert_eq!(topology.lattice_index(2), &Idx3::new(0, 1, 0));
        let bounding_box = topology.bounding_box(1);
        assert_abs_diff_eq!(bounding_box.interval(X).0, 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(bounding_box.interval(X).1, 1.0, epsilon = 1e-15);

        let block_faces = topology.block_coords(StaggeringLocation::FaceX, X, 1);
        assert_eq!(block_faces.len(), 5);
        assert_abs_diff_eq!(block_faces[0], 0.5, epsilon = 1e-15);
        assert_abs_diff_eq!(block_faces[4], 1.0, epsilon = 1e-15);
    }

    #[test]
    fn two_dimensional_request_fixes_z_axis() {
        let config = RequestedGridConfig {
            dimensionality: 2,
            axis_block_counts: [2, 2, 7],
            block_sizes: [4, 4, 3],
            ..RequestedGridConfig::default()
        };
        let topology =
            GridTopology::from_requested_grid(&config, &In3D::new((0.0, 2.0), (0.0, 1.0), (5.0, 9.0)))
                .unwrap();
        assert_eq!(topology.num_blocks(), 4);
        assert_eq!(topology.axis_block_counts(), &In3D::new(2, 2, 1));
        assert_eq!(topology.physical_ranges()[Z], (0.0, 1.0));
        assert_eq!(topology.dataset_shape(StaggeringLocation::Center), [4, 1, 4, 4]);
        assert_eq!(topology.axis_coords(StaggeringLocation::Center, Z), &[0.5]);
    }

    #[test]
    fn explicit_coordinates_are_used() {
        let config = RequestedGridConfig {
            axis_block_counts: [1, 1, 1],
            block_sizes: [2, 1, 1],
            face_coords: [Some(vec![0.0, 0.1, 1.0]), None, None],
            ..RequestedGridConfig::default()
        };
        let topology = GridTopology::from_requested_grid(&config, &unit_ranges()).unwrap();
        let centers = topology.axis_coords(StaggeringLocation::Center, X);
        assert_abs_diff_eq!(centers[0], 0.05, epsilon = 1e-15);
        assert_abs_diff_eq!(centers[1], 0.55, epsilon = 1e-15);
    }

    #[test]
    fn invalid_requests_are_rejected() {
        let mut config = unit_cube_config([2, 2, 2], [4, 4, 4]);
        config.face_coords[Y.num()] = Some(vec![0.0, 1.0]);
        assert!(matches!(
            GridTopology::from_requested_grid(&config, &unit_ranges()),
            Err(RemapError::Geometry(_))
        ));

        let config = unit_cube_config([2, 0, 2], [4, 4, 4]);
        assert!(config.validate().is_err());

        let config = RequestedGridConfig {
            dimensionality: 4,
            ..RequestedGridConfig::default()
        };
        assert!(matches!(config.validate(), Err(RemapError::Geometry(_))));
    }

    #[test]
    fn source_geometry_reproduces_requested_topology() {
        let requested =
            GridTopology::from_requested_grid(&unit_cube_config([2, 3, 2], [4, 2, 3]), &unit_ranges())
                .unwrap();
        let geometry = geometry_from_topology(&requested);
        let source = GridTopology::from_source_geometry(&geometry).unwrap();

        assert_eq!(source.num_blocks(), requested.num_blocks());
        for location in StaggeringLocation::slice() {
            for dim in Dim3::slice() {
                let source_coords = source.axis_coords(location, dim);
                let requested_coords = requested.axis_coords(location, dim);
                assert_eq!(source_coords.len(), requested_coords.len());
                for (a, b) in source_coords.iter().zip(requested_coords) {
                    assert_abs_diff_eq!(a, b, epsilon = 1e-14);
                }
            }
        }
        // Reversed numbering puts the last requested block first
        assert_eq!(source.lattice_index(0), requested.lattice_index(11));
    }

    #[test]
    fn inconsistent_source_geometry_is_rejected() {
        let requested =
            GridTopology::from_requested_grid(&unit_cube_config([2, 2, 1], [4, 4, 4]), &unit_ranges())
                .unwrap();

        let mut geometry = geometry_from_topology(&requested);
        geometry.centers.pop();
        assert!(matches!(
            GridTopology::from_source_geometry(&geometry),
            Err(RemapError::Geometry(_))
        ));

        let mut geometry = geometry_from_topology(&requested);
        geometry.axis_block_counts = [4, 1, 1];
        assert!(matches!(
            GridTopology::from_source_geometry(&geometry),
            Err(RemapError::Geometry(_))
        ));

        let mut geometry = geometry_from_topology(&requested);
        geometry.bounding_boxes[0][0].1 += 0.1;
        assert!(matches!(
            GridTopology::from_source_geometry(&geometry),
            Err(RemapError::Geometry(_))
        ));

        let mut geometry = geometry_from_topology(&requested);
        geometry.face_coords[1] = None;
        assert!(matches!(
            GridTopology::from_source_geometry(&geometry),
            Err(RemapError::Geometry(_))
        ));

        let mut geometry = geometry_from_topology(&requested);
        geometry.dimensionality = 1;
        assert!(matches!(
            GridTopology::from_source_geometry(&geometry),
            Err(RemapError::Geometry(_))
        ));
    }
}
