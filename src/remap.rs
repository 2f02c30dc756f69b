//! Interpolation of fields from the blocks of one grid onto the blocks of another.

pub mod gather;
pub mod partition;

use self::{gather::gather_local_patch, partition::WorkerRange};
use crate::{
    error::{RemapError, RemapResult},
    geometry::{
        Dim3::{self, X, Y, Z},
        In3D,
    },
    grid::{topology::GridTopology, Dimensionality, StaggeringLocation},
    interpolation::{InterpolationError, InterpolationMethod, RegularGridInterpolator},
    io::Verbosity,
    num::finite_min_max,
    storage::{fdt, FieldSink, FieldSource},
};
use indicatif::ProgressBar;
use ndarray::prelude::*;
use rayon::prelude::*;
use std::{collections::HashSet, ops::Range, str::FromStr};

#[cfg(feature = "serialization")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "json")]
use std::{fs, io, path::Path};

/// Specifies how the values of one destination field are obtained from the source.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
pub struct FieldMappingEntry {
    /// Name of the field in the destination container.
    pub destination_field: String,
    /// Where in the destination cells the values are defined.
    pub destination_location: StaggeringLocation,
    /// Name of the field in the source container.
    pub source_field: String,
    /// Where in the source cells the values are defined.
    pub source_location: StaggeringLocation,
}

impl FieldMappingEntry {
    pub fn new<D: Into<String>, S: Into<String>>(
        destination_field: D,
        destination_location: StaggeringLocation,
        source_field: S,
        source_location: StaggeringLocation,
    ) -> Self {
        Self {
            destination_field: destination_field.into(),
            destination_location,
            source_field: source_field.into(),
            source_location,
        }
    }
}

impl FromStr for FieldMappingEntry {
    type Err = RemapError;

    /// Parses an entry of the form `DEST=DEST_LOC:SOURCE:SOURCE_LOC`,
    /// e.g. `magx=facex:magx:facex`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            RemapError::geometry(format!(
                "Invalid field mapping {}, expected DEST=DEST_LOC:SOURCE:SOURCE_LOC",
                s
            ))
        };
        let (destination_field, source_part) = s.split_once('=').ok_or_else(invalid)?;
        let parts: Vec<_> = source_part.split(':').map(str::trim).collect();
        match (destination_field.trim(), parts.as_slice()) {
            (destination_field, &[destination_location, source_field, source_location])
                if !destination_field.is_empty() && !source_field.is_empty() =>
            {
                Ok(Self::new(
                    destination_field,
                    destination_location.parse()?,
                    source_field,
                    source_location.parse()?,
                ))
            }
            _ => Err(invalid()),
        }
    }
}

/// Ordered table of destination fields and where their values come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(transparent))]
pub struct FieldMapping {
    entries: Vec<FieldMappingEntry>,
}

impl FieldMapping {
    /// Creates a new empty field mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given entry to the end of the mapping.
    ///
    /// Fails if the mapping already has an entry for the destination field.
    pub fn push(&mut self, entry: FieldMappingEntry) -> RemapResult<()> {
        if self.entry(&entry.destination_field).is_some() {
            return Err(RemapError::geometry(format!(
                "Destination field {} is mapped more than once",
                entry.destination_field
            )));
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Parses a field mapping from entries of the form
    /// `DEST=DEST_LOC:SOURCE:SOURCE_LOC`.
    pub fn parse_entries<'a, I>(entry_strings: I) -> RemapResult<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut mapping = Self::new();
        for entry_string in entry_strings {
            mapping.push(entry_string.parse()?)?;
        }
        Ok(mapping)
    }

    /// Returns the entry for the given destination field, if present.
    pub fn entry(&self, destination_field: &str) -> Option<&FieldMappingEntry> {
        self.entries
            .iter()
            .find(|entry| entry.destination_field == destination_field)
    }

    pub fn entries(&self) -> &[FieldMappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Checks that every destination field is mapped only once and that all
    /// locations exist for grids of the given dimensionality.
    pub fn validate(&self, dimensionality: Dimensionality) -> RemapResult<()> {
        let mut destination_fields = HashSet::new();
        for entry in &self.entries {
            if !destination_fields.insert(entry.destination_field.as_str()) {
                return Err(RemapError::geometry(format!(
                    "Destination field {} is mapped more than once",
                    entry.destination_field
                )));
            }
            for location in [entry.destination_location, entry.source_location] {
                if !dimensionality.supports(location) {
                    return Err(RemapError::geometry(format!(
                        "Location {} of field {} is not defined for {} grids",
                        location, entry.destination_field, dimensionality
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Configuration of a remapping run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serialization", serde(default))]
pub struct RemapConfig {
    /// Interpolation method to use. Default: linear.
    pub method: InterpolationMethod,
    /// Number of workers sharing the destination blocks. Default: 1.
    pub num_workers: usize,
    /// Destination fields and where their values come from. Default: empty.
    pub mapping: FieldMapping,
    /// Amount of status output. Default: quiet.
    #[cfg_attr(feature = "serialization", serde(skip))]
    pub verbosity: Verbosity,
}

impl Default for RemapConfig {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::default(),
            num_workers: 1,
            mapping: FieldMapping::new(),
            verbosity: Verbosity::Quiet,
        }
    }
}

impl RemapConfig {
    /// Reads a remapping configuration from a JSON file.
    #[cfg(feature = "json")]
    pub fn from_json_file<P: AsRef<Path>>(file_path: P) -> io::Result<Self> {
        let text = fs::read_to_string(file_path.as_ref())?;
        serde_json::from_str(&text).map_err(|err| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Could not parse remapping configuration in {}: {}",
                    file_path.as_ref().display(),
                    err
                ),
            )
        })
    }

    /// Checks that the configuration can be used for grids of the given dimensionality.
    pub fn validate(&self, dimensionality: Dimensionality) -> RemapResult<()> {
        if self.num_workers == 0 {
            return Err(RemapError::geometry("Number of workers must be at least 1"));
        }
        if self.mapping.is_empty() {
            return Err(RemapError::geometry("No fields to interpolate"));
        }
        self.mapping.validate(dimensionality)
    }
}

/// Interpolated values of the destination blocks handled by one or more workers.
#[derive(Clone, Debug, PartialEq)]
pub struct RemappedFields {
    block_range: Range<usize>,
    fields: Vec<(String, Array4<fdt>)>,
}

impl RemappedFields {
    /// Returns the range of destination blocks the values belong to.
    pub fn block_range(&self) -> &Range<usize> {
        &self.block_range
    }

    /// Returns the `(blocks, nz, ny, nx)` values of the given destination field.
    pub fn field(&self, field_name: &str) -> Option<&Array4<fdt>> {
        self.fields
            .iter()
            .find(|(name, _)| name == field_name)
            .map(|(_, values)| values)
    }

    /// Returns an iterator over the field names and values, in mapping order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array4<fdt>)> {
        self.fields
            .iter()
            .map(|(name, values)| (name.as_str(), values))
    }

    pub fn into_fields(self) -> Vec<(String, Array4<fdt>)> {
        self.fields
    }

    /// Joins the results of workers handling consecutive block ranges.
    fn concatenate(parts: Vec<Self>) -> Self {
        let start = parts.first().map_or(0, |part| part.block_range.start);
        let end = parts.last().map_or(0, |part| part.block_range.end);
        let n_blocks = end - start;

        let fields = match parts.first() {
            None => Vec::new(),
            Some(first) => first
                .fields
                .iter()
                .enumerate()
                .map(|(field_idx, (name, values))| {
                    let (_, nz, ny, nx) = values.dim();
                    let mut joined = Array4::from_elem((n_blocks, nz, ny, nx), fdt::NAN);
                    for part in &parts {
                        let offset = part.block_range.start - start;
                        let part_values = &part.fields[field_idx].1;
                        joined
                            .slice_mut(s![offset..offset + part_values.len_of(Axis(0)), .., .., ..])
                            .assign(part_values);
                    }
                    (name.clone(), joined)
                })
                .collect(),
        };
        Self {
            block_range: start..end,
            fields,
        }
    }
}

/// Checks that the given grids and mapping can be combined, without touching
/// any storage.
pub fn verify_compatible(
    destination: &GridTopology,
    source: &GridTopology,
    mapping: &FieldMapping,
) -> RemapResult<()> {
    if destination.dimensionality() != source.dimensionality() {
        return Err(RemapError::incompatible_grids(format!(
            "Source grid is {} while destination grid is {}",
            source.dimensionality(),
            destination.dimensionality()
        )));
    }
    mapping.validate(destination.dimensionality())
}

/// Verifies that every source field of the mapping is present in the source
/// storage with the shape the source grid implies for its location.
pub fn verify_source_datasets<S: FieldSource>(
    source: &GridTopology,
    mapping: &FieldMapping,
    source_storage: &S,
) -> RemapResult<()> {
    for entry in mapping.entries() {
        source_storage.verify_dataset_shape(
            &entry.source_field,
            source.dataset_shape(entry.source_location),
        )?;
    }
    Ok(())
}

/// Creates a dataset for every destination field in the given destination
/// storage, shaped for the destination grid.
///
/// Must complete before any destination block is written.
pub fn prepare_destination<D: FieldSink>(
    destination: &GridTopology,
    mapping: &FieldMapping,
    destination_storage: &mut D,
) -> RemapResult<()> {
    for entry in mapping.entries() {
        destination_storage.create_dataset(
            &entry.destination_field,
            destination.dataset_shape(entry.destination_location),
        )?;
    }
    Ok(())
}

/// Interpolates the source fields onto the destination blocks assigned to
/// the given worker, writing each block to the destination storage as soon
/// as it is computed.
///
/// The destination storage is prepared first, so this is meant for a worker
/// having the destination storage to itself.
///
/// # Parameters
///
/// - `destination`: Grid to interpolate onto.
/// - `source`: Grid the field values are given on.
/// - `mapping`: Destination fields and where their values come from.
/// - `worker_range`: Which part of the destination blocks to handle.
/// - `source_storage`: Container with the source field values.
/// - `destination_storage`: Container to write the interpolated values to.
/// - `interpolator`: Interpolator to use.
/// - `progress_bar`: Progress bar to advance once per destination block.
///
/// # Returns
///
/// A `Result` which is either:
///
/// - `Ok`: Contains the interpolated values of the worker's blocks.
/// - `Err`: Contains a `RemapError` describing why the remapping failed.
///
/// # Type parameters
///
/// - `I`: Type of interpolator.
/// - `S`: Type of source storage.
/// - `D`: Type of destination storage.
#[allow(clippy::too_many_arguments)]
pub fn interpolate<I, S, D>(
    destination: &GridTopology,
    source: &GridTopology,
    mapping: &FieldMapping,
    worker_range: &WorkerRange,
    source_storage: &S,
    destination_storage: &mut D,
    interpolator: &I,
    progress_bar: &ProgressBar,
) -> RemapResult<RemappedFields>
where
    I: RegularGridInterpolator,
    S: FieldSource,
    D: FieldSink,
{
    verify_compatible(destination, source, mapping)?;
    verify_source_datasets(source, mapping, source_storage)?;
    prepare_destination(destination, mapping, destination_storage)?;
    interpolate_worker_blocks(
        destination,
        source,
        mapping,
        worker_range,
        source_storage,
        destination_storage,
        interpolator,
        progress_bar,
    )
}

/// Interpolates the source fields onto the destination blocks assigned to
/// the given worker, assuming the destination storage has already been
/// prepared with `prepare_destination`.
#[allow(clippy::too_many_arguments)]
pub fn interpolate_worker_blocks<I, S, D>(
    destination: &GridTopology,
    source: &GridTopology,
    mapping: &FieldMapping,
    worker_range: &WorkerRange,
    source_storage: &S,
    destination_storage: &D,
    interpolator: &I,
    progress_bar: &ProgressBar,
) -> RemapResult<RemappedFields>
where
    I: RegularGridInterpolator,
    S: FieldSource,
    D: FieldSink,
{
    verify_compatible(destination, source, mapping)?;
    verify_source_datasets(source, mapping, source_storage)?;

    let block_range = worker_range.block_range(destination.num_blocks());

    let mut fields: Vec<_> = mapping
        .entries()
        .iter()
        .map(|entry| {
            let (nz, ny, nx) = destination.block_array_shape(entry.destination_location);
            (
                entry.destination_field.clone(),
                Array4::from_elem((block_range.len(), nz, ny, nx), fdt::NAN),
            )
        })
        .collect();

    for (local_idx, block) in block_range.clone().enumerate() {
        let overlapping_blocks = source.blocks_overlapping(destination.bounding_box(block));
        if overlapping_blocks.is_empty() {
            return Err(InterpolationError::NoOverlappingBlocks { block }.into());
        }
        let lattice_span = source.lattice_span(&overlapping_blocks)?;

        for (entry, (_, field_values)) in mapping.entries().iter().zip(fields.iter_mut()) {
            let local_patch = gather_local_patch(
                source,
                &overlapping_blocks,
                entry.source_location,
                &entry.source_field,
                source_storage,
            )?;
            let block_values = interpolate_block(
                destination,
                source,
                block,
                entry,
                &lattice_span,
                &local_patch,
                interpolator,
            )?;
            destination_storage.write_block(&entry.destination_field, block, block_values.view())?;
            field_values
                .index_axis_mut(Axis(0), local_idx)
                .assign(&block_values);
        }
        progress_bar.inc(1);
    }

    Ok(RemappedFields {
        block_range,
        fields,
    })
}

/// Interpolates the source fields onto all destination blocks, with the
/// blocks shared among the given number of workers running concurrently.
///
/// The destination storage is prepared once before any worker starts.
#[allow(clippy::too_many_arguments)]
pub fn interpolate_in_parallel<I, S, D>(
    destination: &GridTopology,
    source: &GridTopology,
    mapping: &FieldMapping,
    num_workers: usize,
    source_storage: &S,
    destination_storage: &mut D,
    interpolator: &I,
    verbosity: &Verbosity,
) -> RemapResult<RemappedFields>
where
    I: RegularGridInterpolator,
    S: FieldSource,
    D: FieldSink,
{
    let worker_ranges = (0..num_workers)
        .map(|worker_id| WorkerRange::new(worker_id, num_workers))
        .collect::<RemapResult<Vec<_>>>()?;
    if worker_ranges.is_empty() {
        return Err(RemapError::geometry("Number of workers must be at least 1"));
    }
    verify_compatible(destination, source, mapping)?;
    verify_source_datasets(source, mapping, source_storage)?;

    if verbosity.print_messages() {
        println!(
            "Interpolating {} field{} onto {} block{} using {} worker{}",
            mapping.len(),
            if mapping.len() == 1 { "" } else { "s" },
            destination.num_blocks(),
            if destination.num_blocks() == 1 { "" } else { "s" },
            num_workers,
            if num_workers == 1 { "" } else { "s" }
        );
    }

    prepare_destination(destination, mapping, destination_storage)?;
    let destination_storage: &D = destination_storage;

    let progress_bar = verbosity.create_progress_bar(destination.num_blocks());
    let parts = worker_ranges
        .into_par_iter()
        .map(|worker_range| {
            interpolate_worker_blocks(
                destination,
                source,
                mapping,
                &worker_range,
                source_storage,
                destination_storage,
                interpolator,
                &progress_bar,
            )
        })
        .collect::<RemapResult<Vec<_>>>()?;
    progress_bar.finish();

    Ok(RemappedFields::concatenate(parts))
}

/// Interpolates the source fields onto all destination blocks as specified
/// by the given configuration.
pub fn remap_with_config<S, D>(
    destination: &GridTopology,
    source: &GridTopology,
    config: &RemapConfig,
    source_storage: &S,
    destination_storage: &mut D,
) -> RemapResult<RemappedFields>
where
    S: FieldSource,
    D: FieldSink,
{
    config.validate(destination.dimensionality())?;
    interpolate_in_parallel(
        destination,
        source,
        &config.mapping,
        config.num_workers,
        source_storage,
        destination_storage,
        &config.method,
        &config.verbosity,
    )
}

/// Returns the dimensions of the grid in the order of the array axes.
fn array_axis_dims(dimensionality: Dimensionality) -> &'static [Dim3] {
    match dimensionality {
        Dimensionality::Two => &[Y, X],
        Dimensionality::Three => &[Z, Y, X],
    }
}

fn interpolate_block<I: RegularGridInterpolator>(
    destination: &GridTopology,
    source: &GridTopology,
    block: usize,
    entry: &FieldMappingEntry,
    lattice_span: &In3D<Range<usize>>,
    local_patch: &Array3<fdt>,
    interpolator: &I,
) -> RemapResult<Array3<fdt>> {
    let dimensionality = source.dimensionality();
    let axis_dims = array_axis_dims(dimensionality);
    let destination_lattice_idx = destination.lattice_index(block);

    let source_coords: Vec<&[fdt]> = axis_dims
        .iter()
        .map(|&dim| source.span_coords(entry.source_location, dim, lattice_span[dim].clone()))
        .collect();
    let query_coords: Vec<&[fdt]> = axis_dims
        .iter()
        .map(|&dim| {
            destination.block_coords(entry.destination_location, dim, destination_lattice_idx[dim])
        })
        .collect();

    let interpolated = match dimensionality {
        Dimensionality::Three => {
            interpolator.interpolate(&source_coords, &local_patch.view().into_dyn(), &query_coords)?
        }
        Dimensionality::Two => interpolator
            .interpolate(
                &source_coords,
                &local_patch.index_axis(Axis(0), 0).into_dyn(),
                &query_coords,
            )?
            .insert_axis(Axis(0)),
    };
    let mut block_values = interpolated.into_dimensionality::<Ix3>().map_err(|_| {
        InterpolationError::DimensionMismatch {
            n_coord_axes: source_coords.len(),
            n_query_axes: query_coords.len(),
            n_value_dims: 3,
        }
    })?;

    if let Some((min_value, max_value)) = finite_min_max(local_patch.iter()) {
        block_values.mapv_inplace(|value| clip(value, min_value, max_value));
    }
    Ok(block_values)
}

/// Limits the value to the given bounds, leaving NaN untouched.
fn clip(value: fdt, min_value: fdt, max_value: fdt) -> fdt {
    if value < min_value {
        min_value
    } else if value > max_value {
        max_value
    } else {
        value
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{grid::topology::RequestedGridConfig, storage::memory::MemoryFieldStorage};

    fn grid(counts: [usize; 3], sizes: [usize; 3], dimensionality: usize) -> GridTopology {
        GridTopology::from_requested_grid(
            &RequestedGridConfig {
                dimensionality,
                axis_block_counts: counts,
                block_sizes: sizes,
                ..RequestedGridConfig::default()
            },
            &In3D::same((0.0, 1.0)),
        )
        .unwrap()
    }

    fn dens_mapping() -> FieldMapping {
        FieldMapping::parse_entries(["dens=center:dens:center"]).unwrap()
    }

    #[test]
    fn mapping_entries_parse() {
        let entry: FieldMappingEntry = "magx = facex : bx : facex".parse().unwrap();
        assert_eq!(
            entry,
            FieldMappingEntry::new(
                "magx",
                StaggeringLocation::FaceX,
                "bx",
                StaggeringLocation::FaceX
            )
        );
        assert!("dens".parse::<FieldMappingEntry>().is_err());
        assert!("dens=center:dens".parse::<FieldMappingEntry>().is_err());
        assert!("dens=middle:dens:center".parse::<FieldMappingEntry>().is_err());
        assert!("=center:dens:center".parse::<FieldMappingEntry>().is_err());
        assert!(FieldMapping::parse_entries(["a=center:a:center", "a=center:b:center"]).is_err());
    }

    #[test]
    fn face_z_is_rejected_for_2d_grids() {
        let mapping = FieldMapping::parse_entries(["magz=facez:magz:facez"]).unwrap();
        assert!(mapping.validate(Dimensionality::Three).is_ok());
        assert!(matches!(
            mapping.validate(Dimensionality::Two),
            Err(RemapError::Geometry(_))
        ));
    }

    #[test]
    fn values_are_clipped_to_local_range() {
        assert_eq!(clip(-1.0, 0.0, 2.0), 0.0);
        assert_eq!(clip(3.0, 0.0, 2.0), 2.0);
        assert_eq!(clip(1.5, 0.0, 2.0), 1.5);
        assert!(clip(fdt::NAN, 0.0, 2.0).is_nan());
    }

    #[test]
    fn mismatched_dimensionality_fails_before_storage_access() {
        let source = grid([2, 2, 2], [4, 4, 4], 3);
        let destination = grid([2, 2, 1], [4, 4, 1], 2);
        let source_storage = MemoryFieldStorage::new();
        let mut destination_storage = MemoryFieldStorage::new();
        let result = interpolate(
            &destination,
            &source,
            &dens_mapping(),
            &WorkerRange::single(),
            &source_storage,
            &mut destination_storage,
            &InterpolationMethod::Linear,
            &ProgressBar::hidden(),
        );
        assert!(matches!(result, Err(RemapError::IncompatibleGrids(_))));
        assert!(destination_storage.dataset_names().is_empty());
    }

    #[test]
    fn partial_results_concatenate_in_block_order() {
        let part = |range: Range<usize>, offset: fdt| RemappedFields {
            block_range: range.clone(),
            fields: vec![(
                "dens".to_string(),
                Array4::from_shape_fn((range.len(), 1, 1, 2), |(b, _, _, i)| {
                    offset + (b * 2 + i) as fdt
                }),
            )],
        };
        let joined = RemappedFields::concatenate(vec![part(0..2, 0.0), part(2..3, 4.0)]);
        assert_eq!(joined.block_range(), &(0..3));
        let dens = joined.field("dens").unwrap();
        assert_eq!(dens.dim(), (3, 1, 1, 2));
        assert_eq!(
            dens.iter().cloned().collect::<Vec<_>>(),
            vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]
        );
    }
}
