//! Spatial queries against the blocks of a grid.

use super::{fgr, topology::GridTopology};
use crate::geometry::BoundingBox3;

impl GridTopology {
    /// Returns the indices of all blocks whose bounding box intersects the
    /// given box, in ascending order.
    ///
    /// The test is inclusive, so blocks that only touch the box on a face,
    /// edge or corner are included.
    pub fn blocks_overlapping(&self, bounding_box: &BoundingBox3<fgr>) -> Vec<usize> {
        self.bounding_boxes()
            .iter()
            .enumerate()
            .filter_map(|(block, block_box)| {
                if block_box.overlaps(bounding_box) {
                    Some(block)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::{
        geometry::{In3D, Point3},
        grid::topology::RequestedGridConfig,
    };

    fn unit_cube_topology(counts: [usize; 3]) -> GridTopology {
        GridTopology::from_requested_grid(
            &RequestedGridConfig {
                axis_block_counts: counts,
                block_sizes: [4, 4, 4],
                ..RequestedGridConfig::default()
            },
            &In3D::same((0.0, 1.0)),
        )
        .unwrap()
    }

    #[test]
    fn interior_box_finds_single_block() {
        let topology = unit_cube_topology([2, 2, 2]);
        let query = BoundingBox3::new(Point3::new(0.6, 0.1, 0.7), Point3::new(0.9, 0.4, 0.8));
        assert_eq!(topology.blocks_overlapping(&query), vec![5]);
    }

    #[test]
    fn touching_box_includes_neighbours() {
        let topology = unit_cube_topology([2, 2, 2]);
        let bounding_box = topology.bounding_box(0).clone();
        let blocks = topology.blocks_overlapping(&bounding_box);
        assert_eq!(blocks, (0..8).collect::<Vec<_>>());

        let query = BoundingBox3::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.5, 0.25, 0.25),
        );
        assert_eq!(topology.blocks_overlapping(&query), vec![0, 1]);
    }

    #[test]
    fn box_outside_domain_finds_nothing() {
        let topology = unit_cube_topology([3, 1, 2]);
        let query = BoundingBox3::new(Point3::new(1.5, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(topology.blocks_overlapping(&query).is_empty());
    }
}
