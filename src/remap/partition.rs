//! Partitioning of destination blocks among workers.

use crate::error::{RemapError, RemapResult};
use std::ops::Range;

/// Identifies one of a number of workers sharing the destination blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerRange {
    worker_id: usize,
    num_workers: usize,
}

impl WorkerRange {
    /// Creates a new worker range for the given worker.
    ///
    /// Fails if there are no workers or the worker ID is not below the
    /// number of workers.
    pub fn new(worker_id: usize, num_workers: usize) -> RemapResult<Self> {
        if num_workers == 0 {
            return Err(RemapError::geometry("Number of workers must be at least 1"));
        }
        if worker_id >= num_workers {
            return Err(RemapError::geometry(format!(
                "Worker ID {} is out of range for {} workers",
                worker_id, num_workers
            )));
        }
        Ok(Self {
            worker_id,
            num_workers,
        })
    }

    /// Creates the worker range of a single worker handling every block.
    pub fn single() -> Self {
        Self {
            worker_id: 0,
            num_workers: 1,
        }
    }

    pub fn worker_id(&self) -> usize {
        self.worker_id
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    /// Returns the range of block indices assigned to this worker.
    pub fn block_range(&self, num_blocks: usize) -> Range<usize> {
        assigned_block_range(num_blocks, self.num_workers, self.worker_id)
    }
}

/// Returns the contiguous range of block indices assigned to the given
/// worker when `num_blocks` blocks are shared among `num_workers` workers.
///
/// Every worker gets `num_blocks / num_workers` blocks, and the first
/// `num_blocks % num_workers` workers get one extra block.
///
/// # Panics
///
/// If `num_workers` is zero.
pub fn assigned_block_range(num_blocks: usize, num_workers: usize, worker_id: usize) -> Range<usize> {
    assert!(num_workers > 0, "Number of workers must be at least 1");
    let base_count = num_blocks / num_workers;
    let remainder = num_blocks % num_workers;
    let start = worker_id * base_count + worker_id.min(remainder);
    let count = if worker_id < remainder {
        base_count + 1
    } else if worker_id < num_workers {
        base_count
    } else {
        0
    };
    let start = start.min(num_blocks);
    start..start + count
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn every_block_is_assigned_exactly_once() {
        for num_blocks in 0..40 {
            for num_workers in 1..12 {
                let mut counts = vec![0; num_blocks];
                let mut next_start = 0;
                for worker_id in 0..num_workers {
                    let range = assigned_block_range(num_blocks, num_workers, worker_id);
                    assert_eq!(range.start, next_start);
                    next_start = range.end;
                    for block in range {
                        counts[block] += 1;
                    }
                }
                assert_eq!(next_start, num_blocks);
                assert!(counts.iter().all(|&count| count == 1));
            }
        }
    }

    #[test]
    fn first_workers_get_remainder() {
        assert_eq!(assigned_block_range(10, 4, 0), 0..3);
        assert_eq!(assigned_block_range(10, 4, 1), 3..6);
        assert_eq!(assigned_block_range(10, 4, 2), 6..8);
        assert_eq!(assigned_block_range(10, 4, 3), 8..10);
        assert_eq!(assigned_block_range(2, 4, 3), 2..2);
    }

    #[test]
    fn invalid_worker_ranges_are_rejected() {
        assert!(WorkerRange::new(0, 0).is_err());
        assert!(WorkerRange::new(3, 3).is_err());
        let worker_range = WorkerRange::new(1, 3).unwrap();
        assert_eq!(worker_range.block_range(7), 3..5);
        assert_eq!(WorkerRange::single().block_range(7), 0..7);
    }
}
