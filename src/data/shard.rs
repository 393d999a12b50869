use std::{iter::StepBy, ops::Range};

use serde::{Deserialize, Serialize};

/// How an epoch's ordering is split among the workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardLayout {
    /// Each worker takes a contiguous, balanced range of positions.
    #[default]
    Contiguous,
    /// Worker `w` takes positions `w, w + T, w + 2T, ...` for `T` workers.
    Interleaved,
}

impl ShardLayout {
    /// Returns the ordering positions assigned to `worker_id`.
    ///
    /// Properties:
    /// - The positions of all workers are disjoint and cover `[0..total)`.
    /// - Shard sizes differ by at most 1.
    ///
    /// # Panics
    /// If `num_workers` is zero or `worker_id` is not lower than `num_workers`.
    pub fn positions(
        self,
        total: usize,
        worker_id: usize,
        num_workers: usize,
    ) -> StepBy<Range<usize>> {
        match self {
            ShardLayout::Contiguous => shard_range(total, worker_id, num_workers).step_by(1),
            ShardLayout::Interleaved => {
                assert!(worker_id < num_workers);
                (worker_id.min(total)..total).step_by(num_workers)
            }
        }
    }
}

/// Splits `total` positions among `num_workers` and returns the range for `worker_id`.
///
/// Ranges are contiguous, disjoint, cover `[0..total)` and their sizes differ by at most 1.
pub fn shard_range(total: usize, worker_id: usize, num_workers: usize) -> Range<usize> {
    assert!(worker_id < num_workers, "worker {worker_id} of {num_workers}");

    let size = total / num_workers;
    let longer = total % num_workers;

    // The first `longer` shards take one extra position.
    let start_of = |w: usize| w * size + w.min(longer);
    start_of(worker_id)..start_of(worker_id + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contiguous_shards_front_load_the_remainder() {
        let shards: Vec<_> = (0..4).map(|w| shard_range(11, w, 4)).collect();
        assert_eq!(shards, [0..3, 3..6, 6..9, 9..11]);

        let even: Vec<_> = (0..2).map(|w| shard_range(8, w, 2)).collect();
        assert_eq!(even, [0..4, 4..8]);
    }

    #[test]
    fn more_workers_than_positions() {
        assert_eq!(shard_range(2, 0, 4), 0..1);
        assert_eq!(shard_range(2, 1, 4), 1..2);
        assert!(shard_range(2, 2, 4).is_empty());
        assert!(shard_range(2, 3, 4).is_empty());
    }

    #[test]
    fn interleaved() {
        let layout = ShardLayout::Interleaved;

        let w0: Vec<_> = layout.positions(7, 0, 3).collect();
        let w1: Vec<_> = layout.positions(7, 1, 3).collect();
        let w2: Vec<_> = layout.positions(7, 2, 3).collect();

        assert_eq!(w0, [0, 3, 6]);
        assert_eq!(w1, [1, 4]);
        assert_eq!(w2, [2, 5]);
        assert_eq!(layout.positions(1, 2, 3).count(), 0);
    }

    #[test]
    fn layouts_cover_every_position_once() {
        const TOTAL: usize = 23;
        const WORKERS: usize = 4;

        for layout in [ShardLayout::Contiguous, ShardLayout::Interleaved] {
            let mut seen = [0usize; TOTAL];
            for w in 0..WORKERS {
                layout.positions(TOTAL, w, WORKERS).for_each(|p| seen[p] += 1);
            }
            assert!(seen.iter().all(|&c| c == 1), "{layout:?} left gaps: {seen:?}");
        }
    }
}
