mod ordering;
mod samples;
mod shard;

pub(crate) use ordering::check_permutation;
pub use ordering::{EpochOrdering, Fixed, Sequential, Shuffled};
pub use samples::Samples;
pub use shard::{ShardLayout, shard_range};
