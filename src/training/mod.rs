mod config;
mod early_stop;
mod stats;
mod trainer;
mod worker;

pub use config::TrainConfig;
pub use stats::{EpochRecord, EvalRecord, Stats, StatsCollector, Termination};
pub use trainer::{Trained, Trainer, train};
