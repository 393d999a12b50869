//! Multi-class linear classifiers trained with lock-free parallel SGD.
//!
//! Every epoch splits a permutation of the training set across a pool of workers that
//! update one shared weight matrix without locks. Workers are joined at the end of each
//! epoch, then the loss is reduced and the weights are evaluated on a validation set.

pub mod data;
pub mod evaluation;
pub mod model;
pub mod optimization;
pub mod storage;
pub mod training;

mod error;

pub use data::{EpochOrdering, Fixed, Samples, Sequential, ShardLayout, Shuffled};
pub use error::{ErrorKind, Result, SgdErr};
pub use evaluation::{Evaluator, Metric};
pub use model::{LossKind, WeightMatrix};
pub use optimization::{DecayPolicy, LearningRate};
pub use training::{Stats, Termination, TrainConfig, Trained, Trainer, train};
