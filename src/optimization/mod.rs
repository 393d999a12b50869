mod schedule;

pub use schedule::{DecayPolicy, LearningRate};
