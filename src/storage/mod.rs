mod wild;

pub use wild::WildWeights;
