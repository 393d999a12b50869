mod loss;
mod weights;

pub use loss::LossKind;
pub use weights::{WeightMatrix, argmax};
