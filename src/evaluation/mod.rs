mod evaluator;
mod metric;

pub use evaluator::Evaluator;
pub use metric::{Metric, MetricFn, accuracy};
