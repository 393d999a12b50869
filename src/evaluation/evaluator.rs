use log::warn;

use super::Metric;
use crate::{data::Samples, model::WeightMatrix};

/// Scores a set of samples against a frozen weight matrix and reduces them to a metric.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator {
    metric: Metric,
    bias_term: f32,
}

impl Evaluator {
    /// Creates a new `Evaluator`.
    ///
    /// # Arguments
    /// * `metric` - The metric to compute.
    /// * `bias_term` - The value appended to every feature vector, same as during training.
    pub fn new(metric: Metric, bias_term: f32) -> Self {
        Self { metric, bias_term }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Evaluates `weights` on `samples`.
    ///
    /// Read only, evaluating twice the same snapshot on the same samples yields the same value.
    ///
    /// # Returns
    /// `None` if there's nothing to evaluate, the dimensions don't match or the metric
    /// isn't finite. Evaluation is auxiliary to training so these are not errors.
    pub fn evaluate(&self, weights: &WeightMatrix, samples: &Samples<'_>) -> Option<f64> {
        if samples.is_empty() {
            warn!("skipping evaluation, the set is empty");
            return None;
        }

        let scores = match weights.scores(samples, self.bias_term) {
            Ok(scores) => scores,
            Err(e) => {
                warn!("skipping evaluation: {e}");
                return None;
            }
        };

        let value = self.metric.compute(scores.view(), samples.labels());
        if !value.is_finite() {
            warn!("skipping evaluation, the {:?} metric isn't finite", self.metric);
            return None;
        }

        Some(value)
    }
}
