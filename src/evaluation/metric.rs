use std::fmt;

use ndarray::ArrayView2;

use crate::model::argmax;

/// A caller supplied metric, maps the `n x nclass` scores and the true labels to a scalar.
pub type MetricFn = fn(ArrayView2<'_, f32>, &[u32]) -> f64;

/// The metric reported on evaluation epochs. Higher is better.
#[derive(Clone, Copy, Default)]
pub enum Metric {
    /// Fraction of samples whose highest scoring class is the true one.
    #[default]
    Accuracy,
    Custom(MetricFn),
}

impl Metric {
    /// Reduces the scores of a set of samples to a scalar.
    ///
    /// # Arguments
    /// * `scores` - One row of class scores per sample.
    /// * `labels` - The true class of every sample.
    pub fn compute(&self, scores: ArrayView2<'_, f32>, labels: &[u32]) -> f64 {
        match self {
            Metric::Accuracy => accuracy(scores, labels),
            Metric::Custom(metric_fn) => metric_fn(scores, labels),
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Accuracy => f.write_str("Accuracy"),
            Metric::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// Classification accuracy, `NaN` for an empty set.
pub fn accuracy(scores: ArrayView2<'_, f32>, labels: &[u32]) -> f64 {
    if labels.is_empty() {
        return f64::NAN;
    }

    let hits = scores
        .rows()
        .into_iter()
        .zip(labels)
        .filter(|(row, label)| argmax(*row) == **label as usize)
        .count();

    hits as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn accuracy_counts_argmax_hits() {
        let scores = array![[0.9f32, 0.1], [0.2, 0.8], [0.6, 0.4], [0.5, 0.5]];
        let labels = [0, 1, 1, 0];

        assert_eq!(Metric::Accuracy.compute(scores.view(), &labels), 0.75);
    }

    #[test]
    fn accuracy_of_nothing() {
        let scores = ndarray::Array2::<f32>::zeros((0, 3));
        assert!(accuracy(scores.view(), &[]).is_nan());
    }

    #[test]
    fn custom() {
        fn mean_true_score(scores: ArrayView2<'_, f32>, labels: &[u32]) -> f64 {
            let total: f64 = labels
                .iter()
                .enumerate()
                .map(|(i, &y)| scores[[i, y as usize]] as f64)
                .sum();
            total / labels.len() as f64
        }

        let scores = array![[1f32, 3.], [2., 0.]];
        let metric = Metric::Custom(mean_true_score);

        assert_eq!(metric.compute(scores.view(), &[1, 0]), 2.5);
        assert_eq!(format!("{metric:?}"), "Custom");
    }
}
