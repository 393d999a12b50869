use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happened during one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochRecord {
    /// 0-based epoch index.
    pub epoch: usize,
    /// Mean loss over the epoch's examples.
    pub loss: f64,
    /// Wall-clock duration of the parallel phase, in seconds.
    pub elapsed: f64,
    /// Step size at the first example of the epoch.
    pub learning_rate: f32,
}

/// The metric values of an evaluation epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvalRecord {
    pub epoch: usize,
    /// The metric over the validation set.
    pub metric: f64,
    /// The metric over the training set, when requested.
    pub train_metric: Option<f64>,
}

/// Why a run finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum Termination {
    /// Every requested epoch ran.
    #[default]
    Completed,
    /// The cancel flag was raised before `epoch` started.
    Cancelled { epoch: usize },
    /// The validation metric degraded at `epoch`, the weights of `best_epoch` were kept.
    EarlyStopped { epoch: usize, best_epoch: usize },
    /// A worker diverged during `epoch`.
    Diverged { epoch: usize },
    /// The ordering supplied for `epoch` was rejected before the epoch ran.
    InvalidOrdering { epoch: usize },
}

/// Append-only accumulator of a run's statistics.
#[derive(Debug, Default)]
pub struct StatsCollector {
    epochs: Vec<EpochRecord>,
    evals: Vec<EvalRecord>,
    iterations: u64,
}

impl StatsCollector {
    /// Creates a new `StatsCollector`.
    ///
    /// # Arguments
    /// * `epochs` - The expected amount of epochs, used to preallocate.
    pub fn with_capacity(epochs: usize) -> Self {
        Self {
            epochs: Vec::with_capacity(epochs),
            evals: Vec::new(),
            iterations: 0,
        }
    }

    /// Appends the record of a finished epoch and returns a copy of it.
    pub fn record_epoch(
        &mut self,
        epoch: usize,
        loss: f64,
        elapsed: Duration,
        learning_rate: f32,
    ) -> EpochRecord {
        let record = EpochRecord {
            epoch,
            loss,
            elapsed: elapsed.as_secs_f64(),
            learning_rate,
        };

        self.epochs.push(record);
        record
    }

    pub fn record_eval(
        &mut self,
        epoch: usize,
        metric: f64,
        train_metric: Option<f64>,
    ) -> EvalRecord {
        let record = EvalRecord {
            epoch,
            metric,
            train_metric,
        };

        self.evals.push(record);
        record
    }

    /// Counts `n` processed examples.
    pub fn advance(&mut self, n: usize) {
        self.iterations += n as u64;
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Freezes the collected records.
    pub fn finalize(self, termination: Termination) -> Stats {
        Stats {
            epochs: self.epochs,
            evals: self.evals,
            iterations: self.iterations,
            termination,
        }
    }
}

/// The immutable statistics of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    epochs: Vec<EpochRecord>,
    evals: Vec<EvalRecord>,
    iterations: u64,
    termination: Termination,
}

impl Stats {
    /// One record per completed epoch, in order.
    pub fn epochs(&self) -> &[EpochRecord] {
        &self.epochs
    }

    /// One record per evaluation epoch, in order.
    pub fn evals(&self) -> &[EvalRecord] {
        &self.evals
    }

    pub fn losses(&self) -> Vec<f64> {
        self.epochs.iter().map(|r| r.loss).collect()
    }

    pub fn valid_metrics(&self) -> Vec<f64> {
        self.evals.iter().map(|r| r.metric).collect()
    }

    /// The training set metrics of the evaluation epochs that computed one.
    pub fn train_metrics(&self) -> Vec<f64> {
        self.evals.iter().filter_map(|r| r.train_metric).collect()
    }

    /// The total amount of examples processed, `epochs x n` for a completed run.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Total time spent in the parallel phases, in seconds.
    pub fn elapsed(&self) -> f64 {
        self.epochs.iter().map(|r| r.elapsed).sum()
    }

    /// The evaluation with the highest metric, the earliest one on ties.
    pub fn best_eval(&self) -> Option<&EvalRecord> {
        self.evals
            .iter()
            .reduce(|best, r| if r.metric > best.metric { r } else { best })
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut collector = StatsCollector::with_capacity(3);

        for epoch in 0..3 {
            let record = collector.record_epoch(
                epoch,
                1. / (epoch + 1) as f64,
                Duration::from_millis(500),
                0.1,
            );
            assert_eq!(record.epoch, epoch);
            collector.advance(10);
        }
        collector.record_eval(1, 0.5, None);
        let eval = collector.record_eval(2, 0.75, Some(0.8));
        assert_eq!(eval.train_metric, Some(0.8));

        let stats = collector.finalize(Termination::Completed);
        assert_eq!(stats.losses(), [1., 0.5, 1. / 3.]);
        assert_eq!(stats.valid_metrics(), [0.5, 0.75]);
        assert_eq!(stats.train_metrics(), [0.8]);
        assert_eq!(stats.iterations(), 30);
        assert_eq!(stats.elapsed(), 1.5);
        assert_eq!(stats.termination(), Termination::Completed);
    }

    #[test]
    fn best_eval() {
        let mut collector = StatsCollector::default();
        collector.record_eval(0, 0.6, None);
        collector.record_eval(1, 0.9, None);
        collector.record_eval(2, 0.9, None);
        collector.record_eval(3, 0.7, None);

        let stats = collector.finalize(Termination::Completed);
        assert_eq!(stats.best_eval().map(|r| r.epoch), Some(1));

        let empty = StatsCollector::default().finalize(Termination::Cancelled { epoch: 0 });
        assert!(empty.best_eval().is_none());
    }
}
