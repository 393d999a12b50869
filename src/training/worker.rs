use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;

use crate::{
    data::{Samples, ShardLayout},
    model::LossKind,
    optimization::LearningRate,
    storage::WildWeights,
};

/// The per-epoch inputs shared by every worker.
pub(crate) struct EpochPlan<'a> {
    pub epoch: usize,
    /// Examples processed in the run before this epoch.
    pub iter_base: u64,
    pub order: &'a [usize],
    pub layout: ShardLayout,
    pub workers: usize,
    /// Raised by the first worker that diverges so the others stop early.
    pub abort: &'a AtomicBool,
}

/// The partial result of one worker's shard.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ShardOutcome {
    pub loss_sum: f64,
    pub steps: usize,
}

/// A worker met a non-finite score or loss on the example `index`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Diverged {
    pub index: usize,
}

/// Applies one SGD update per example of its shard to the shared weights.
///
/// Workers of the same epoch write to the same `WildWeights` without synchronizing,
/// see its documentation for the consistency guarantees.
pub(crate) struct GradientWorker<'a, 's> {
    weights: &'a WildWeights,
    samples: Samples<'s>,
    loss: LossKind,
    schedule: LearningRate,
    lambda: f32,
    bias_term: f32,
}

impl<'a, 's> GradientWorker<'a, 's> {
    pub fn new(
        weights: &'a WildWeights,
        samples: Samples<'s>,
        loss: LossKind,
        schedule: LearningRate,
        lambda: f32,
        bias_term: f32,
    ) -> Self {
        Self {
            weights,
            samples,
            loss,
            schedule,
            lambda,
            bias_term,
        }
    }

    /// Runs the shard of `worker_id` for the epoch described by `plan`.
    ///
    /// The example at ordering position `p` uses the step size of global iteration
    /// `plan.iter_base + p`, so the schedule doesn't depend on how the shards interleave.
    ///
    /// # Returns
    /// The shard's loss sum, or the index of the example that produced a non-finite value.
    pub fn run(&self, worker_id: usize, plan: &EpochPlan<'_>) -> Result<ShardOutcome, Diverged> {
        let nclass = self.weights.nclass();
        let mut scores = vec![0.; nclass];
        let mut coefs = vec![0.; nclass];
        let mut outcome = ShardOutcome::default();

        let positions = plan
            .layout
            .positions(plan.order.len(), worker_id, plan.workers);

        for pos in positions {
            if plan.abort.load(Ordering::Relaxed) {
                break;
            }

            let idx = plan.order[pos];
            let eta = self
                .schedule
                .rate(plan.iter_base + pos as u64, plan.epoch);

            match self.step(idx, eta, &mut scores, &mut coefs) {
                Some(loss) => outcome.loss_sum += loss as f64,
                None => {
                    plan.abort.store(true, Ordering::Relaxed);
                    return Err(Diverged { index: idx });
                }
            }
            outcome.steps += 1;
        }

        debug!(
            epoch = plan.epoch,
            worker = worker_id,
            steps = outcome.steps;
            "shard finished"
        );

        Ok(outcome)
    }

    /// Applies `W[k] <- (1 - eta * lambda) W[k] - eta * c_k [x; b]` for the example `idx`.
    ///
    /// # Returns
    /// The example's loss, `None` if a score or the loss isn't finite. In that case
    /// the weights are left untouched.
    fn step(&self, idx: usize, eta: f32, scores: &mut [f32], coefs: &mut [f32]) -> Option<f32> {
        let x = self.samples.row(idx);
        let label = self.samples.label(idx) as usize;

        self.weights.scores_into(x, self.bias_term, scores);
        let loss = self.loss.gradient(scores, label, coefs);

        if !loss.is_finite() || scores.iter().any(|s| !s.is_finite()) {
            return None;
        }

        if self.lambda > 0. {
            self.weights.decay(1. - eta * self.lambda);
        }

        for (class, &c) in coefs.iter().enumerate() {
            if c != 0. {
                self.weights.axpy_row(class, -eta * c, x, self.bias_term);
            }
        }

        Some(loss)
    }
}
