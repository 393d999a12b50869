use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder, prelude::*};

use super::{
    EpochRecord, EvalRecord, Stats, StatsCollector, Termination, TrainConfig,
    early_stop::{EarlyStop, Verdict},
    worker::{Diverged, EpochPlan, GradientWorker, ShardOutcome},
};
use crate::{
    Result, SgdErr,
    data::{EpochOrdering, Samples, check_permutation},
    evaluation::{Evaluator, Metric},
    model::WeightMatrix,
    storage::WildWeights,
};

/// The outcome of a training run: the final weights and the run's statistics.
#[derive(Debug, Clone)]
pub struct Trained {
    pub weights: WeightMatrix,
    pub stats: Stats,
}

type Observer<'o> = Box<dyn FnMut(&EpochRecord, Option<&EvalRecord>) + 'o>;

/// Drives a multi-class linear classifier through its training epochs.
///
/// Every epoch hands a permutation of the training examples to `threads` workers that
/// update a single shared weight matrix without locks. The epoch ends once every worker
/// is joined, only then the loss is reduced and the weights are evaluated.
pub struct Trainer<'o> {
    config: TrainConfig,
    metric: Metric,
    cancel: Option<Arc<AtomicBool>>,
    observer: Option<Observer<'o>>,
}

impl<'o> Trainer<'o> {
    /// Creates a new `Trainer` evaluating with `Metric::Accuracy`.
    pub fn new(config: TrainConfig) -> Self {
        Self {
            config,
            metric: Metric::default(),
            cancel: None,
            observer: None,
        }
    }

    /// Sets the metric computed on evaluation epochs.
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Checks `flag` before every epoch, the run stops with the current weights once it's raised.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Calls `observer` after every epoch with its record and, on evaluation epochs, its metrics.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: FnMut(&EpochRecord, Option<&EvalRecord>) + 'o,
    {
        self.observer = Some(Box::new(observer));
        self
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Trains a classifier on `samples`.
    ///
    /// # Arguments
    /// * `samples` - The training set.
    /// * `valid` - The validation set, evaluated every `eval_freq` epochs.
    /// * `ordering` - Yields the order in which each epoch visits the training examples.
    ///
    /// # Returns
    /// The trained weights and statistics. An `InvalidArgument` error is returned before
    /// any work if the inputs are inconsistent. If a worker diverges, a `WorkerFailure`
    /// error carries the weights of the last epoch that finished with finite values.
    /// An ordering rejected after the first epoch yields an `InvalidOrdering` error
    /// carrying the weights and stats of the epochs already run.
    pub fn train<O>(
        &mut self,
        samples: Samples<'_>,
        valid: Option<Samples<'_>>,
        ordering: &mut O,
    ) -> Result<Trained>
    where
        O: EpochOrdering + ?Sized,
    {
        let nclass = self.check_inputs(&samples, valid.as_ref())?;
        let TrainConfig {
            epochs,
            threads,
            lambda,
            bias_term,
            loss,
            shard_layout,
            eval_train,
            ..
        } = self.config;

        let n = samples.len();
        let ndims = samples.ndims();
        let pool = build_pool(threads)?;

        info!(
            samples = n,
            ndims = ndims,
            nclass = nclass,
            threads = threads,
            epochs = epochs;
            "starting training with {loss:?} loss"
        );

        let weights = WildWeights::zeros(nclass, ndims);
        let schedule = self.config.learning_rate();
        let worker = GradientWorker::new(&weights, samples, loss, schedule, lambda, bias_term);
        let evaluator = Evaluator::new(self.metric, bias_term);

        let mut stats = StatsCollector::with_capacity(epochs);
        let mut early_stop = self.config.stop_valid_threshold.map(EarlyStop::new);
        let mut last_good = weights.snapshot();
        let mut best = None;
        let mut termination = Termination::Completed;

        let mut order = Vec::with_capacity(n);
        let mut seen = Vec::with_capacity(n);

        for epoch in 0..epochs {
            if self.is_cancelled() {
                warn!(epoch = epoch; "training cancelled");
                termination = Termination::Cancelled { epoch };
                break;
            }

            ordering.fill(epoch, n, &mut order);
            if let Err(reason) = check_permutation(&order, n, &mut seen) {
                return Err(reject_ordering(epoch, reason, last_good, stats));
            }

            let iter_base = stats.iterations();
            let abort = AtomicBool::new(false);
            let plan = EpochPlan {
                epoch,
                iter_base,
                order: &order,
                layout: shard_layout,
                workers: threads,
                abort: &abort,
            };

            let start = Instant::now();
            let outcomes: std::result::Result<Vec<ShardOutcome>, Diverged> = pool.install(|| {
                (0..threads)
                    .into_par_iter()
                    .map(|worker_id| worker.run(worker_id, &plan))
                    .collect()
            });
            let elapsed = start.elapsed();

            let outcomes = match outcomes {
                Ok(outcomes) => outcomes,
                Err(Diverged { index }) => {
                    return Err(fail(epoch, Some(index), last_good, stats));
                }
            };

            let current = weights.snapshot();
            if !current.is_finite() {
                return Err(fail(epoch, None, last_good, stats));
            }
            last_good = current;

            let loss_sum: f64 = outcomes.iter().map(|o| o.loss_sum).sum();
            let mean_loss = loss_sum / n as f64;
            stats.advance(n);
            let learning_rate = schedule.rate(iter_base, epoch);
            let record = stats.record_epoch(epoch, mean_loss, elapsed, learning_rate);

            debug!(
                epoch = epoch,
                loss = mean_loss,
                elapsed = record.elapsed;
                "epoch finished"
            );

            let mut eval = None;
            let mut verdict = Verdict::Continue;

            if let Some(valid) = valid.as_ref().filter(|_| self.config.is_eval_epoch(epoch)) {
                if let Some(metric) = evaluator.evaluate(&last_good, valid) {
                    let train_metric = eval_train
                        .then(|| evaluator.evaluate(&last_good, &samples))
                        .flatten();

                    info!(epoch = epoch, loss = mean_loss, metric = metric; "evaluated");
                    eval = Some(stats.record_eval(epoch, metric, train_metric));

                    if let Some(early_stop) = early_stop.as_mut() {
                        verdict = early_stop.observe(epoch, metric);
                    }
                }
            }

            if let Some(observer) = self.observer.as_mut() {
                observer(&record, eval.as_ref());
            }

            match verdict {
                Verdict::Improved => best = Some(last_good.clone()),
                Verdict::Continue => {}
                Verdict::Stop { best_epoch } => {
                    warn!(
                        epoch = epoch,
                        best_epoch = best_epoch;
                        "validation metric degraded, stopping"
                    );
                    termination = Termination::EarlyStopped { epoch, best_epoch };
                    break;
                }
            }
        }

        let weights = match termination {
            Termination::EarlyStopped { .. } => best.unwrap_or(last_good),
            _ => last_good,
        };

        let stats = stats.finalize(termination);
        info!(
            epochs = stats.epochs().len(),
            iterations = stats.iterations(),
            elapsed = stats.elapsed();
            "training finished"
        );

        Ok(Trained { weights, stats })
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Validates the data against the config.
    ///
    /// # Returns
    /// The amount of classes of the run.
    fn check_inputs(&self, samples: &Samples<'_>, valid: Option<&Samples<'_>>) -> Result<usize> {
        self.config.validate(valid.is_some())?;

        if samples.is_empty() {
            return Err(SgdErr::InvalidArgument("the training set is empty"));
        }

        let nclass = match self.config.nclass {
            Some(nclass) => nclass,
            None => samples.max_label().map_or(0, |label| label as usize + 1),
        };

        if nclass < 2 {
            return Err(SgdErr::InvalidArgument("at least two classes are required"));
        }

        samples.check_labels(nclass, "training")?;

        if let Some(valid) = valid {
            if valid.ndims() != samples.ndims() {
                return Err(SgdErr::SizeMismatch {
                    what: "validation feature dimension",
                    got: valid.ndims(),
                    expected: samples.ndims(),
                });
            }

            valid.check_labels(nclass, "validation")?;
        }

        Ok(nclass)
    }
}

/// Trains with the default metric, see [`Trainer::train`].
pub fn train<O>(
    samples: Samples<'_>,
    valid: Option<Samples<'_>>,
    config: &TrainConfig,
    ordering: &mut O,
) -> Result<Trained>
where
    O: EpochOrdering + ?Sized,
{
    Trainer::new(config.clone()).train(samples, valid, ordering)
}

fn build_pool(threads: usize) -> Result<ThreadPool> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("sgd-worker-{i}"))
        .build()?;

    Ok(pool)
}

fn fail(
    epoch: usize,
    index: Option<usize>,
    weights: WeightMatrix,
    stats: StatsCollector,
) -> SgdErr {
    match index {
        Some(index) => warn!(epoch = epoch, index = index; "worker diverged"),
        None => warn!(epoch = epoch; "weights diverged"),
    }

    let stats = stats.finalize(Termination::Diverged { epoch });
    SgdErr::WorkerFailure {
        epoch,
        index,
        partial: Box::new(Trained { weights, stats }),
    }
}

fn reject_ordering(
    epoch: usize,
    reason: &'static str,
    weights: WeightMatrix,
    stats: StatsCollector,
) -> SgdErr {
    warn!(epoch = epoch; "ordering rejected: {reason}");

    let partial = (epoch > 0).then(|| {
        let stats = stats.finalize(Termination::InvalidOrdering { epoch });
        Box::new(Trained { weights, stats })
    });

    SgdErr::InvalidOrdering {
        epoch,
        reason,
        partial,
    }
}
