use serde::{Deserialize, Serialize};

use crate::{
    Result, SgdErr,
    data::ShardLayout,
    model::LossKind,
    optimization::{DecayPolicy, LearningRate},
};

/// The hyperparameters of a training run.
///
/// Every field has a default, so a partial JSON object like `{"epochs": 50}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// The amount of classes, `max(label) + 1` of the training set when unset.
    pub nclass: Option<usize>,
    pub epochs: usize,
    /// Evaluate every `eval_freq` epochs. Only checked when there's a validation set.
    pub eval_freq: usize,
    pub threads: usize,
    pub base_rate: f32,
    pub decay: DecayPolicy,
    pub loss: LossKind,
    /// L2 regularization coefficient.
    pub lambda: f32,
    /// The value appended to every feature vector, multiplies the bias column.
    pub bias_term: f32,
    pub shard_layout: ShardLayout,
    /// Also compute the metric over the training set on evaluation epochs.
    pub eval_train: bool,
    /// Stop once the validation metric drops more than this below its best value.
    pub stop_valid_threshold: Option<f64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            nclass: None,
            epochs: 10,
            eval_freq: 1,
            threads: 1,
            base_rate: 0.01,
            decay: DecayPolicy::Constant,
            loss: LossKind::Hinge,
            lambda: 0.,
            bias_term: 1.,
            shard_layout: ShardLayout::Contiguous,
            eval_train: false,
            stop_valid_threshold: None,
        }
    }
}

impl TrainConfig {
    /// The learning rate schedule described by this config.
    pub fn learning_rate(&self) -> LearningRate {
        LearningRate::new(self.base_rate, self.decay)
    }

    /// Checks every hyperparameter that doesn't depend on the data.
    ///
    /// # Arguments
    /// * `has_valid` - Whether a validation set will be provided.
    pub fn validate(&self, has_valid: bool) -> Result<()> {
        if self.epochs == 0 {
            return Err(SgdErr::InvalidArgument("epochs must be at least 1"));
        }

        if self.threads == 0 {
            return Err(SgdErr::InvalidArgument("threads must be at least 1"));
        }

        if has_valid && self.eval_freq == 0 {
            return Err(SgdErr::InvalidArgument(
                "eval_freq must be at least 1 when a validation set is given",
            ));
        }

        if matches!(self.nclass, Some(nclass) if nclass < 2) {
            return Err(SgdErr::InvalidArgument("nclass must be at least 2"));
        }

        if !(self.lambda.is_finite() && self.lambda >= 0.) {
            return Err(SgdErr::InvalidArgument("lambda must be finite and non negative"));
        }

        if !self.bias_term.is_finite() {
            return Err(SgdErr::InvalidArgument("bias_term must be finite"));
        }

        if matches!(self.stop_valid_threshold, Some(t) if !(t.is_finite() && t >= 0.)) {
            return Err(SgdErr::InvalidArgument(
                "stop_valid_threshold must be finite and non negative",
            ));
        }

        self.learning_rate().validate()?;

        // No schedule exceeds base_rate, so this keeps every decay factor positive.
        if self.base_rate * self.lambda >= 1. {
            return Err(SgdErr::InvalidArgument("base_rate * lambda must be below 1"));
        }

        Ok(())
    }

    /// Whether `epoch` (0-based) is an evaluation epoch.
    #[inline]
    pub fn is_eval_epoch(&self, epoch: usize) -> bool {
        self.eval_freq > 0 && (epoch + 1) % self.eval_freq == 0
    }
}
