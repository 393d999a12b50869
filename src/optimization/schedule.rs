use serde::{Deserialize, Serialize};

use crate::{Result, SgdErr};

/// How the step size evolves during training.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum DecayPolicy {
    /// `eta = base_rate`.
    #[default]
    Constant,
    /// `eta = base_rate / (1 + global_iter / scale)`.
    Inverse { scale: f32 },
    /// `eta = base_rate * factor^epoch`.
    EpochStep { factor: f32 },
}

/// The learning rate schedule of a training run.
///
/// Pure: the rate only depends on the base rate, the policy and the position of the
/// example in the run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningRate {
    base_rate: f32,
    policy: DecayPolicy,
}

impl LearningRate {
    /// Creates a new `LearningRate`.
    ///
    /// # Arguments
    /// * `base_rate` - The step size before any decay.
    /// * `policy` - The decay policy.
    pub fn new(base_rate: f32, policy: DecayPolicy) -> Self {
        Self { base_rate, policy }
    }

    /// Checks the hyperparameters describe a positive, finite schedule.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_rate.is_finite() && self.base_rate > 0.) {
            return Err(SgdErr::InvalidArgument("base_rate must be positive and finite"));
        }

        match self.policy {
            DecayPolicy::Constant => Ok(()),
            DecayPolicy::Inverse { scale } if scale.is_finite() && scale > 0. => Ok(()),
            DecayPolicy::Inverse { .. } => Err(SgdErr::InvalidArgument(
                "inverse decay scale must be positive and finite",
            )),
            DecayPolicy::EpochStep { factor } if factor > 0. && factor <= 1. => Ok(()),
            DecayPolicy::EpochStep { .. } => Err(SgdErr::InvalidArgument(
                "epoch step decay factor must lie in (0, 1]",
            )),
        }
    }

    #[inline]
    pub fn base_rate(&self) -> f32 {
        self.base_rate
    }

    #[inline]
    pub fn policy(&self) -> DecayPolicy {
        self.policy
    }

    /// Returns the step size for an example.
    ///
    /// # Arguments
    /// * `global_iter` - How many examples were processed before this one in the whole run.
    /// * `epoch` - The 0-based epoch of the example.
    #[inline]
    pub fn rate(&self, global_iter: u64, epoch: usize) -> f32 {
        match self.policy {
            DecayPolicy::Constant => self.base_rate,
            DecayPolicy::Inverse { scale } => {
                (self.base_rate as f64 / (1. + global_iter as f64 / scale as f64)) as f32
            }
            DecayPolicy::EpochStep { factor } => {
                let exp = i32::try_from(epoch).unwrap_or(i32::MAX);
                self.base_rate * factor.powi(exp)
            }
        }
    }
}
