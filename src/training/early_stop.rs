/// What to do after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Verdict {
    /// New best metric, keep its weights around.
    Improved,
    Continue,
    /// The metric fell too far below the best one.
    Stop { best_epoch: usize },
}

/// Tracks the best validation metric of a run and decides when it degraded enough to stop.
#[derive(Debug, Clone)]
pub(crate) struct EarlyStop {
    threshold: f64,
    best: Option<(usize, f64)>,
}

impl EarlyStop {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            best: None,
        }
    }

    /// Feeds the metric of an evaluation epoch.
    pub fn observe(&mut self, epoch: usize, metric: f64) -> Verdict {
        match self.best {
            Some((_, best)) if metric <= best => {}
            _ => {
                self.best = Some((epoch, metric));
                return Verdict::Improved;
            }
        }

        match self.best {
            Some((best_epoch, best)) if metric < best - self.threshold => {
                Verdict::Stop { best_epoch }
            }
            _ => Verdict::Continue,
        }
    }
}
