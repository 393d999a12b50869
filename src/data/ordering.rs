use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{Result, SgdErr};

/// Produces the order in which the training samples are visited during an epoch.
///
/// The engine owns no randomness: whoever builds the ordering owns the generator and its seed.
pub trait EpochOrdering {
    /// Should write a permutation of `[0, n)` into `order`, replacing its contents.
    ///
    /// # Arguments
    /// * `epoch` - The 0-based index of the epoch about to start.
    /// * `n` - The amount of training samples.
    /// * `order` - The buffer to fill.
    fn fill(&mut self, epoch: usize, n: usize, order: &mut Vec<usize>);
}

impl<F> EpochOrdering for F
where
    F: FnMut(usize, usize, &mut Vec<usize>),
{
    fn fill(&mut self, epoch: usize, n: usize, order: &mut Vec<usize>) {
        self(epoch, n, order)
    }
}

/// Visits the samples in storage order on every epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl EpochOrdering for Sequential {
    fn fill(&mut self, _epoch: usize, n: usize, order: &mut Vec<usize>) {
        order.clear();
        order.extend(0..n);
    }
}

/// Draws a fresh uniformly random permutation on every epoch.
#[derive(Debug, Clone)]
pub struct Shuffled<R: Rng> {
    rng: R,
}

impl<R: Rng> Shuffled<R> {
    /// Creates a new `Shuffled` ordering.
    ///
    /// # Arguments
    /// * `rng` - The random number generator to draw the permutations from.
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl Shuffled<StdRng> {
    /// Creates a new reproducible `Shuffled` ordering.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> EpochOrdering for Shuffled<R> {
    fn fill(&mut self, _epoch: usize, n: usize, order: &mut Vec<usize>) {
        order.clear();
        order.extend(0..n);
        order.shuffle(&mut self.rng);
    }
}

/// Replays caller supplied orderings, cycling through them by epoch.
#[derive(Debug, Clone)]
pub struct Fixed {
    orders: Vec<Vec<usize>>,
}

impl Fixed {
    /// Creates a new `Fixed` ordering.
    ///
    /// # Arguments
    /// * `orders` - The orderings, epoch `e` uses `orders[e % orders.len()]`.
    ///
    /// # Returns
    /// An error if `orders` is empty.
    pub fn new(orders: Vec<Vec<usize>>) -> Result<Self> {
        if orders.is_empty() {
            return Err(SgdErr::InvalidArgument("at least one ordering is required"));
        }

        Ok(Self { orders })
    }
}

impl EpochOrdering for Fixed {
    fn fill(&mut self, epoch: usize, _n: usize, order: &mut Vec<usize>) {
        order.clear();
        order.extend_from_slice(&self.orders[epoch % self.orders.len()]);
    }
}

/// Checks `order` is a permutation of `[0, n)`.
///
/// # Arguments
/// * `order` - The ordering to check.
/// * `n` - The amount of training samples.
/// * `seen` - Scratch space, resized to `n`.
///
/// # Returns
/// The reason the ordering was rejected, if it was.
pub(crate) fn check_permutation(
    order: &[usize],
    n: usize,
    seen: &mut Vec<bool>,
) -> std::result::Result<(), &'static str> {
    if order.len() != n {
        return Err("ordering length doesn't match the amount of samples");
    }

    seen.clear();
    seen.resize(n, false);

    for &idx in order {
        match seen.get_mut(idx) {
            None => return Err("index out of range"),
            Some(true) => return Err("duplicated index"),
            Some(slot) => *slot = true,
        }
    }

    Ok(())
}
