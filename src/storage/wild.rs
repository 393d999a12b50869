use std::sync::atomic::{AtomicU32, Ordering};

use ndarray::{Array2, ArrayView1};

#[cfg(test)]
use crate::{Result, SgdErr};
use crate::model::WeightMatrix;

/// A weight matrix shared by every gradient worker of an epoch, updated without locks.
///
/// It embraces race conditions, lets workers update the parameters simultaneously.
/// Every parameter is stored as the bit pattern of an `f32` inside an `AtomicU32` and is
/// read and written with `Ordering::Relaxed`: single element accesses never tear, but a
/// read-modify-write done by one worker may be interleaved with another worker's, so
/// updates can be lost or computed from stale rows. The epoch barrier bounds that
/// staleness, every update of an epoch is visible once its workers are joined.
#[derive(Debug)]
pub struct WildWeights {
    nclass: usize,
    stride: usize,
    params: Box<[AtomicU32]>,
}

impl WildWeights {
    /// Creates a new zero initialized `WildWeights`.
    ///
    /// # Arguments
    /// * `nclass` - The amount of rows.
    /// * `ndims` - The dimension of the feature vectors, the bias column is added on top.
    pub fn zeros(nclass: usize, ndims: usize) -> Self {
        let stride = ndims + 1;
        let params = (0..nclass * stride)
            .map(|_| AtomicU32::new(0f32.to_bits()))
            .collect();

        Self {
            nclass,
            stride,
            params,
        }
    }

    #[inline]
    pub fn nclass(&self) -> usize {
        self.nclass
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.stride - 1
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns the weights and the bias of the row of `class`.
    #[inline]
    fn row(&self, class: usize) -> (&[AtomicU32], &AtomicU32) {
        let start = class * self.stride;
        let bias = start + self.stride - 1;
        (&self.params[start..bias], &self.params[bias])
    }

    /// Computes the score of every class for one example, `W · [x; bias_term]`.
    ///
    /// # Arguments
    /// * `x` - The feature vector, `ndims` long.
    /// * `bias_term` - The value appended to `x`.
    /// * `out` - Where the `nclass` scores are written.
    pub fn scores_into(&self, x: ArrayView1<'_, f32>, bias_term: f32, out: &mut [f32]) {
        debug_assert_eq!(x.len(), self.ndims());
        debug_assert_eq!(out.len(), self.nclass);

        for (class, score) in out.iter_mut().enumerate() {
            let (row, bias) = self.row(class);
            let dot: f32 = row.iter().zip(x.iter()).map(|(w, xi)| load(w) * xi).sum();
            *score = dot + load(bias) * bias_term;
        }
    }

    /// Adds `alpha · [x; bias_term]` to the row of `class`.
    pub fn axpy_row(&self, class: usize, alpha: f32, x: ArrayView1<'_, f32>, bias_term: f32) {
        let (row, bias) = self.row(class);

        for (w, xi) in row.iter().zip(x.iter()) {
            store(w, load(w) + alpha * xi);
        }
        store(bias, load(bias) + alpha * bias_term);
    }

    /// Multiplies every parameter by `factor`.
    pub fn decay(&self, factor: f32) {
        for w in self.params.iter() {
            store(w, load(w) * factor);
        }
    }

    /// Takes an owned copy of the current parameters.
    pub fn snapshot(&self) -> WeightMatrix {
        let params = Array2::from_shape_fn((self.nclass, self.stride), |(k, j)| {
            load(&self.params[k * self.stride + j])
        });

        WeightMatrix::from_parts(params)
    }
}

#[cfg(test)]
impl WildWeights {
    /// Copies the parameters, row major, into `out`.
    ///
    /// # Returns
    /// A `SizeMismatch` error if `out` isn't exactly `nclass x (ndims + 1)` long.
    pub(crate) fn pull(&self, out: &mut [f32]) -> Result<()> {
        if out.len() != self.params.len() {
            return Err(SgdErr::SizeMismatch {
                what: "weights buffer",
                got: out.len(),
                expected: self.params.len(),
            });
        }

        for (o, w) in out.iter_mut().zip(self.params.iter()) {
            *o = load(w);
        }

        Ok(())
    }

    /// Overwrites the parameters with `src`, row major.
    ///
    /// # Returns
    /// A `SizeMismatch` error if `src` isn't exactly `nclass x (ndims + 1)` long.
    pub(crate) fn push(&self, src: &[f32]) -> Result<()> {
        if src.len() != self.params.len() {
            return Err(SgdErr::SizeMismatch {
                what: "weights buffer",
                got: src.len(),
                expected: self.params.len(),
            });
        }

        for (w, &s) in self.params.iter().zip(src) {
            store(w, s);
        }

        Ok(())
    }
}

#[inline]
fn load(w: &AtomicU32) -> f32 {
    f32::from_bits(w.load(Ordering::Relaxed))
}

#[inline]
fn store(w: &AtomicU32, value: f32) {
    w.store(value.to_bits(), Ordering::Relaxed);
}
